use crate::i18n::Catalog;
use crate::providers::{DeleteOptions, Folder, MailHost, Message, MessageId};
use anyhow::Result;

/// A message the per-message fallback could not delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub message_id: MessageId,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct PurgeOutcome {
    pub deleted: usize,
    pub failures: Vec<DeleteFailure>,
}

/// Read every message of a folder, following continuation tokens until the last page.
///
/// The number of pages is not bounded here; the host is trusted to end the listing.
pub async fn list_all_messages<H: MailHost + ?Sized>(host: &H, folder_id: &str) -> Result<Vec<Message>> {
    let mut page = host.list_messages(folder_id).await?;
    let mut messages = std::mem::take(&mut page.messages);

    while let Some(token) = page.id.take() {
        page = host.continue_list(&token).await?;
        messages.append(&mut page.messages);
    }

    Ok(messages)
}

pub struct Purger<'a, H: ?Sized> {
    host: &'a H,
    catalog: &'a Catalog,
}

impl<'a, H: MailHost + ?Sized> Purger<'a, H> {
    pub fn new(host: &'a H, catalog: &'a Catalog) -> Self {
        Self { host, catalog }
    }

    /// Delete every message in `folder`.
    ///
    /// One batch request is tried first. If the host rejects it, each message
    /// gets its own request and failures are recorded without stopping the
    /// rest of the folder.
    pub async fn purge_folder(&self, folder: &Folder) -> Result<PurgeOutcome> {
        log::info!("Processing folder: {} ({})", folder.path, folder.type_label());

        let messages = list_all_messages(self.host, &folder.id).await?;
        log::info!("{} message(s) found in {}", messages.len(), folder.path);

        if messages.is_empty() {
            log::info!("Nothing to delete in {}", folder.path);
            return Ok(PurgeOutcome::default());
        }

        let ids: Vec<MessageId> = messages.iter().map(|m| m.id).collect();
        let options = DeleteOptions { is_user_action: true };
        log::info!("Deleting {} message(s) from {}", ids.len(), folder.path);

        match self.host.delete_messages(&ids, options).await {
            Ok(()) => {
                for message in &messages {
                    self.log_deleted(message);
                }
                Ok(PurgeOutcome {
                    deleted: ids.len(),
                    failures: Vec::new(),
                })
            }
            Err(e) => {
                log::warn!(
                    "Batch delete failed in {}: {:#}; deleting one message at a time",
                    folder.path,
                    e
                );
                Ok(self.delete_one_by_one(&messages, options).await)
            }
        }
    }

    async fn delete_one_by_one(&self, messages: &[Message], options: DeleteOptions) -> PurgeOutcome {
        let mut outcome = PurgeOutcome::default();

        for message in messages {
            match self.host.delete_messages(&[message.id], options).await {
                Ok(()) => {
                    self.log_deleted(message);
                    outcome.deleted += 1;
                }
                Err(e) => {
                    let failure = DeleteFailure {
                        message_id: message.id,
                        error: format!("{:#}", e),
                    };
                    let id = failure.message_id.to_string();
                    log::error!(
                        "{}",
                        self.catalog
                            .get_message("logError", &[("id", id.as_str()), ("error", failure.error.as_str())])
                    );
                    outcome.failures.push(failure);
                }
            }
        }

        outcome
    }

    fn log_deleted(&self, message: &Message) {
        log::info!(
            "{}",
            self.catalog
                .get_message("logDeleted", &[("subject", message.subject.as_str())])
        );
    }
}
