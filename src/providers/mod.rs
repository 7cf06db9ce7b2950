pub mod maildir;
#[cfg(test)]
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque message identifier issued by the host
pub type MessageId = u64;

/// Well-known folder tags a host may attach to a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderType {
    Inbox,
    Drafts,
    Sent,
    Trash,
    Templates,
    Archives,
    Junk,
    Outbox,
    #[serde(other)]
    Unknown,
}

impl FolderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderType::Inbox => "inbox",
            FolderType::Drafts => "drafts",
            FolderType::Sent => "sent",
            FolderType::Trash => "trash",
            FolderType::Templates => "templates",
            FolderType::Archives => "archives",
            FolderType::Junk => "junk",
            FolderType::Outbox => "outbox",
            FolderType::Unknown => "unknown",
        }
    }
}

/// A node in an account's folder tree
#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    /// Slash-separated position in the account hierarchy, e.g. "/Work/Old Trash"
    pub path: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FolderType>,
    pub sub_folders: Vec<Folder>,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            kind: None,
            sub_folders: Vec::new(),
        }
    }

    /// Builder method to set the folder type
    pub fn with_type(mut self, kind: FolderType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Builder method to set child folders
    pub fn with_sub_folders(mut self, sub_folders: Vec<Folder>) -> Self {
        self.sub_folders = sub_folders;
        self
    }

    /// Number of non-empty path segments
    pub fn depth(&self) -> usize {
        self.path.split('/').filter(|segment| !segment.is_empty()).count()
    }

    /// Directly under the account, not nested in another folder
    pub fn is_root_level(&self) -> bool {
        self.depth() == 1
    }

    /// Type label for log lines
    pub fn type_label(&self) -> &'static str {
        self.kind.map(|k| k.as_str()).unwrap_or("untyped")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// Host account type; "none" is a local/offline account
    #[serde(rename = "type")]
    pub kind: String,
    pub folders: Vec<Folder>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub subject: String,
}

/// One page of a folder listing
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    /// Continuation token; `None` on the final page
    pub id: Option<String>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Let the host apply undo-aware, account-setting-aware deletion
    pub is_user_action: bool,
}

#[async_trait]
pub trait MailHost: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<Account>>;
    async fn list_messages(&self, folder_id: &str) -> Result<MessagePage>;
    async fn continue_list(&self, page_id: &str) -> Result<MessagePage>;
    async fn delete_messages(&self, ids: &[MessageId], options: DeleteOptions) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_ignores_empty_segments() {
        assert_eq!(Folder::new("1", "Trash", "/Trash").depth(), 1);
        assert_eq!(Folder::new("2", "Trash", "Trash").depth(), 1);
        assert_eq!(Folder::new("3", "Old", "/Work//Old/").depth(), 2);
        assert_eq!(Folder::new("4", "", "").depth(), 0);
    }

    #[test]
    fn test_is_root_level() {
        assert!(Folder::new("1", "Junk", "/Junk").is_root_level());
        assert!(!Folder::new("2", "Junk", "/Work/Junk").is_root_level());
    }

    #[test]
    fn test_unknown_folder_type_deserializes() {
        let kind: FolderType = serde_json::from_str("\"virtual\"").unwrap();
        assert_eq!(kind, FolderType::Unknown);
        let kind: FolderType = serde_json::from_str("\"junk\"").unwrap();
        assert_eq!(kind, FolderType::Junk);
    }
}
