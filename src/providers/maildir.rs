//! Maildir++ accounts on the local disk.
//!
//! The account root is the Inbox; every `.A.B` directory below it is the
//! folder `/A/B`. Message ids are handed out per listing and stay valid for
//! the life of the host.

use super::{Account, DeleteOptions, Folder, FolderType, MailHost, Message, MessageId, MessagePage};
use crate::config::AccountConfig;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use mailparse::MailHeaderMap;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const INBOX: &str = "Inbox";

#[derive(Debug, Clone)]
struct FolderLocation {
    account: usize,
    /// `None` for a parent folder that has no directory of its own
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    file: PathBuf,
    folder_dir: PathBuf,
    account: usize,
}

#[derive(Default)]
struct State {
    folders: HashMap<String, FolderLocation>,
    trash_dirs: HashMap<usize, PathBuf>,
    messages: HashMap<MessageId, StoredMessage>,
    pages: HashMap<String, Vec<Message>>,
    next_message_id: MessageId,
    next_page: u64,
}

pub struct MaildirHost {
    accounts: Vec<AccountConfig>,
    page_size: usize,
    state: Mutex<State>,
}

impl MaildirHost {
    pub fn new(accounts: Vec<AccountConfig>, page_size: usize) -> Self {
        Self {
            accounts,
            page_size: page_size.max(1),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("Maildir host state is poisoned"))
    }

    fn scan_account(&self, index: usize, config: &AccountConfig, state: &mut State) -> Result<Account> {
        let root = &config.path;
        if !root.is_dir() {
            bail!("Maildir for {} not found: {}", config.name, root.display());
        }

        let account_id = format!("account{}", index + 1);
        let tree = TreeBuilder {
            account_id: &account_id,
            folder_types: &config.folder_types,
        };

        let mut inbox = tree.folder(INBOX, &format!("/{INBOX}"));
        inbox.kind.get_or_insert(FolderType::Inbox);
        state.folders.insert(
            inbox.id.clone(),
            FolderLocation {
                account: index,
                dir: Some(root.clone()),
            },
        );
        let mut folders = vec![inbox];

        let mut dir_names: Vec<String> = fs::read_dir(root)
            .with_context(|| format!("Failed to read {}", root.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with('.') && name != "." && name != "..")
            .collect();
        dir_names.sort();

        for dir_name in dir_names {
            let segments: Vec<&str> = dir_name[1..].split('.').filter(|s| !s.is_empty()).collect();
            if segments.is_empty() {
                continue;
            }
            tree.insert(&mut folders, "", &segments);

            let path: String = segments.iter().map(|s| format!("/{s}")).collect();
            state.folders.insert(
                tree.folder_id(&path),
                FolderLocation {
                    account: index,
                    dir: Some(root.join(&dir_name)),
                },
            );
        }

        register_parents(&folders, index, state);

        let trash_dir = find_trash(&folders)
            .and_then(|folder| state.folders.get(&folder.id))
            .and_then(|location| location.dir.clone());
        if let Some(dir) = trash_dir {
            state.trash_dirs.insert(index, dir);
        }

        Ok(Account {
            id: account_id,
            name: config.name.clone(),
            kind: if config.local { "none" } else { "maildir" }.to_string(),
            folders,
        })
    }

    fn paginate(&self, state: &mut State, mut messages: Vec<Message>) -> MessagePage {
        if messages.len() <= self.page_size {
            return MessagePage { id: None, messages };
        }
        let rest = messages.split_off(self.page_size);
        state.next_page += 1;
        let token = format!("page-{}", state.next_page);
        state.pages.insert(token.clone(), rest);
        MessagePage {
            id: Some(token),
            messages,
        }
    }

    fn remove_message(&self, message: &StoredMessage, trash_dir: Option<&PathBuf>) -> Result<()> {
        match trash_dir {
            Some(trash_dir) => {
                let cur = trash_dir.join("cur");
                fs::create_dir_all(&cur)?;
                let file_name = message
                    .file
                    .file_name()
                    .ok_or_else(|| anyhow!("Invalid message path: {}", message.file.display()))?;
                fs::rename(&message.file, cur.join(file_name))
                    .with_context(|| format!("Failed to move {} to trash", message.file.display()))
            }
            None => fs::remove_file(&message.file)
                .with_context(|| format!("Failed to remove {}", message.file.display())),
        }
    }
}

struct TreeBuilder<'a> {
    account_id: &'a str,
    folder_types: &'a HashMap<String, FolderType>,
}

impl TreeBuilder<'_> {
    fn folder_id(&self, path: &str) -> String {
        format!("{}:{}", self.account_id, path)
    }

    fn folder(&self, name: &str, path: &str) -> Folder {
        let folder = Folder::new(self.folder_id(path), name, path);
        let configured = self
            .folder_types
            .iter()
            .find(|(configured, _)| configured.trim_matches('/') == path.trim_matches('/'));
        match configured {
            Some((_, kind)) => folder.with_type(*kind),
            None => folder,
        }
    }

    fn insert(&self, siblings: &mut Vec<Folder>, parent_path: &str, segments: &[&str]) {
        let Some((name, rest)) = segments.split_first() else {
            return;
        };
        let path = format!("{parent_path}/{name}");
        let index = match siblings.iter().position(|f| f.name == *name) {
            Some(index) => index,
            None => {
                siblings.push(self.folder(name, &path));
                siblings.len() - 1
            }
        };
        self.insert(&mut siblings[index].sub_folders, &path, rest);
    }
}

fn register_parents(folders: &[Folder], account: usize, state: &mut State) {
    for folder in folders {
        state
            .folders
            .entry(folder.id.clone())
            .or_insert(FolderLocation { account, dir: None });
        register_parents(&folder.sub_folders, account, state);
    }
}

/// First folder typed as trash, else a root folder named "Trash"
fn find_trash(folders: &[Folder]) -> Option<&Folder> {
    fn typed(folders: &[Folder]) -> Option<&Folder> {
        folders.iter().find_map(|folder| {
            if folder.kind == Some(FolderType::Trash) {
                Some(folder)
            } else {
                typed(&folder.sub_folders)
            }
        })
    }

    typed(folders).or_else(|| {
        folders
            .iter()
            .find(|f| f.kind.is_none() && f.name.eq_ignore_ascii_case("trash"))
    })
}

fn message_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for sub in ["new", "cur"] {
        let sub_dir = dir.join(sub);
        if !sub_dir.is_dir() {
            continue;
        }
        let mut entries: Vec<PathBuf> = fs::read_dir(&sub_dir)
            .with_context(|| format!("Failed to read {}", sub_dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        entries.sort();
        files.extend(entries);
    }
    Ok(files)
}

fn read_subject(file: &Path) -> String {
    let Ok(bytes) = fs::read(file) else {
        return String::new();
    };
    let subject = match mailparse::parse_headers(&bytes) {
        Ok((headers, _)) => headers.get_first_value("Subject"),
        Err(e) => {
            log::debug!("Unreadable headers in {}: {}", file.display(), e);
            None
        }
    };
    subject.unwrap_or_default()
}

#[async_trait]
impl MailHost for MaildirHost {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut state = self.state()?;
        state.folders.clear();
        state.trash_dirs.clear();

        let mut accounts = Vec::with_capacity(self.accounts.len());
        for (index, config) in self.accounts.iter().enumerate() {
            accounts.push(self.scan_account(index, config, &mut state)?);
        }
        Ok(accounts)
    }

    async fn list_messages(&self, folder_id: &str) -> Result<MessagePage> {
        let location = self
            .state()?
            .folders
            .get(folder_id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown folder: {folder_id}"))?;
        let Some(dir) = location.dir else {
            return Ok(MessagePage::default());
        };

        let entries: Vec<(PathBuf, String)> = message_files(&dir)?
            .into_iter()
            .map(|file| {
                let subject = read_subject(&file);
                (file, subject)
            })
            .collect();

        let mut state = self.state()?;
        let mut messages = Vec::with_capacity(entries.len());
        for (file, subject) in entries {
            state.next_message_id += 1;
            let id = state.next_message_id;
            state.messages.insert(
                id,
                StoredMessage {
                    file,
                    folder_dir: dir.clone(),
                    account: location.account,
                },
            );
            messages.push(Message { id, subject });
        }

        Ok(self.paginate(&mut state, messages))
    }

    async fn continue_list(&self, page_id: &str) -> Result<MessagePage> {
        let mut state = self.state()?;
        let messages = state
            .pages
            .remove(page_id)
            .ok_or_else(|| anyhow!("Unknown or expired page token: {page_id}"))?;
        Ok(self.paginate(&mut state, messages))
    }

    async fn delete_messages(&self, ids: &[MessageId], options: DeleteOptions) -> Result<()> {
        let (plan, trash_dirs) = {
            let state = self.state()?;
            let plan = ids
                .iter()
                .map(|id| {
                    state
                        .messages
                        .get(id)
                        .cloned()
                        .map(|message| (*id, message))
                        .ok_or_else(|| anyhow!("Unknown message id {id}"))
                })
                .collect::<Result<Vec<_>>>()?;
            (plan, state.trash_dirs.clone())
        };

        if let Some((id, message)) = plan.iter().find(|(_, m)| !m.file.exists()) {
            bail!("Message {id} no longer exists: {}", message.file.display());
        }

        for (id, message) in plan {
            let trash_dir = trash_dirs
                .get(&message.account)
                .filter(|dir| options.is_user_action && **dir != message.folder_dir);
            self.remove_message(&message, trash_dir)?;
            self.state()?.messages.remove(&id);
        }

        Ok(())
    }
}
