//! Scriptable in-memory host used by the unit tests

use super::{Account, DeleteOptions, MailHost, Message, MessageId, MessagePage};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub struct DeleteCall {
    pub ids: Vec<MessageId>,
    pub options: DeleteOptions,
}

#[derive(Default)]
struct State {
    folders: HashMap<String, Vec<Message>>,
    pages: HashMap<String, Vec<Message>>,
    next_page: u64,
    delete_calls: Vec<DeleteCall>,
    continue_calls: usize,
}

pub struct MemoryHost {
    accounts: Vec<Account>,
    page_size: usize,
    poisoned: HashSet<MessageId>,
    fail_accounts: bool,
    gate: Option<Arc<Notify>>,
    state: Mutex<State>,
}

impl MemoryHost {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts,
            page_size: 100,
            poisoned: HashSet::new(),
            fail_accounts: false,
            gate: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Put `count` messages in a folder, ids starting at `first_id`
    pub fn with_messages(self, folder_id: &str, first_id: MessageId, count: u64) -> Self {
        let messages = (first_id..first_id + count)
            .map(|id| Message {
                id,
                subject: format!("Message {id}"),
            })
            .collect();
        self.state
            .lock()
            .unwrap()
            .folders
            .insert(folder_id.to_string(), messages);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Any delete request containing this id fails
    pub fn poison(mut self, id: MessageId) -> Self {
        self.poisoned.insert(id);
        self
    }

    pub fn failing_accounts(mut self) -> Self {
        self.fail_accounts = true;
        self
    }

    /// Account listing waits until the gate is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn delete_calls(&self) -> Vec<DeleteCall> {
        self.state.lock().unwrap().delete_calls.clone()
    }

    pub fn continue_calls(&self) -> usize {
        self.state.lock().unwrap().continue_calls
    }

    pub fn remaining(&self, folder_id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .folders
            .get(folder_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn paginate(&self, state: &mut State, mut messages: Vec<Message>) -> MessagePage {
        if messages.len() <= self.page_size {
            return MessagePage { id: None, messages };
        }
        let rest = messages.split_off(self.page_size);
        state.next_page += 1;
        let token = format!("t{}", state.next_page);
        state.pages.insert(token.clone(), rest);
        MessagePage {
            id: Some(token),
            messages,
        }
    }
}

#[async_trait]
impl MailHost for MemoryHost {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_accounts {
            bail!("account enumeration unavailable");
        }
        Ok(self.accounts.clone())
    }

    async fn list_messages(&self, folder_id: &str) -> Result<MessagePage> {
        let mut state = self.state.lock().unwrap();
        let messages = state.folders.get(folder_id).cloned().unwrap_or_default();
        Ok(self.paginate(&mut state, messages))
    }

    async fn continue_list(&self, page_id: &str) -> Result<MessagePage> {
        let mut state = self.state.lock().unwrap();
        state.continue_calls += 1;
        let messages = state
            .pages
            .remove(page_id)
            .ok_or_else(|| anyhow!("unknown page {page_id}"))?;
        Ok(self.paginate(&mut state, messages))
    }

    async fn delete_messages(&self, ids: &[MessageId], options: DeleteOptions) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push(DeleteCall {
            ids: ids.to_vec(),
            options,
        });
        if let Some(id) = ids.iter().find(|id| self.poisoned.contains(id)) {
            bail!("message {id} is locked");
        }
        for messages in state.folders.values_mut() {
            messages.retain(|m| !ids.contains(&m.id));
        }
        Ok(())
    }
}
