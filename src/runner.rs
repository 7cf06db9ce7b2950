use crate::classifier;
use crate::i18n::Catalog;
use crate::providers::{Account, MailHost};
use crate::purger::{PurgeOutcome, Purger};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Single-slot "run in progress" flag
#[derive(Debug, Clone, Default)]
pub struct RunLatch {
    running: Arc<AtomicBool>,
}

impl RunLatch {
    /// Claim the latch, or `None` if a run already holds it
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                running: Arc::clone(&self.running),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Releases the latch when dropped
#[derive(Debug)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub skip_local_account: bool,
}

/// Counters for one sweep; not kept after the run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub deleted: usize,
    pub failed: usize,
    pub folders: usize,
    pub accounts: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    fn start() -> Self {
        Self {
            deleted: 0,
            failed: 0,
            folders: 0,
            accounts: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    fn record(&mut self, outcome: &PurgeOutcome) {
        self.folders += 1;
        self.deleted += outcome.deleted;
        self.failed += outcome.failures.len();
    }

    fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

/// The local/offline account, if any: type "none" or a name mentioning "local"
pub fn find_local_account(accounts: &[Account]) -> Option<&Account> {
    accounts.iter().find(|account| {
        let name = account.name.to_lowercase();
        account.kind == "none" || name.contains("local") || name.contains("lokal")
    })
}

#[derive(Clone)]
pub struct Sweeper {
    host: Arc<dyn MailHost>,
    catalog: Arc<Catalog>,
    options: RunOptions,
    latch: RunLatch,
}

impl Sweeper {
    pub fn new(host: Arc<dyn MailHost>, catalog: Catalog, options: RunOptions) -> Self {
        Self {
            host,
            catalog: Arc::new(catalog),
            options,
            latch: RunLatch::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.latch.is_running()
    }

    /// Start a sweep in the background unless one is already running.
    ///
    /// A suppressed trigger is logged and dropped, never queued. Errors from
    /// the run are logged and do not reach the caller.
    pub fn trigger(&self) -> Option<JoinHandle<()>> {
        let Some(guard) = self.latch.try_acquire() else {
            log::info!("{}", self.catalog.get_message("logAlreadyRunning", &[]));
            return None;
        };

        let sweeper = self.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = sweeper.run().await {
                log::error!("Sweep stopped: {:#}", e);
            }
        }))
    }

    /// One pass over every account, strictly sequential
    pub async fn run(&self) -> Result<RunSummary> {
        log::info!("{}", self.catalog.get_message("logStart", &[]));

        let accounts = self
            .host
            .list_accounts()
            .await
            .context("Failed to list accounts")?;
        let local_id = find_local_account(&accounts).map(|a| a.id.clone());
        log::info!("{} account(s) found", accounts.len());

        let mut summary = RunSummary::start();
        let purger = Purger::new(self.host.as_ref(), self.catalog.as_ref());

        for account in &accounts {
            log::info!("Processing account: {} (type: {})", account.name, account.kind);

            if self.options.skip_local_account && local_id.as_deref() == Some(account.id.as_str()) {
                log::info!("Skipping local account: {}", account.name);
                continue;
            }

            let folders = classifier::find_trash_and_junk(&account.folders);
            log::info!(
                "{} Trash/Junk folder(s) found in {}",
                folders.len(),
                account.name
            );

            for folder in folders {
                let outcome = purger
                    .purge_folder(folder)
                    .await
                    .with_context(|| format!("Failed to purge {} in {}", folder.path, account.name))?;
                summary.record(&outcome);
            }
            summary.accounts += 1;
        }

        summary.finish();
        let count = summary.deleted.to_string();
        log::info!(
            "{}",
            self.catalog
                .get_message("logComplete", &[("count", count.as_str())])
        );
        log::debug!(
            "Swept {} folder(s) in {} account(s) in {} ms, {} failure(s)",
            summary.folders,
            summary.accounts,
            summary.elapsed().num_milliseconds(),
            summary.failed
        );

        Ok(summary)
    }
}
