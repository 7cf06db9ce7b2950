mod classifier;
mod config;
mod i18n;
mod providers;
mod purger;
mod runner;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "junk-sweeper")]
#[command(about = "Empty the Trash and Junk folders of every mail account")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure settings
    Config {
        /// Default language for log messages
        #[arg(long)]
        locale: Option<String>,
        /// Skip the local account by default
        #[arg(long)]
        skip_local: Option<bool>,
        /// Messages per listing page
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// List configured accounts
    Accounts {
        #[command(subcommand)]
        action: Option<AccountsAction>,
    },
    /// Show Trash and Junk folders without deleting anything
    Scan,
    /// Delete every message in Trash and Junk folders
    Purge {
        /// Leave the local account (type "none" or named "Local ...") untouched
        #[arg(long)]
        skip_local: bool,
        /// Language for log messages (en or fr)
        #[arg(long)]
        locale: Option<String>,
    },
}

#[derive(Subcommand)]
enum AccountsAction {
    /// Register a Maildir++ account
    Add {
        /// Display name
        name: String,
        /// Maildir++ root directory
        path: PathBuf,
        /// Mark as the local (offline) account
        #[arg(long)]
        local: bool,
    },
    /// Forget an account
    Remove {
        /// Display name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = config::Config::load()?;

    match cli.command {
        Commands::Config {
            locale,
            skip_local,
            page_size,
        } => {
            commands::config(cfg, locale, skip_local, page_size)?;
        }
        Commands::Accounts { action } => match action {
            Some(AccountsAction::Add { name, path, local }) => {
                commands::accounts_add(cfg, name, path, local)?;
            }
            Some(AccountsAction::Remove { name }) => {
                commands::accounts_remove(cfg, &name)?;
            }
            None => {
                commands::accounts_list(&cfg);
            }
        },
        Commands::Scan => {
            commands::scan(&cfg).await?;
        }
        Commands::Purge { skip_local, locale } => {
            let locale = locale.unwrap_or_else(|| cfg.locale());
            let skip_local = skip_local || cfg.skip_local_account();
            commands::purge(&cfg, &locale, skip_local).await?;
        }
    }

    Ok(())
}

mod commands {
    use crate::classifier;
    use crate::config::{AccountConfig, Config};
    use crate::i18n::Catalog;
    use crate::providers::maildir::MaildirHost;
    use crate::providers::MailHost;
    use crate::purger::list_all_messages;
    use crate::runner::{find_local_account, RunOptions, Sweeper};
    use anyhow::{Context, Result};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn create_host(cfg: &Config) -> Result<Arc<dyn MailHost>> {
        if cfg.accounts.is_empty() {
            anyhow::bail!("No accounts configured. Run 'junk-sweeper accounts add <name> <path>' first");
        }
        Ok(Arc::new(MaildirHost::new(cfg.accounts.clone(), cfg.page_size())))
    }

    pub fn config(
        mut cfg: Config,
        locale: Option<String>,
        skip_local: Option<bool>,
        page_size: Option<usize>,
    ) -> Result<()> {
        if locale.is_none() && skip_local.is_none() && page_size.is_none() {
            println!("Current settings:");
            println!("  locale: {}", cfg.locale());
            println!("  skip_local_account: {}", cfg.skip_local_account());
            println!("  page_size: {}", cfg.page_size());
            return Ok(());
        }

        if let Some(locale) = locale {
            let catalog = Catalog::for_locale(&locale);
            if catalog.locale() == "en" && !locale.to_lowercase().starts_with("en") {
                println!("Note: no '{}' messages, falling back to '{}'", locale, catalog.locale());
            }
            cfg.locale = Some(locale);
        }
        if let Some(skip_local) = skip_local {
            cfg.skip_local_account = Some(skip_local);
        }
        if let Some(page_size) = page_size {
            if page_size == 0 {
                anyhow::bail!("Page size must be at least 1");
            }
            cfg.page_size = Some(page_size);
        }
        cfg.save()?;
        println!("Settings saved.");
        Ok(())
    }

    pub fn accounts_list(cfg: &Config) {
        if cfg.accounts.is_empty() {
            println!("No accounts configured.");
            return;
        }
        for account in &cfg.accounts {
            let marker = if account.local { " (local)" } else { "" };
            println!("  {}{} - {}", account.name, marker, account.path.display());
        }
    }

    pub fn accounts_add(mut cfg: Config, name: String, path: PathBuf, local: bool) -> Result<()> {
        if cfg.account(&name).is_some() {
            anyhow::bail!("Account '{}' already exists", name);
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("Maildir not found: {}", path.display()))?;
        if !path.join("cur").is_dir() {
            anyhow::bail!("{} is not a Maildir (no cur/ directory)", path.display());
        }

        println!("Added account: {} ({})", name, path.display());
        cfg.accounts.push(AccountConfig {
            name,
            path,
            local,
            folder_types: Default::default(),
        });
        cfg.save()
    }

    pub fn accounts_remove(mut cfg: Config, name: &str) -> Result<()> {
        let before = cfg.accounts.len();
        cfg.accounts.retain(|a| a.name != name);
        if cfg.accounts.len() == before {
            anyhow::bail!("Unknown account: {}", name);
        }
        cfg.save()?;
        println!("Removed account: {}", name);
        Ok(())
    }

    pub async fn scan(cfg: &Config) -> Result<()> {
        let host = create_host(cfg)?;
        let accounts = host.list_accounts().await?;
        let local_id = find_local_account(&accounts).map(|a| a.id.clone());

        for account in &accounts {
            let marker = if local_id.as_deref() == Some(account.id.as_str()) {
                " (local)"
            } else {
                ""
            };
            println!("{}{}:", account.name, marker);

            let folders = classifier::find_trash_and_junk(&account.folders);
            if folders.is_empty() {
                println!("  No Trash/Junk folders found.");
            }
            for folder in folders {
                let count = list_all_messages(host.as_ref(), &folder.id).await?.len();
                println!(
                    "  {} ({}) - {} message(s)",
                    folder.path,
                    folder.kind.map(|k| k.as_str()).unwrap_or("matched by name"),
                    count
                );
            }
        }

        Ok(())
    }

    pub async fn purge(cfg: &Config, locale: &str, skip_local: bool) -> Result<()> {
        let host = create_host(cfg)?;
        let options = RunOptions {
            skip_local_account: skip_local,
        };
        let sweeper = Sweeper::new(host, Catalog::for_locale(locale), options);

        if let Some(run) = sweeper.trigger() {
            run.await.context("Sweep task panicked")?;
        }
        Ok(())
    }
}
