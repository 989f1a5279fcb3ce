//! `spajza` command-line front end.
//!
//! # Responsibility
//! - Map subcommands onto `ListService`, `SettingsStore`, the mirror
//!   coordinator and the recipe advisor.
//! - Own the session: open the database, run the startup pull, wait for
//!   pending mirror pushes before exit.
//!
//! # Invariants
//! - Destructive commands require `--yes`.
//! - Background mirror failures never change the exit code; explicit
//!   `push`/`pull` failures do.

mod render;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use spajza_core::db::open_db;
use spajza_core::recipe::DEFAULT_GEMINI_MODEL;
use spajza_core::sync::coordinator::DEFAULT_PUSH_CONFIRM_TIMEOUT;
use spajza_core::{
    init_logging, GeminiConfig, GeminiRecipeClient, HttpMirrorClient, HttpMirrorConfig,
    KeyValueStore, ListService, LogLevel, MirrorCoordinator, ProductId, RecipeAdvisor,
    SettingsStore, SqliteKeyValueStore, SyncTrigger, ViewTab, FALLBACK_CATEGORY,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "spajza", version, about = "Shopping list and pantry tracker")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "SPAJZA_DB", default_value = "spajza.db", global = true)]
    db: PathBuf,

    /// Directory for rotating log files; logging is off when unset
    #[arg(long, env = "SPAJZA_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// trace | debug | info | warn | error; defaults to debug in debug builds
    #[arg(long, env = "SPAJZA_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Bound for a single mirror request
    #[arg(long, default_value_t = 15, global = true)]
    mirror_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show products grouped by category
    List {
        /// shopping | inventory | all
        #[arg(long, default_value = "shopping")]
        tab: ViewTab,
        /// Case-insensitive name filter
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Add a product to the shopping list
    Add {
        name: String,
        #[arg(long)]
        qty: Option<String>,
        #[arg(long, default_value = FALLBACK_CATEGORY)]
        category: String,
    },
    /// Flip a product between needed and stocked
    Toggle { id: String },
    /// Set a product quantity; an empty value clears it
    Qty { id: String, quantity: String },
    /// Delete a product
    Remove {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// List categories in display order
    Categories,
    CategoryAdd { name: String },
    /// Delete a category that no product uses
    CategoryRemove {
        name: String,
        #[arg(long)]
        yes: bool,
    },
    /// Write the backup JSON to stdout or a file
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace everything with a backup file (`-` reads stdin)
    Import {
        path: String,
        #[arg(long)]
        yes: bool,
    },
    /// Print the shopping list as plain text
    Share,
    /// Configure the remote mirror endpoint
    Mirror {
        #[command(subcommand)]
        action: MirrorAction,
    },
    /// Upload the current collection and wait for confirmation
    Push,
    /// Replace local data with the mirror copy
    Pull,
    /// Ask for recipes that use stocked products
    Suggest {
        query: String,
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        #[arg(long, env = "SPAJZA_GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
        model: String,
    },
    /// Delete local data and start over from the sample list
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum MirrorAction {
    Set { url: String },
    Clear,
    Show,
}

impl Command {
    /// Commands that should see the mirror copy before running.
    fn wants_startup_pull(&self) -> bool {
        !matches!(
            self,
            Self::Mirror { .. } | Self::Pull | Self::Push | Self::Reset { .. } | Self::Suggest { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(dir) = &cli.log_dir {
        let dir = absolute(dir)?;
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| LogLevel::build_default().as_str().to_string());
        init_logging(&level, &dir.to_string_lossy())?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let kv = SqliteKeyValueStore::try_new(&conn)?;
    let settings = SettingsStore::new(&kv);

    if let Command::Mirror { action } = &cli.command {
        return run_mirror_action(&settings, action);
    }

    let mut service = ListService::open(&kv);
    let coordinator = start_mirror(&settings, Duration::from_secs(cli.mirror_timeout_secs));
    if let Some(coordinator) = &coordinator {
        service.attach_mirror(coordinator.push_queue());
        if cli.command.wants_startup_pull() {
            if let Some(payload) = coordinator.auto_pull().await {
                service.apply_remote(payload);
            }
        }
    }

    let outcome = run_command(cli.command, &mut service, coordinator.as_ref()).await;

    if let Some(coordinator) = &coordinator {
        coordinator.settle(DEFAULT_PUSH_CONFIRM_TIMEOUT).await;
    }
    outcome
}

async fn run_command<S: KeyValueStore>(
    command: Command,
    service: &mut ListService<S>,
    coordinator: Option<&MirrorCoordinator>,
) -> Result<()> {
    match command {
        Command::List { tab, search } => {
            print!("{}", render::grouped(&service.grouped_view(tab, &search)));
        }
        Command::Add {
            name,
            qty,
            category,
        } => {
            let id = service.add_product(&name, qty.as_deref(), &category)?;
            println!("added {id}");
        }
        Command::Toggle { id } => {
            let status = service
                .toggle_status(&ProductId::new(id.as_str()))
                .ok_or_else(|| anyhow!("product not found: {id}"))?;
            println!("{id} is now {}", status.as_str());
        }
        Command::Qty { id, quantity } => {
            if !service.update_quantity(&ProductId::new(id.as_str()), &quantity) {
                bail!("product not found: {id}");
            }
        }
        Command::Remove { id, yes } => {
            confirm(yes, "remove the product")?;
            let removed = service
                .delete_product(&ProductId::new(id.as_str()))
                .ok_or_else(|| anyhow!("product not found: {id}"))?;
            println!("removed {}", removed.name);
        }
        Command::Categories => {
            for category in service.categories() {
                println!("{category}");
            }
        }
        Command::CategoryAdd { name } => {
            if !service.add_category(&name) {
                bail!("category is blank or already exists");
            }
        }
        Command::CategoryRemove { name, yes } => {
            confirm(yes, "remove the category")?;
            service.delete_category(&name)?;
        }
        Command::Export { output } => {
            let text = service.export_text()?;
            match output {
                Some(path) => std::fs::write(&path, text)
                    .with_context(|| format!("failed to write `{}`", path.display()))?,
                None => println!("{text}"),
            }
        }
        Command::Import { path, yes } => {
            confirm(yes, "replace all products and categories")?;
            let text = read_input(&path)?;
            service.import_text(&text)?;
            println!(
                "imported {} products in {} categories",
                service.collection().products.len(),
                service.categories().len()
            );
        }
        Command::Share => print!("{}", service.shopping_list_text()),
        Command::Push => {
            let coordinator = require_mirror(coordinator)?;
            coordinator.push_now(service.collection().clone()).await?;
            println!("{}", render::last_sync(coordinator.last_sync_at()));
        }
        Command::Pull => {
            let coordinator = require_mirror(coordinator)?;
            if let Some(payload) = coordinator.pull(SyncTrigger::User).await? {
                service.apply_remote(payload);
            }
            println!(
                "{} ({} products)",
                render::last_sync(coordinator.last_sync_at()),
                service.collection().products.len()
            );
        }
        Command::Suggest {
            query,
            api_key,
            model,
        } => {
            let api_key = api_key.or_else(|| std::env::var("API_KEY").ok());
            let client = GeminiRecipeClient::new(GeminiConfig::new(api_key).with_model(model))?;
            let advisor = RecipeAdvisor::new(Arc::new(client));
            if let Some(suggestion) = advisor.suggest_for(service.collection(), &query).await? {
                print!("{}", render::suggestion(&suggestion));
            }
        }
        Command::Reset { yes } => {
            confirm(yes, "delete all local data")?;
            if !service.reset() {
                bail!("failed to delete local data; nothing was changed");
            }
        }
        Command::Mirror { .. } => bail!("mirror actions are handled before the list opens"),
    }
    Ok(())
}

fn run_mirror_action<S: KeyValueStore>(
    settings: &SettingsStore<S>,
    action: &MirrorAction,
) -> Result<()> {
    match action {
        MirrorAction::Set { url } => match settings.set_mirror_url(url)? {
            Some(url) => println!("mirror set to {url}"),
            None => println!("mirror cleared"),
        },
        MirrorAction::Clear => {
            settings.clear_mirror_url()?;
            println!("mirror cleared");
        }
        MirrorAction::Show => match settings.mirror_url() {
            Some(url) => println!("{url}"),
            None => println!("no mirror configured"),
        },
    }
    Ok(())
}

fn start_mirror<S: KeyValueStore>(
    settings: &SettingsStore<S>,
    timeout: Duration,
) -> Option<MirrorCoordinator> {
    let url = settings.mirror_url()?;
    match HttpMirrorClient::new(HttpMirrorConfig::new(url).with_timeout(timeout)) {
        Ok(client) => {
            info!("event=mirror_attach module=cli status=ok");
            Some(MirrorCoordinator::start(Arc::new(client)))
        }
        Err(err) => {
            warn!("event=mirror_attach module=cli status=error error={err}");
            None
        }
    }
}

fn require_mirror(coordinator: Option<&MirrorCoordinator>) -> Result<&MirrorCoordinator> {
    coordinator.ok_or_else(|| anyhow!("no mirror configured; run `spajza mirror set <url>`"))
}

fn confirm(yes: bool, action: &str) -> Result<()> {
    if !yes {
        bail!("refusing to {action} without --yes");
    }
    Ok(())
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read `{path}`"))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}
