use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ksexpire::cli::{handle_backup_command, handle_item_command};
use ksexpire::config::{paths::ExpirePaths, settings::Settings};
use ksexpire::display::format_size;
use ksexpire::storage::Storage;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "KSEXPIRE_LOG";

#[derive(Parser)]
#[command(
    name = "ksexpire",
    version,
    about = "Track subscriptions and warranties, with ZIP backup and restore",
    long_about = "ksexpire keeps a local catalog of subscriptions and warranty \
                  receipts, shows what renews or expires next, and backs the \
                  whole catalog up to a single ZIP archive."
)]
struct Cli {
    /// Show informational log output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Subscription and warranty commands
    #[command(subcommand)]
    Item(ksexpire::cli::ItemCommands),

    /// Backup and restore commands
    #[command(subcommand)]
    Backup(ksexpire::cli::BackupCommands),

    /// Create the data directories and write default settings
    Init,

    /// Show recent changes from the audit log
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show current configuration and paths
    Config,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Initialize paths and settings
    let paths = ExpirePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Item(cmd)) => {
            handle_item_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Init) => {
            println!("Initializing ksexpire at: {}", paths.base_dir().display());
            if paths.settings_file().exists() {
                println!("Settings already exist: {}", paths.settings_file().display());
            } else {
                settings.save(&paths)?;
                println!("Default settings written: {}", paths.settings_file().display());
            }
            println!();
            println!("Add your first item with:");
            println!("  ksexpire item add-subscription <NAME>");
            println!("  ksexpire item add-warranty <NAME> --months <N>");
        }
        Some(Commands::History { limit }) => {
            let entries = storage.audit().read_recent(limit)?;
            if entries.is_empty() {
                println!("No history yet.");
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
        }
        Some(Commands::Config) => {
            println!("ksexpire Configuration");
            println!("======================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Items file:        {}", paths.items_file().display());
            println!(
                "Receipt images:    {} ({})",
                paths.receipts_dir().display(),
                format_size(storage.images.total_size()?)
            );
            println!("Backup directory:  {}", paths.backup_dir().display());
            println!("Audit log:         {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Date format:     {}", settings.date_format);
            println!("  Restore mode:    {}", settings.restore_mode);
            println!(
                "  Reminders:       subscriptions {} day(s) before, warranties {} and {} days before",
                settings.notifications.subscription_days,
                settings.notifications.warranty_days_first,
                settings.notifications.warranty_days_second
            );
        }
        None => {
            println!("ksexpire - subscription and warranty tracker");
            println!();
            println!("Run 'ksexpire --help' for usage information.");
        }
    }

    Ok(())
}
