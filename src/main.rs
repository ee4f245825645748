//! CLI entry point for keytrap
//!
//! Provides command-line tools for checking a hotkey library, listing its
//! triggers, resolving a shortcut, and asking a running editor whether it is
//! recording.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use keytrap::config::settings::{expand_path, DEFAULT_SETTINGS_PATH};
use keytrap::config::{LibraryStore, LibraryValidator, Settings};
use keytrap::core::parser::parse_shortcut;
use keytrap::core::{Library, Registry, Scope};
use keytrap::ipc::{IpcClient, IpcError};

#[derive(Parser)]
#[command(name = "keytrap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the settings file
    #[arg(short, long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a library for conflicts and invalid entries
    Check {
        /// Path to the library (overrides settings)
        #[arg(short, long)]
        library: Option<PathBuf>,
    },

    /// List all triggers
    List {
        /// Path to the library (overrides settings)
        #[arg(short, long)]
        library: Option<PathBuf>,
    },

    /// Show which trigger a shortcut resolves to
    Resolve {
        /// Shortcut, e.g. CMD+SHIFT+K
        shortcut: String,

        /// Bundle id of the front application
        #[arg(short, long)]
        app: Option<String>,

        /// Path to the library (overrides settings)
        #[arg(short, long)]
        library: Option<PathBuf>,
    },

    /// Ask the editor whether it is recording a shortcut
    Trapping {
        /// Editor socket (overrides settings)
        #[arg(long)]
        socket: Option<PathBuf>,

        /// Reply deadline in milliseconds (overrides settings)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let settings = Settings::load(&cli.settings)
        .with_context(|| format!("Failed to load settings from {}", cli.settings.display()))?;

    match cli.command {
        Commands::Check { library } => check_library(&library_path(&settings, library))?,
        Commands::List { library } => list_triggers(&library_path(&settings, library))?,
        Commands::Resolve {
            shortcut,
            app,
            library,
        } => resolve_shortcut(&library_path(&settings, library), &shortcut, app.as_deref())?,
        Commands::Trapping { socket, timeout_ms } => {
            let socket = socket
                .map(|p| expand_path(&p))
                .unwrap_or_else(|| settings.editor_socket.clone());
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| settings.ipc_timeout());
            query_trapping(&socket, &settings.daemon_identity, timeout)?
        }
    }

    Ok(())
}

/// Logs to stderr; `RUST_LOG` overrides the default `warn` level
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .init();
}

fn library_path(settings: &Settings, flag: Option<PathBuf>) -> PathBuf {
    flag.map(|p| expand_path(&p))
        .unwrap_or_else(|| settings.library_path.clone())
}

fn load_library(path: &Path) -> anyhow::Result<Library> {
    let store = LibraryStore::open(path.to_path_buf())?;
    println!("{} Reading library: {}", "→".cyan(), path.display());
    Ok(store.read_library()?)
}

fn scope_label(library: &Library, scope: Scope) -> String {
    match scope {
        Scope::Global => "global".to_string(),
        Scope::Application(id) => library
            .application(id)
            .map(|app| app.bundle_id.clone())
            .unwrap_or_else(|| format!("application #{}", id)),
    }
}

/// Check the library for conflicts and validation problems
fn check_library(path: &Path) -> anyhow::Result<()> {
    let library = load_library(path)?;
    println!(
        "{} Found {} triggers in {} lists\n",
        "✓".green(),
        library.triggers.len(),
        library.lists.len()
    );

    let report = LibraryValidator::new().validate(&library);
    for issue in report.errors() {
        println!("{} {}: {}", "✗".red().bold(), issue.subject.bold(), issue.message);
    }
    for issue in report.warnings() {
        println!("{} {}: {}", "⚠".yellow(), issue.subject.bold(), issue.message);
    }

    let conflicts = library.find_conflicts();
    if conflicts.is_empty() && !report.has_errors() {
        println!("{} {}", "✓".green().bold(), "No conflicts detected!".bold());
        return Ok(());
    }

    if !conflicts.is_empty() {
        println!(
            "\n{} Found {} conflict{}:\n",
            "✗".red().bold(),
            conflicts.len(),
            if conflicts.len() == 1 { "" } else { "s" }
        );
    }

    for (i, group) in conflicts.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("Conflict {}", i + 1).yellow().bold(),
            group.combo.to_string().cyan(),
            format!("({})", scope_label(&library, group.scope)).dimmed()
        );

        for (idx, id) in group.triggers.iter().enumerate() {
            let actions = library
                .trigger(*id)
                .map(|t| library.actions_for(t))
                .unwrap_or_default();
            let described: Vec<String> = actions.iter().map(|a| a.description()).collect();

            println!(
                "  {} {} → {}",
                format!("{}.", idx + 1).dimmed(),
                format!("#{}", id).magenta(),
                if described.is_empty() {
                    "(no actions)".to_string()
                } else {
                    described.join(", ")
                }
            );
        }
        println!();
    }

    if !conflicts.is_empty() {
        println!("{}", "⚠ Only the first trigger of each conflict will be registered!".yellow());
    }
    std::process::exit(1);
}

/// List all triggers grouped by list
fn list_triggers(path: &Path) -> anyhow::Result<()> {
    let library = load_library(path)?;
    println!("{} Found {} triggers\n", "✓".green(), library.triggers.len());

    for list in &library.lists {
        let status = if list.enabled {
            "enabled".green()
        } else {
            "disabled".red()
        };
        println!(
            "{} {} [{}]",
            list.name.bold(),
            format!("({})", scope_label(&library, list.scope())).dimmed(),
            status
        );

        for trigger in library.triggers.iter().filter(|t| t.list == list.id) {
            let actions = library.actions_for(trigger);
            if actions.is_empty() {
                println!("  {} → {}", trigger.combo.to_string().cyan(), "(no actions)".dimmed());
            }
            for action in actions {
                println!(
                    "  {} → {} {}",
                    trigger.combo.to_string().cyan(),
                    action.description(),
                    action.icon().dimmed()
                );
            }
        }
        println!();
    }

    Ok(())
}

/// Resolve a shortcut the way the daemon would
fn resolve_shortcut(path: &Path, shortcut: &str, app: Option<&str>) -> anyhow::Result<()> {
    let combo = parse_shortcut(shortcut)?;
    let library = load_library(path)?;
    let (registry, _conflicts) = Registry::from_library(&library);

    let Some(resolution) = registry.find(combo.key_code, combo.modifiers, app) else {
        println!("{} {} is not bound", "→".cyan(), combo.to_string().bold());
        return Ok(());
    };

    let registered = &resolution.trigger;
    println!(
        "{} {} → trigger {} {}",
        "✓".green(),
        combo.to_string().bold(),
        format!("#{}", registered.trigger.id).magenta(),
        format!("({})", scope_label(&library, registered.scope)).dimmed()
    );

    if !resolution.list_enabled {
        println!("  {}", "list disabled: the key is swallowed, nothing runs".yellow());
        return Ok(());
    }
    for action in registered.actions_to_run() {
        println!("  {} {}", "•".dimmed(), action.description());
    }
    Ok(())
}

/// Query the editor's trapping state over IPC
fn query_trapping(socket: &Path, identity: &str, timeout: Duration) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut client = IpcClient::new(socket, identity).with_timeout(timeout);

    match runtime.block_on(client.query_trapping_state()) {
        Ok(true) => println!("{} Editor is recording a shortcut", "●".red().bold()),
        Ok(false) => println!("{} Editor is not recording", "○".green()),
        Err(IpcError::TargetUnavailable(reason)) => {
            println!("{} Editor unavailable: {}", "○".dimmed(), reason)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
