//! shortcuts-inspect: inspect resolved keyboard shortcut bindings
//!
//! Loads an action manifest (JSON array of actions with their declared
//! bindings) plus the user's shortcut settings and prints what the registry
//! resolves them to.
//!
//! Run with: cargo run -- --actions actions.json list

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use devtools_shortcuts::config;
use devtools_shortcuts::error::{self, ShortcutsError};
use devtools_shortcuts::logging;
use devtools_shortcuts::settings::Settings;
use devtools_shortcuts::shortcuts::{
    parse_descriptors, ActionExtension, ActionRegistry, Platform, RecordingHost,
    ShortcutRegistry, StaticActionRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "shortcuts-inspect", version, about = "Inspect resolved keyboard shortcuts")]
struct Cli {
    /// Action manifest: JSON array of `{id, title?, bindings}`
    #[arg(long, value_name = "FILE")]
    actions: PathBuf,

    /// Shortcut settings file (defaults to the configured path)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Platform to resolve for: mac, windows or linux
    #[arg(long)]
    platform: Option<String>,

    /// Override the active keybind set
    #[arg(long, value_name = "NAME")]
    keybind_set: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every action with its live shortcuts
    List {
        /// Only show this action
        #[arg(long)]
        action: Option<String>,
    },
    /// Show the actions bound to a key sequence, e.g. "Ctrl+K Ctrl+C"
    Resolve { sequence: String },
    /// Show key sequences bound to more than one action
    Conflicts,
    /// Print the forwarded-key whitelist sent to the host
    Forwarded,
}

fn main() -> Result<()> {
    let _guard = logging::init();
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load_config();
    let mut options = config.registry_options();
    if let Some(platform) = cli.platform.as_deref() {
        options.platform = parse_platform(platform)?;
    }

    let manifest = fs::read_to_string(&cli.actions)
        .with_context(|| format!("Failed to read action manifest {}", cli.actions.display()))?;
    let extensions: Vec<ActionExtension> = serde_json::from_str(&manifest)
        .with_context(|| format!("Invalid action manifest {}", cli.actions.display()))?;
    let actions = Arc::new(StaticActionRegistry::from_extensions(extensions));

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| config.get_settings_path());
    let settings = load_settings(&settings_path)?;
    if let Some(keybind_set) = cli.keybind_set {
        settings.active_keybind_set.set(keybind_set);
    }

    let host = Arc::new(RecordingHost::new());
    let registry = ShortcutRegistry::new(actions.clone(), settings, host.clone(), options);
    info!(
        platform = %registry.platform(),
        settings = %settings_path.display(),
        "Registry ready"
    );

    match cli.command {
        Command::List { action } => {
            let extensions = match action {
                Some(id) => {
                    if !actions.has_action(&id) {
                        return Err(ShortcutsError::UnknownAction(id).into());
                    }
                    actions
                        .action_extensions()
                        .into_iter()
                        .filter(|e| e.id == id)
                        .collect()
                }
                None => actions.action_extensions(),
            };
            for extension in extensions {
                let titles: Vec<String> = registry
                    .shortcuts_for_action(&extension.id)
                    .iter()
                    .map(|s| s.title(registry.platform()))
                    .collect();
                let disabled = registry.disabled_defaults_for_action(&extension.id).len();
                let mut line = format!("{:<40} {}", extension.id, titles.join(", "));
                if disabled > 0 {
                    line.push_str(&format!("  ({} disabled)", disabled));
                }
                println!("{}", line.trim_end());
            }
        }
        Command::Resolve { sequence } => {
            let descriptors = parse_descriptors(&sequence, registry.platform())
                .map_err(|e| ShortcutsError::parse(sequence.as_str(), e))?;
            let bound = registry.actions_for_descriptors(&descriptors);
            if bound.is_empty() {
                println!("No actions bound to {}", sequence);
            }
            for action in bound {
                println!("{}", action);
            }
        }
        Command::Conflicts => {
            for conflict in registry.conflicts() {
                let keys: Vec<String> = conflict
                    .descriptors
                    .iter()
                    .map(|d| d.display_for_platform(registry.platform()))
                    .collect();
                println!("{:<24} {}", keys.join(" "), conflict.actions.join(", "));
            }
        }
        Command::Forwarded => {
            println!("{}", host.whitelist().unwrap_or_else(|| "[]".to_string()));
        }
    }
    Ok(())
}

fn parse_platform(name: &str) -> error::Result<Platform> {
    name.parse::<Platform>()
        .map_err(|e| ShortcutsError::Config(e.to_string()))
}

fn load_settings(path: &Path) -> error::Result<Settings> {
    Ok(Settings::load(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_resolve_with_globals() {
        let cli = Cli::parse_from([
            "shortcuts-inspect",
            "--actions",
            "a.json",
            "--platform",
            "mac",
            "resolve",
            "Ctrl+K Ctrl+C",
        ]);
        assert_eq!(cli.platform.as_deref(), Some("mac"));
        assert!(matches!(cli.command, Command::Resolve { ref sequence } if sequence == "Ctrl+K Ctrl+C"));
    }

    #[test]
    fn unknown_platform_is_a_config_error() {
        assert_eq!(parse_platform("darwin").unwrap(), Platform::MacOS);
        assert!(matches!(
            parse_platform("plan9"),
            Err(ShortcutsError::Config(_))
        ));
    }
}
