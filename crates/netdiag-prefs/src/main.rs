//! netdiag-prefs: inspect and edit the network diagram's stored preferences.
//!
//! # Usage
//!
//! ```text
//! netdiag-prefs [OPTIONS] <COMMAND>
//!
//! Commands:
//!   show [--json]                               Print the loaded preferences
//!   reset                                       Overwrite with the defaults
//!   colors list                                 Print the color list
//!   colors add <COLOR> [--before N] [--protocol NAME]
//!   colors remove <N>
//!   colors protocol <N> <NAME>
//!   colors color <N> <COLOR>
//!   colors lookup <PROTOCOL>                    Resolve a protocol's color
//!   history                                     Recently used protocol names
//!
//! Options:
//!   --config <PATH>       Preference file [default: platform config dir]
//!   --namespace <NS>      Key prefix [default: netdiag]
//!   --ephemeral           Never write back to the file
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                  | Description              |
//! |---------------------------|--------------------------|
//! | `NETDIAG_PREFS_FILE`      | Same as `--config`       |
//! | `NETDIAG_PREFS_NAMESPACE` | Same as `--namespace`    |
//! | `RUST_LOG`                | Log filter (default info)|

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use netdiag_core::{ColorAssignment, PreferenceSet, Rgb24};
use netdiag_prefs::application::edit_colors::ColorListEditor;
use netdiag_prefs::application::ports::{KeyValueStore, Namespace};
use netdiag_prefs::application::versioned_store::VersionedConfigStore;
use netdiag_prefs::infrastructure::collaborators::history::RecentProtocols;
use netdiag_prefs::infrastructure::collaborators::palette::ProtocolPalette;
use netdiag_prefs::infrastructure::storage::memory::MemoryStore;
use netdiag_prefs::infrastructure::storage::toml_file::TomlFileStore;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Inspect and edit stored network diagram preferences.
#[derive(Debug, Parser)]
#[command(name = "netdiag-prefs", version)]
struct Cli {
    /// Preference file.  Defaults to `prefs.toml` in the platform config
    /// directory.
    #[arg(long, env = "NETDIAG_PREFS_FILE")]
    config: Option<PathBuf>,

    /// Key prefix under which all preferences live.
    #[arg(long, default_value = "netdiag", env = "NETDIAG_PREFS_NAMESPACE")]
    namespace: String,

    /// Load the file into memory and never write it back.
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the loaded preferences and any compatibility warnings.
    Show {
        /// Print JSON instead of `key = value` lines.
        #[arg(long)]
        json: bool,
    },
    /// Replace every stored preference with its default.
    Reset,
    /// Edit the color/protocol assignment list.
    #[command(subcommand)]
    Colors(ColorsCommand),
    /// List recently used protocol names.
    History,
}

#[derive(Debug, Subcommand)]
enum ColorsCommand {
    List,
    /// Insert a color, before entry N or at the end.
    Add {
        color: String,
        #[arg(long)]
        before: Option<usize>,
        #[arg(long)]
        protocol: Option<String>,
    },
    Remove {
        position: usize,
    },
    /// Set the protocol of entry N; an empty name makes it a catch-all.
    Protocol {
        position: usize,
        name: String,
    },
    Color {
        position: usize,
        color: String,
    },
    /// Print the color a protocol would be drawn with.
    Lookup {
        protocol: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let namespace = Namespace::new(&cli.namespace);

    let path = match cli.config {
        Some(path) => path,
        None => TomlFileStore::default_path().context("no --config given")?,
    };
    let store = TomlFileStore::open(&path)
        .with_context(|| format!("failed to open preference file {}", path.display()))?;

    if cli.ephemeral {
        info!("ephemeral run, {} will not be modified", path.display());
        run(MemoryStore::from_entries(store.entries()), &namespace, cli.command)
    } else {
        run(store, &namespace, cli.command)
    }
}

fn run<S: KeyValueStore>(store: S, namespace: &Namespace, command: Command) -> anyhow::Result<()> {
    let mut config = VersionedConfigStore::new(store, ProtocolPalette::default());
    let report = config.load_report(namespace);
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    let mut prefs = report.preferences;

    match command {
        Command::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            } else {
                print_preferences(&prefs, &report.stored_version)?;
            }
        }
        Command::Reset => {
            config
                .save(namespace, &PreferenceSet::default())
                .context("failed to save defaults")?;
        }
        Command::Colors(ColorsCommand::List) => print_colors(&prefs),
        Command::Colors(ColorsCommand::Lookup { protocol }) => {
            let mut palette = ProtocolPalette::from_list(&prefs.colors);
            println!("{}", palette.color_for(&protocol));
        }
        Command::Colors(edit) => {
            let mut history = RecentProtocols::load(config.store(), namespace);
            let mut editor = ColorListEditor::from_preferences(&prefs);
            edit_colors(&mut editor, &mut history, edit)?;

            history
                .save(config.store_mut(), namespace)
                .context("failed to store protocol history")?;
            config
                .apply_and_save(namespace, &mut prefs, &mut editor)
                .context("failed to save color list")?;
            print_colors(&prefs);
        }
        Command::History => {
            for name in RecentProtocols::load(config.store(), namespace).names() {
                println!("{name}");
            }
        }
    }
    Ok(())
}

fn edit_colors(
    editor: &mut ColorListEditor,
    history: &mut RecentProtocols,
    command: ColorsCommand,
) -> anyhow::Result<()> {
    match command {
        ColorsCommand::Add {
            color,
            before,
            protocol,
        } => {
            let color = parse_color(&color)?;
            let position = match before {
                Some(index) if index < editor.entries().len() => index,
                Some(index) => {
                    warn!(index, "position past the end, appending");
                    editor.entries().len()
                }
                None => editor.entries().len(),
            };
            editor.insert(Some(position), ColorAssignment::catch_all(color));
            if let Some(name) = protocol {
                editor.set_protocol(position, &name, history)?;
            }
        }
        ColorsCommand::Remove { position } => {
            let removed = editor.remove(position)?;
            info!(color = %removed.color, "removed color entry");
        }
        ColorsCommand::Protocol { position, name } => editor.set_protocol(position, &name, history)?,
        ColorsCommand::Color { position, color } => editor.set_color(position, parse_color(&color)?)?,
        ColorsCommand::List | ColorsCommand::Lookup { .. } => {
            bail!("not an editing command")
        }
    }
    Ok(())
}

fn parse_color(text: &str) -> anyhow::Result<Rgb24> {
    Rgb24::parse_hex(text).with_context(|| format!("invalid color {text:?}"))
}

fn print_colors(prefs: &PreferenceSet) {
    for (index, entry) in prefs.colors.iter().enumerate() {
        match &entry.protocol {
            Some(protocol) => println!("{index:>3}  {}  {protocol}", entry.color),
            None => println!("{index:>3}  {}  *", entry.color),
        }
    }
}

fn print_preferences(prefs: &PreferenceSet, stored_version: &str) -> anyhow::Result<()> {
    println!("version = {stored_version}");
    let value = serde_json::to_value(prefs)?;
    if let Some(fields) = value.as_object() {
        for (name, field) in fields.iter().filter(|(name, _)| name.as_str() != "colors") {
            println!("{name} = {field}");
        }
    }
    println!("colors:");
    print_colors(prefs);
    Ok(())
}
