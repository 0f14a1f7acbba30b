use acessopro_core::model::AccessKind;
use acessopro_core::{probe, stats, verify, AccessEntry, Client, CsvStore, VerifyOutcome};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Access Manager CLI - clients and network access entries over a local CSV store
#[derive(Parser)]
#[command(name = "acessopro")]
#[command(about = "Local access manager with a tamper-evident audit log", long_about = None)]
struct Cli {
    /// Data directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage clients
    Client {
        #[command(subcommand)]
        command: ClientCommands,
    },

    /// Manage access entries
    Access {
        #[command(subcommand)]
        command: AccessCommands,
    },

    /// Copy the backing CSV files into a directory
    Export {
        /// Target directory
        dir: PathBuf,
    },

    /// Replace the backing files from a previous export
    Import {
        /// Files to import (must include clientes.csv and acessos.csv)
        files: Vec<PathBuf>,
    },

    /// Check the event log hash chain
    Verify {
        /// Log file to verify (defaults to the store's eventos.csv)
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Probe a host/port for reachability
    Check {
        host: String,
        port: u32,

        /// Timeout in milliseconds
        #[arg(long, default_value_t = 3000)]
        timeout_ms: u64,
    },

    /// Connections per day, from the event log
    Stats,
}

#[derive(Subcommand)]
enum ClientCommands {
    /// Add a client
    Add {
        /// Client id (generated when omitted)
        #[arg(long, default_value = "")]
        id: String,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        tags: String,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// List clients
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Update a client
    Update {
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        tags: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a client and all of its access entries
    Delete {
        id: String,
    },
}

#[derive(Args)]
struct AccessFields {
    #[arg(long)]
    client: Option<String>,

    #[arg(long)]
    alias: Option<String>,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u32>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    domain: Option<String>,

    /// URL entries only
    #[arg(long)]
    path: Option<String>,

    /// URL entries only
    #[arg(long)]
    scheme: Option<String>,

    #[arg(long)]
    tags: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum AccessCommands {
    /// Add an access entry
    Add {
        /// SSH, RDP, URL or MTK
        #[arg(long)]
        kind: String,

        #[command(flatten)]
        fields: AccessFields,
    },

    /// List access entries
    List {
        /// Restrict to one client id
        #[arg(long)]
        client: Option<String>,

        /// Restrict to one kind
        #[arg(long)]
        kind: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Update an access entry
    Update {
        #[arg(long)]
        kind: String,

        #[arg(long)]
        id: String,

        #[command(flatten)]
        fields: AccessFields,
    },

    /// Delete an access entry
    Delete {
        #[arg(long)]
        kind: String,

        id: String,
    },

    /// Record an open of the entry and print the resolved record
    Open {
        #[arg(long)]
        kind: String,

        id: String,
    },

    /// Toggle the favorite flag
    Favorite {
        #[arg(long)]
        kind: String,

        id: String,
    },
}

fn parse_kind(token: &str) -> Result<AccessKind> {
    AccessKind::parse(token)
        .ok_or_else(|| anyhow!("unknown access kind '{token}' (expected SSH, RDP, URL or MTK)"))
}

fn open_store(data_dir: &Option<PathBuf>) -> Result<CsvStore> {
    let dir = match data_dir {
        Some(dir) => dir.clone(),
        None => acessopro_core::data_dir(),
    };
    CsvStore::open(&dir).with_context(|| format!("cannot open store in {}", dir.display()))
}

fn print_clients(clients: &[Client], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(clients)?);
        return Ok(());
    }
    for client in clients {
        println!("{}  {}  {}", client.id, client.name, client.tags);
    }
    Ok(())
}

fn print_accesses(entries: &[&AccessEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    for entry in entries {
        let fav = if entry.is_favorite { "*" } else { " " };
        println!(
            "{fav} {}  {}  {}  {}:{}  opens={}",
            entry.kind, entry.id, entry.alias, entry.host, entry.port, entry.open_count
        );
    }
    Ok(())
}

fn apply_fields(entry: &mut AccessEntry, fields: AccessFields) {
    if let Some(v) = fields.client {
        entry.client_id = v;
    }
    if let Some(v) = fields.alias {
        entry.alias = v;
    }
    if let Some(v) = fields.name {
        entry.name = v;
    }
    if let Some(v) = fields.host {
        entry.host = v;
    }
    if let Some(v) = fields.port {
        entry.port = v;
    }
    if let Some(v) = fields.user {
        entry.user = v;
    }
    if let Some(v) = fields.domain {
        entry.domain = v;
    }
    if let Some(v) = fields.path {
        entry.path = v;
    }
    if let Some(v) = fields.scheme {
        entry.scheme = v;
    }
    if let Some(v) = fields.tags {
        entry.tags = v;
    }
    if let Some(v) = fields.notes {
        entry.notes = v;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let cli = Cli::parse();

    match cli.command {
        Commands::Client { command } => {
            let mut store = open_store(&cli.data_dir)?;
            match command {
                ClientCommands::Add { id, name, tags, notes } => {
                    let id = store.add_client(&id, &name, &tags, &notes)?;
                    println!("{id}");
                }
                ClientCommands::List { json } => {
                    print_clients(store.clients(), json)?;
                }
                ClientCommands::Update { id, name, tags, notes } => {
                    let mut client = store
                        .client(&id)
                        .ok_or_else(|| anyhow!("client {id} not found"))?
                        .clone();
                    if let Some(v) = name {
                        client.name = v;
                    }
                    if let Some(v) = tags {
                        client.tags = v;
                    }
                    if let Some(v) = notes {
                        client.notes = v;
                    }
                    store.update_client(&client)?;
                    info!("updated client {id}");
                }
                ClientCommands::Delete { id } => {
                    store.delete_client(&id)?;
                    info!("deleted client {id}");
                }
            }
        }

        Commands::Access { command } => {
            let mut store = open_store(&cli.data_dir)?;
            match command {
                AccessCommands::Add { kind, fields } => {
                    let kind = parse_kind(&kind)?;
                    let mut draft = AccessEntry {
                        kind,
                        ..AccessEntry::default()
                    };
                    apply_fields(&mut draft, fields);
                    let id = store.add_access(draft)?;
                    println!("{id}");
                }
                AccessCommands::List { client, kind, json } => {
                    let kind = kind.as_deref().map(parse_kind).transpose()?;
                    let entries: Vec<&AccessEntry> = store
                        .accesses()
                        .iter()
                        .filter(|a| {
                            client
                                .as_deref()
                                .map(|c| a.client_id.eq_ignore_ascii_case(c))
                                .unwrap_or(true)
                        })
                        .filter(|a| kind.map(|k| a.kind == k).unwrap_or(true))
                        .collect();
                    print_accesses(&entries, json)?;
                }
                AccessCommands::Update { kind, id, fields } => {
                    let kind = parse_kind(&kind)?;
                    let mut entry = store
                        .accesses()
                        .iter()
                        .find(|a| a.kind == kind && a.id.eq_ignore_ascii_case(&id))
                        .ok_or_else(|| anyhow!("access {id} not found"))?
                        .clone();
                    apply_fields(&mut entry, fields);
                    store.update_access(&entry)?;
                    info!("updated access {id}");
                }
                AccessCommands::Delete { kind, id } => {
                    store.delete_access(parse_kind(&kind)?, &id)?;
                    info!("deleted access {id}");
                }
                AccessCommands::Open { kind, id } => {
                    let kind = parse_kind(&kind)?;
                    store.mark_opened(kind, &id)?;
                    let entry = store
                        .accesses()
                        .iter()
                        .find(|a| a.kind == kind && a.id.eq_ignore_ascii_case(&id))
                        .ok_or_else(|| anyhow!("access {id} not found"))?;
                    println!("{}", serde_json::to_string_pretty(entry)?);
                }
                AccessCommands::Favorite { kind, id } => {
                    let state = store.toggle_favorite(parse_kind(&kind)?, &id)?;
                    println!("favorite={state}");
                }
            }
        }

        Commands::Export { dir } => {
            let store = open_store(&cli.data_dir)?;
            store.export(&dir)?;
            info!("exported store to {}", dir.display());
        }

        Commands::Import { files } => {
            let mut store = open_store(&cli.data_dir)?;
            store.import(&files)?;
            info!(
                "imported {} clients, {} accesses",
                store.clients().len(),
                store.accesses().len()
            );
        }

        Commands::Verify { log } => {
            let log_path = match log {
                Some(path) => path,
                None => open_store(&cli.data_dir)?.events_path().to_path_buf(),
            };
            match verify(&log_path) {
                VerifyOutcome::Ok => println!("ok"),
                VerifyOutcome::MissingChainState => {
                    println!("missing: no chain state next to {}", log_path.display());
                }
                VerifyOutcome::Mismatch { stored, computed } => {
                    bail!(
                        "mismatch: stored count={} last={}, computed count={} last={}",
                        stored.count,
                        stored.last_hash,
                        computed.count,
                        computed.last_hash
                    );
                }
                VerifyOutcome::Error(message) => bail!("verify failed: {message}"),
            }
        }

        Commands::Check { host, port, timeout_ms } => {
            let result = probe::check(&host, port, Duration::from_millis(timeout_ms)).await;
            if result.online {
                println!("online ({} ms)", result.duration_ms);
            } else {
                println!(
                    "offline ({} ms): {}",
                    result.duration_ms,
                    result.error.unwrap_or_default()
                );
            }
        }

        Commands::Stats => {
            let store = open_store(&cli.data_dir)?;
            for point in stats::connection_points(store.events_path()) {
                println!("{}  {}  {}", point.day, point.kind, point.count);
            }
        }
    }

    Ok(())
}
