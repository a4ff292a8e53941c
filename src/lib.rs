//! container-network: transaction handlers for a supply-chain container ledger.
//!
//! Participants (producers, manufacturers, transporters, a regulator) and
//! assets (requests, containers) live in typed registries. Three handlers
//! advance them:
//!
//! - **PlaceRequest**: records a new request with status `PLACED`
//! - **UpdateRequestStatus**: moves a request forward; `VIN_ASSIGNED` creates
//!   its container, `TRANSPORTER_ASSIGNED` activates the container and hands
//!   it to a transporter
//! - **SetupDemo**: seeds a fixed demo dataset
//!
//! # Architecture
//!
//! Every submitted transaction runs inside one unit of work provided by a
//! [`crate::core::registry::LedgerBackend`]. Registry writes, emitted events, and the
//! historian record commit together or not at all. Events are delivered to
//! sinks after commit.
//!
//! Two backends exist: [`crate::core::sqlite::SqliteBackend`] (the CLI default,
//! `ledger.db` in the store) and [`crate::core::memory::MemoryBackend`].
//!
//! # Examples
//!
//! ```bash
//! container-network init
//! container-network demo setup
//! container-network request place --id R1 --requester Paul \
//!     --make Arium --model Nova --colour "Royal Purple"
//! container-network request status --id R1 --status VIN_ASSIGNED --vin V1
//! container-network participant add --kind transporter --id T1
//! container-network request status --id R1 --status TRANSPORTER_ASSIGNED \
//!     --vin V1 --transporter T1
//! ```
//!
//! # Crate Structure
//!
//! - [`crate::core`]: storage, units of work, identities, events, audit, config
//! - [`network`]: records and transaction handlers

pub mod core;
pub mod network;

use crate::core::broker::DbBroker;
use crate::core::config::LedgerConfig;
use crate::core::error::LedgerError;
use crate::core::output;
use crate::core::resource::RecordKind;
use crate::core::store::{Store, StoreKind};
use crate::core::time;
use crate::network::demo::DemoCatalog;
use crate::network::intake::PlaceRequest;
use crate::network::ledger::{Ledger, Transaction, TransactionReceipt};
use crate::network::lifecycle::UpdateRequestStatus;
use crate::network::model::{Container, ContainerDetails, Request, RequestStatus};
use crate::network::participants::AddParticipant;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum StoreArg {
    Project,
    User,
}

#[derive(Parser, Debug)]
#[clap(
    name = "container-network",
    version = env!("CARGO_PKG_VERSION"),
    about = "Supply-chain container ledger"
)]
struct Cli {
    /// Store directory (overrides CONTAINER_NETWORK_HOME and --store).
    #[clap(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Which default store to use when no directory is given.
    #[clap(long, global = true, value_enum, default_value = "project")]
    store: StoreArg,
    /// Output format.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the store, database, and default ledger.toml
    Init,

    /// Place and advance requests
    #[clap(subcommand)]
    Request(RequestCommand),

    /// Inspect containers
    #[clap(subcommand)]
    Container(ContainerCommand),

    /// Register and list participants
    #[clap(subcommand)]
    Participant(ParticipantCommand),

    /// Demo dataset
    #[clap(subcommand)]
    Demo(DemoCommand),

    /// Submit a transaction given as JSON (`-` reads stdin)
    Submit {
        #[clap(long)]
        file: PathBuf,
    },

    /// Committed transactions, oldest first
    History,

    /// Committed events
    Events {
        /// Only events of this transaction.
        #[clap(long)]
        transaction: Option<String>,
    },

    /// Broker audit log
    Audit,
}

#[derive(Subcommand, Debug)]
enum RequestCommand {
    /// Place a new request (status PLACED).
    Place {
        #[clap(long)]
        id: String,
        /// Producer placing the request (identifier or relationship URI).
        #[clap(long)]
        requester: String,
        /// Manufacturer (identifier or relationship URI).
        #[clap(long)]
        make: String,
        #[clap(long)]
        model: String,
        #[clap(long)]
        colour: String,
        /// Options blob as JSON.
        #[clap(long)]
        options: Option<String>,
        #[clap(long)]
        location: Option<String>,
    },
    /// Advance a request's status.
    Status {
        #[clap(long)]
        id: String,
        /// PLACED, SCHEDULED_FOR_MANUFACTURE, VIN_ASSIGNED, TRANSPORTER_ASSIGNED, DELIVERED
        #[clap(long)]
        status: String,
        #[clap(long)]
        vin: Option<String>,
        /// Transporter taking custody (TRANSPORTER_ASSIGNED only).
        #[clap(long)]
        transporter: Option<String>,
    },
    /// Show one request.
    Get {
        #[clap(long)]
        id: String,
    },
    /// List all requests.
    List,
}

#[derive(Subcommand, Debug)]
enum ContainerCommand {
    /// Show one container.
    Get {
        #[clap(long)]
        vin: String,
    },
    /// List containers.
    List {
        /// Only containers owned by this participant identifier.
        #[clap(long)]
        owner: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ParticipantCommand {
    /// Register a participant.
    Add {
        /// producer, manufacturer, transporter, or regulator
        #[clap(long)]
        kind: String,
        #[clap(long)]
        id: String,
        #[clap(long)]
        name: Option<String>,
    },
    /// List participants of one type.
    List {
        #[clap(long)]
        kind: String,
    },
}

#[derive(Subcommand, Debug)]
enum DemoCommand {
    /// Seed the regulator, producers, manufacturers, and containers.
    Setup {
        /// Catalog TOML to use instead of the embedded one.
        #[clap(long)]
        catalog: Option<PathBuf>,
    },
}

pub fn run() -> Result<(), LedgerError> {
    let cli = Cli::parse();
    let format = cli.format;
    let cmd_name = command_name(&cli.command);

    let result = dispatch(cli);
    if let Err(err) = &result {
        if format == OutputFormat::Json {
            let envelope = time::response_envelope(
                cmd_name,
                "error",
                serde_json::json!({ "code": err.kind(), "message": err.to_string() }),
            );
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
    }
    result
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Init => "init",
        Command::Request(RequestCommand::Place { .. }) => "request.place",
        Command::Request(RequestCommand::Status { .. }) => "request.status",
        Command::Request(RequestCommand::Get { .. }) => "request.get",
        Command::Request(RequestCommand::List) => "request.list",
        Command::Container(ContainerCommand::Get { .. }) => "container.get",
        Command::Container(ContainerCommand::List { .. }) => "container.list",
        Command::Participant(ParticipantCommand::Add { .. }) => "participant.add",
        Command::Participant(ParticipantCommand::List { .. }) => "participant.list",
        Command::Demo(DemoCommand::Setup { .. }) => "demo.setup",
        Command::Submit { .. } => "submit",
        Command::History => "history",
        Command::Events { .. } => "events",
        Command::Audit => "audit",
    }
}

fn dispatch(cli: Cli) -> Result<(), LedgerError> {
    let cwd = std::env::current_dir()?;
    let kind = match cli.store {
        StoreArg::Project => StoreKind::Project,
        StoreArg::User => StoreKind::User,
    };
    let store = Store::resolve(kind, cli.data_dir.as_deref(), &cwd)?;
    let format = cli.format;
    let cmd_name = command_name(&cli.command);

    match cli.command {
        Command::Init => {
            let wrote_config = LedgerConfig::write_default(&store.root)?;
            let config = LedgerConfig::load(&store.root)?;
            let db_path = crate::core::db::initialize_ledger_db(&store.root, &config.actor)?;
            emit(
                format,
                cmd_name,
                &serde_json::json!({
                    "store": store.root.display().to_string(),
                    "database": db_path.display().to_string(),
                    "config_written": wrote_config,
                }),
                || {
                    println!(
                        "{} ledger store at {}",
                        "initialized".green().bold(),
                        store.root.display()
                    );
                    if wrote_config {
                        println!("  wrote {}", store.config_path().display());
                    }
                },
            )
        }
        Command::Request(cmd) => run_request(&store, format, cmd_name, cmd),
        Command::Container(cmd) => {
            let ledger = Ledger::open(&store)?;
            match cmd {
                ContainerCommand::Get { vin } => {
                    let container = ledger.get_container(&vin)?;
                    emit(format, cmd_name, &container, || print_containers(&[container.clone()]))
                }
                ContainerCommand::List { owner } => {
                    let containers = match owner {
                        Some(owner) => ledger.containers_owned_by(&owner)?,
                        None => ledger.list_containers()?,
                    };
                    emit(format, cmd_name, &containers, || print_containers(&containers))
                }
            }
        }
        Command::Participant(cmd) => {
            let mut ledger = Ledger::open(&store)?;
            match cmd {
                ParticipantCommand::Add { kind, id, name } => {
                    let receipt = ledger.submit(Transaction::AddParticipant(AddParticipant {
                        kind: kind.parse()?,
                        id,
                        name,
                    }))?;
                    emit_receipt(format, cmd_name, &receipt)
                }
                ParticipantCommand::List { kind } => {
                    let kind: RecordKind = kind.parse()?;
                    let entries = ledger.participants(kind)?;
                    emit(format, cmd_name, &entries, || {
                        let rows: Vec<Vec<String>> = entries
                            .iter()
                            .map(|e| vec![e.id.clone(), e.name.clone().unwrap_or_default()])
                            .collect();
                        println!("{}", output::table(&["ID", "NAME"], &rows, 48));
                    })
                }
            }
        }
        Command::Demo(DemoCommand::Setup { catalog }) => {
            let catalog = catalog.as_deref().map(DemoCatalog::load).transpose()?;
            let mut ledger = Ledger::open(&store)?;
            let receipt = ledger.submit(Transaction::SetupDemo(
                crate::network::ledger::SetupDemo { catalog },
            ))?;
            emit_receipt(format, cmd_name, &receipt)
        }
        Command::Submit { file } => {
            let raw = if file.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin())?
            } else {
                fs::read_to_string(&file)?
            };
            let tx: Transaction = serde_json::from_str(&raw)?;
            let mut ledger = Ledger::open(&store)?;
            let receipt = ledger.submit(tx)?;
            emit_receipt(format, cmd_name, &receipt)
        }
        Command::History => {
            let ledger = Ledger::open(&store)?;
            let history = ledger.history()?;
            emit(format, cmd_name, &history, || {
                let rows: Vec<Vec<String>> = history
                    .iter()
                    .map(|h| {
                        vec![
                            h.sequence.to_string(),
                            h.transaction_id.clone(),
                            h.transaction_type.clone(),
                            h.timestamp.clone(),
                            h.event_ids.len().to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    output::table(&["#", "TRANSACTION", "TYPE", "TS", "EVENTS"], &rows, 40)
                );
            })
        }
        Command::Events { transaction } => {
            let ledger = Ledger::open(&store)?;
            let committed = ledger.backend().committed_events(transaction.as_deref())?;
            emit(format, cmd_name, &committed, || {
                for ev in &committed {
                    println!(
                        "{} {} {}",
                        ev.event_type.cyan(),
                        ev.transaction_id.dimmed(),
                        output::compact_line(&ev.payload.to_string(), 100)
                    );
                }
            })
        }
        Command::Audit => {
            let audit = DbBroker::new(&store.root).read_audit_log()?;
            emit(format, cmd_name, &audit, || {
                for line in &audit {
                    println!(
                        "{} {:<28} {:<10} {:>5}ms {}",
                        line.ts,
                        line.op,
                        line.status.as_str(),
                        line.elapsed_ms,
                        line.transaction_id.as_deref().unwrap_or("-")
                    );
                }
            })
        }
    }
}

fn run_request(
    store: &Store,
    format: OutputFormat,
    cmd_name: &str,
    cmd: RequestCommand,
) -> Result<(), LedgerError> {
    let mut ledger = Ledger::open(store)?;
    let factory = ledger.factory().clone();
    match cmd {
        RequestCommand::Place {
            id,
            requester,
            make,
            model,
            colour,
            options,
            location,
        } => {
            let options = match options {
                Some(raw) => serde_json::from_str(&raw)?,
                None => serde_json::Value::Null,
            };
            let receipt = ledger.submit(Transaction::PlaceRequest(PlaceRequest {
                request_id: id,
                container_details: ContainerDetails {
                    make: factory.resolve_reference(RecordKind::Manufacturer, &make)?,
                    model_type: model,
                    colour,
                },
                requester: factory.resolve_reference(RecordKind::Producer, &requester)?,
                options,
                location,
            }))?;
            emit_receipt(format, cmd_name, &receipt)
        }
        RequestCommand::Status {
            id,
            status,
            vin,
            transporter,
        } => {
            let request_status: RequestStatus = status.parse()?;
            let transporter = transporter
                .map(|t| factory.resolve_reference(RecordKind::Transporter, &t))
                .transpose()?;
            let receipt = ledger.submit(Transaction::UpdateRequestStatus(UpdateRequestStatus {
                request: factory.resolve_reference(RecordKind::Request, &id)?,
                request_status,
                vin,
                transporter,
            }))?;
            emit_receipt(format, cmd_name, &receipt)
        }
        RequestCommand::Get { id } => {
            let request = ledger.get_request(&id)?;
            emit(format, cmd_name, &request, || print_requests(&[request.clone()]))
        }
        RequestCommand::List => {
            let requests = ledger.list_requests()?;
            emit(format, cmd_name, &requests, || print_requests(&requests))
        }
    }
}

fn emit<T: Serialize>(
    format: OutputFormat,
    cmd_name: &str,
    data: &T,
    text: impl FnOnce(),
) -> Result<(), LedgerError> {
    match format {
        OutputFormat::Json => {
            let envelope = time::response_envelope(
                cmd_name,
                "ok",
                serde_json::json!({ "data": serde_json::to_value(data)? }),
            );
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        OutputFormat::Text => text(),
    }
    Ok(())
}

fn emit_receipt(
    format: OutputFormat,
    cmd_name: &str,
    receipt: &TransactionReceipt,
) -> Result<(), LedgerError> {
    emit(format, cmd_name, receipt, || {
        println!(
            "{} {} {}",
            "committed".green().bold(),
            receipt.transaction_type.bold(),
            receipt.transaction_id.dimmed()
        );
        for ev in &receipt.events {
            println!("  {} {}", "event".cyan(), ev.event_type);
        }
        if let Ok(summary) = serde_json::to_value(&receipt.outcome) {
            println!("  {}", output::compact_line(&summary.to_string(), 160));
        }
    })
}

fn print_requests(requests: &[Request]) {
    let rows: Vec<Vec<String>> = requests
        .iter()
        .map(|r| {
            vec![
                r.request_id.clone(),
                r.request_status.to_string(),
                r.requester.identifier().to_string(),
                format!(
                    "{} {} ({})",
                    r.container_details.make.identifier(),
                    r.container_details.model_type,
                    r.container_details.colour
                ),
            ]
        })
        .collect();
    println!(
        "{}",
        output::table(&["REQUEST", "STATUS", "REQUESTER", "CONTAINER"], &rows, 48)
    );
}

fn print_containers(containers: &[Container]) {
    let rows: Vec<Vec<String>> = containers
        .iter()
        .map(|c| {
            vec![
                c.vin.clone(),
                c.container_status.to_string(),
                c.owner
                    .as_ref()
                    .map(|o| format!("{}:{}", o.kind(), o.identifier()))
                    .unwrap_or_else(|| "-".to_string()),
                format!(
                    "{} {} ({})",
                    c.container_details.make.identifier(),
                    c.container_details.model_type,
                    c.container_details.colour
                ),
            ]
        })
        .collect();
    println!(
        "{}",
        output::table(&["VIN", "STATUS", "OWNER", "DETAILS"], &rows, 48)
    );
}

