//! Transaction submission.
//!
//! [`Ledger`] owns a backend, the factory, and the event sinks. Each
//! submitted [`Transaction`] runs in one unit of work together with its
//! historian record; events reach the sinks only after commit.

use crate::core::broker::{AuditStatus, DbBroker};
use crate::core::config::LedgerConfig;
use crate::core::error::LedgerError;
use crate::core::events::{EventEnvelope, EventSink, JsonlEventSink};
use crate::core::historian::{self, HistorianRecord};
use crate::core::memory::MemoryBackend;
use crate::core::registry::{self, LedgerBackend, RecordReader, UnitOfWork};
use crate::core::resource::{Factory, RecordKind};
use crate::core::sqlite::SqliteBackend;
use crate::core::store::Store;
use crate::core::time;
use crate::network::HandlerContext;
use crate::network::demo::{self, DemoCatalog, DemoSummary};
use crate::network::intake::{self, PlaceRequest};
use crate::network::lifecycle::{self, StatusUpdate, UpdateRequestStatus};
use crate::network::model::{Container, Request};
use crate::network::participants::{self, AddParticipant, ParticipantEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupDemo {
    /// Replaces the embedded catalog when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<DemoCatalog>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Transaction {
    PlaceRequest(PlaceRequest),
    UpdateRequestStatus(UpdateRequestStatus),
    SetupDemo(SetupDemo),
    AddParticipant(AddParticipant),
}

impl Transaction {
    pub fn type_name(&self) -> &'static str {
        match self {
            Transaction::PlaceRequest(_) => "PlaceRequest",
            Transaction::UpdateRequestStatus(_) => "UpdateRequestStatus",
            Transaction::SetupDemo(_) => "SetupDemo",
            Transaction::AddParticipant(_) => "AddParticipant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TransactionOutcome {
    RequestPlaced(Request),
    RequestUpdated(StatusUpdate),
    DemoSeeded(DemoSummary),
    ParticipantAdded(ParticipantEntry),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: String,
    pub transaction_type: String,
    pub timestamp: String,
    pub outcome: TransactionOutcome,
    pub events: Vec<EventEnvelope>,
}

pub struct Ledger<B: LedgerBackend> {
    backend: B,
    factory: Factory,
    config: LedgerConfig,
    sinks: Vec<Box<dyn EventSink>>,
    audit: Option<DbBroker>,
}

impl Ledger<MemoryBackend> {
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::new(MemoryBackend::new(), config)
    }
}

impl Ledger<SqliteBackend> {
    /// Open the ledger in `store`, reading `ledger.toml` and wiring the
    /// JSONL event log and audit trail.
    pub fn open(store: &Store) -> Result<Self, LedgerError> {
        let config = LedgerConfig::load(&store.root)?;
        let backend = SqliteBackend::open(store, &config.actor)?;
        let event_log = config.event_log;
        let mut ledger = Self::new(backend, config).with_audit(DbBroker::new(&store.root));
        if event_log {
            ledger = ledger.with_sink(JsonlEventSink::new(store.event_log_path()));
        }
        Ok(ledger)
    }
}

impl<B: LedgerBackend> Ledger<B> {
    pub fn new(backend: B, config: LedgerConfig) -> Self {
        let factory = Factory::new(config.namespace.clone());
        Self {
            backend,
            factory,
            config,
            sinks: Vec::new(),
            audit: None,
        }
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn with_audit(mut self, broker: DbBroker) -> Self {
        self.audit = Some(broker);
        self
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `tx` atomically. On error nothing is persisted and nothing is emitted.
    pub fn submit(&mut self, tx: Transaction) -> Result<TransactionReceipt, LedgerError> {
        let time::Stamp {
            id: transaction_id,
            ts: timestamp,
        } = time::stamp();
        let transaction_type = tx.type_name();
        let payload_hash = historian::canonical_hash_hex(&tx)?;
        let op = format!("ledger.{}", transaction_type);

        let ctx = HandlerContext {
            factory: &self.factory,
            strict_relationships: self.config.strict_relationships,
        };
        let actor = self.config.actor.clone();

        let committed = self.backend.transact(&transaction_id, &op, |uow| {
            let outcome = match &tx {
                Transaction::PlaceRequest(t) => {
                    TransactionOutcome::RequestPlaced(intake::place_request(&ctx, uow, t)?)
                }
                Transaction::UpdateRequestStatus(t) => TransactionOutcome::RequestUpdated(
                    lifecycle::update_request_status(&ctx, uow, t)?,
                ),
                Transaction::SetupDemo(t) => {
                    let catalog = match &t.catalog {
                        Some(c) => c.clone(),
                        None => DemoCatalog::embedded()?,
                    };
                    TransactionOutcome::DemoSeeded(demo::setup_demo(&ctx, uow, &catalog)?)
                }
                Transaction::AddParticipant(t) => {
                    TransactionOutcome::ParticipantAdded(participants::add_participant(uow, t)?)
                }
            };

            let sequence = uow.count(RecordKind::HistorianRecord)? + 1;
            let record = HistorianRecord {
                sequence,
                transaction_id: uow.transaction_id().to_string(),
                transaction_type: transaction_type.to_string(),
                timestamp: timestamp.clone(),
                actor,
                payload_hash,
                event_ids: uow.emitted().iter().map(|e| e.event_id.clone()).collect(),
            };
            registry::registry::<HistorianRecord>(uow).add(&record)?;
            Ok(outcome)
        })?;

        self.deliver(&transaction_id, &committed.events);

        Ok(TransactionReceipt {
            transaction_id,
            transaction_type: transaction_type.to_string(),
            timestamp,
            outcome: committed.value,
            events: committed.events,
        })
    }

    fn deliver(&self, transaction_id: &str, events: &[EventEnvelope]) {
        for sink in &self.sinks {
            for event in events {
                let Err(err) = sink.deliver(event) else {
                    continue;
                };
                let recorded = match &self.audit {
                    Some(audit) => audit.record(
                        &self.config.actor,
                        Some(transaction_id),
                        &format!("sink.{}", sink.name()),
                        &event.event_id,
                        AuditStatus::SinkError,
                    ),
                    None => Err(LedgerError::ConfigError("no audit log attached".to_string())),
                };
                if let Err(audit_err) = recorded {
                    eprintln!(
                        "warning: event {} of transaction {} not delivered to sink {}: {}; \
                         sink failure not audited: {}",
                        event.event_id,
                        transaction_id,
                        sink.name(),
                        err,
                        audit_err
                    );
                }
            }
        }
    }

    pub fn place_request(&mut self, tx: PlaceRequest) -> Result<Request, LedgerError> {
        match self.submit(Transaction::PlaceRequest(tx))?.outcome {
            TransactionOutcome::RequestPlaced(request) => Ok(request),
            other => Err(unexpected_outcome("PlaceRequest", &other)),
        }
    }

    pub fn update_request_status(
        &mut self,
        tx: UpdateRequestStatus,
    ) -> Result<StatusUpdate, LedgerError> {
        match self.submit(Transaction::UpdateRequestStatus(tx))?.outcome {
            TransactionOutcome::RequestUpdated(update) => Ok(update),
            other => Err(unexpected_outcome("UpdateRequestStatus", &other)),
        }
    }

    pub fn setup_demo(
        &mut self,
        catalog: Option<DemoCatalog>,
    ) -> Result<DemoSummary, LedgerError> {
        match self.submit(Transaction::SetupDemo(SetupDemo { catalog }))?.outcome {
            TransactionOutcome::DemoSeeded(summary) => Ok(summary),
            other => Err(unexpected_outcome("SetupDemo", &other)),
        }
    }

    pub fn add_participant(
        &mut self,
        tx: AddParticipant,
    ) -> Result<ParticipantEntry, LedgerError> {
        match self.submit(Transaction::AddParticipant(tx))?.outcome {
            TransactionOutcome::ParticipantAdded(entry) => Ok(entry),
            other => Err(unexpected_outcome("AddParticipant", &other)),
        }
    }

    pub fn get_request(&self, request_id: &str) -> Result<Request, LedgerError> {
        self.backend.inspect(|r| registry::load(r, request_id))
    }

    pub fn get_container(&self, vin: &str) -> Result<Container, LedgerError> {
        self.backend.inspect(|r| registry::load(r, vin))
    }

    pub fn list_requests(&self) -> Result<Vec<Request>, LedgerError> {
        self.backend.inspect(|r| registry::load_all(r))
    }

    pub fn list_containers(&self) -> Result<Vec<Container>, LedgerError> {
        self.backend.inspect(|r| registry::load_all(r))
    }

    /// Containers whose current owner has identifier `owner_id` (any participant type).
    pub fn containers_owned_by(&self, owner_id: &str) -> Result<Vec<Container>, LedgerError> {
        Ok(self
            .list_containers()?
            .into_iter()
            .filter(|c| {
                c.owner
                    .as_ref()
                    .is_some_and(|o| o.identifier() == owner_id)
            })
            .collect())
    }

    pub fn participants(&self, kind: RecordKind) -> Result<Vec<ParticipantEntry>, LedgerError> {
        self.backend
            .inspect(|r| participants::list_participants(r, kind))
    }

    /// Historian records in commit order.
    pub fn history(&self) -> Result<Vec<HistorianRecord>, LedgerError> {
        let mut records: Vec<HistorianRecord> = self.backend.inspect(|r| registry::load_all(r))?;
        records.sort_by_key(|r| r.sequence);
        Ok(records)
    }
}

fn unexpected_outcome(transaction_type: &str, outcome: &TransactionOutcome) -> LedgerError {
    LedgerError::ValidationError(format!(
        "{} produced an unexpected outcome: {:?}",
        transaction_type, outcome
    ))
}
