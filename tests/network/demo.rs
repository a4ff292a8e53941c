use container_network::core::config::LedgerConfig;
use container_network::core::memory::MemoryBackend;
use container_network::core::resource::RecordKind;
use container_network::network::demo::{DemoCatalog, DemoSummary};
use container_network::network::ledger::Ledger;
use container_network::network::model::ContainerStatus;

#[test]
fn demo_setup_seeds_the_embedded_dataset() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    let summary = ledger.setup_demo(None).expect("demo setup");
    assert_eq!(
        summary,
        DemoSummary {
            regulators: 1,
            producers: 14,
            manufacturers: 3,
            containers: 13,
        }
    );

    let backend: &MemoryBackend = ledger.backend();
    assert_eq!(backend.record_count(RecordKind::Regulator), 1);
    assert_eq!(backend.record_count(RecordKind::Producer), 14);
    assert_eq!(backend.record_count(RecordKind::Manufacturer), 3);
    assert_eq!(backend.record_count(RecordKind::Container), 13);
    assert_eq!(backend.record_count(RecordKind::Request), 0);

    let regulators = ledger.participants(RecordKind::Regulator).expect("regulators");
    assert_eq!(regulators[0].id, "VDA");

    let containers = ledger.list_containers().expect("containers");
    assert!(containers
        .iter()
        .all(|c| c.container_status == ContainerStatus::Active));
    assert!(containers.iter().all(|c| {
        c.owner
            .as_ref()
            .is_some_and(|o| o.kind() == RecordKind::Producer)
    }));
}

#[test]
fn demo_owners_start_at_the_second_producer() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    ledger.setup_demo(None).expect("demo setup");

    let first = ledger.get_container("ea290d9f5a6833a65").expect("first container");
    assert_eq!(first.container_details.make.identifier(), "Arium");
    assert_eq!(first.container_details.model_type, "Nova");
    assert_eq!(first.container_details.colour, "Royal Purple");
    assert_eq!(first.owner.expect("owner").identifier(), "Andy");

    assert!(ledger.containers_owned_by("Paul").expect("Paul").is_empty());
    assert_eq!(ledger.containers_owned_by("LesleyAnn").expect("LesleyAnn").len(), 1);
}

#[test]
fn second_demo_setup_is_rejected_atomically() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    ledger.setup_demo(None).expect("first run");
    let err = ledger.setup_demo(None).expect_err("second run");
    assert_eq!(err.kind(), "DUPLICATE_IDENTIFIER");

    assert_eq!(ledger.backend().record_count(RecordKind::Container), 13);
    assert_eq!(ledger.history().expect("history").len(), 1);
}

#[test]
fn demo_emits_no_events_but_records_history() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    ledger.setup_demo(None).expect("demo");
    assert!(ledger.backend().committed_events().is_empty());

    let history = ledger.history().expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].transaction_type, "SetupDemo");
    assert!(history[0].event_ids.is_empty());
    assert_eq!(history[0].payload_hash.len(), 64);
}

#[test]
fn custom_catalog_is_used_when_given() {
    let catalog = DemoCatalog::from_toml(
        r#"
regulator = "DVLA"
producers = ["Ann", "Bob", "Cy"]

[[manufacturers]]
name = "Ridge"

[[manufacturers.models]]
model = "Cannon"
containers = [
    { vin = "v-1", colour = "Green", status = "AVAILABLE" },
    { vin = "v-2", colour = "Blue", status = "OUT_OF_SERVICE" },
]
"#,
    )
    .expect("catalog");

    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    let summary = ledger.setup_demo(Some(catalog)).expect("seed");
    assert_eq!(summary.producers, 3);
    assert_eq!(summary.containers, 2);

    let second = ledger.get_container("v-2").expect("v-2");
    assert_eq!(second.container_status, ContainerStatus::OutOfService);
    assert_eq!(second.owner.expect("owner").identifier(), "Cy");
}

#[test]
fn catalog_with_too_few_producers_fails_before_writing() {
    let catalog = DemoCatalog::from_toml(
        r#"
regulator = "DVLA"
producers = ["Ann", "Bob"]

[[manufacturers]]
name = "Ridge"

[[manufacturers.models]]
model = "Cannon"
containers = [
    { vin = "v-1", colour = "Green", status = "ACTIVE" },
    { vin = "v-2", colour = "Blue", status = "ACTIVE" },
]
"#,
    )
    .expect("catalog");

    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    let err = ledger.setup_demo(Some(catalog)).expect_err("capacity");
    assert_eq!(err.kind(), "VALIDATION");
    assert_eq!(ledger.backend().record_count(RecordKind::Producer), 0);
    assert_eq!(ledger.backend().record_count(RecordKind::Regulator), 0);
}

#[test]
fn catalog_rejects_unknown_keys() {
    let err = DemoCatalog::from_toml(
        "regulator = \"VDA\"\nproducers = []\nmanufacturers = []\nowners = 3",
    )
    .expect_err("unknown key");
    assert_eq!(err.kind(), "VALIDATION");
}
