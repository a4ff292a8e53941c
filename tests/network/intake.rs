use container_network::core::config::LedgerConfig;
use container_network::core::events::CollectingSink;
use container_network::core::resource::{Factory, RecordKind};
use container_network::network::intake::PlaceRequest;
use container_network::network::ledger::{Ledger, Transaction, TransactionOutcome};
use container_network::network::model::{ContainerDetails, PlaceRequestEvent, RequestStatus};
use container_network::network::participants::AddParticipant;

fn details(factory: &Factory, make: &str, model: &str, colour: &str) -> ContainerDetails {
    ContainerDetails {
        make: factory
            .new_relationship(RecordKind::Manufacturer, make)
            .expect("make ref"),
        model_type: model.to_string(),
        colour: colour.to_string(),
    }
}

fn place(factory: &Factory, id: &str, requester: &str) -> PlaceRequest {
    PlaceRequest {
        request_id: id.to_string(),
        container_details: details(factory, "Arium", "Nova", "Royal Purple"),
        requester: factory
            .new_relationship(RecordKind::Producer, requester)
            .expect("requester ref"),
        options: serde_json::json!({ "trim": "standard", "extras": ["tow bar"] }),
        location: Some("Winchester".to_string()),
    }
}

#[test]
fn place_request_stores_placed_request_and_emits_event() {
    let sink = CollectingSink::new();
    let mut ledger = Ledger::in_memory(LedgerConfig::default()).with_sink(sink.clone());
    let factory = ledger.factory().clone();

    let receipt = ledger
        .submit(Transaction::PlaceRequest(place(&factory, "R1", "Paul")))
        .expect("place R1");
    assert_eq!(receipt.transaction_type, "PlaceRequest");
    match &receipt.outcome {
        TransactionOutcome::RequestPlaced(request) => {
            assert_eq!(request.request_status, RequestStatus::Placed);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let stored = ledger.get_request("R1").expect("R1 stored");
    assert_eq!(stored.request_status, RequestStatus::Placed);
    assert_eq!(stored.requester.identifier(), "Paul");
    assert_eq!(stored.requester.kind(), RecordKind::Producer);
    assert_eq!(stored.container_details.make.identifier(), "Arium");
    assert_eq!(stored.options["extras"][0], "tow bar");
    assert_eq!(stored.location.as_deref(), Some("Winchester"));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "PlaceRequestEvent");
    assert_eq!(events[0].transaction_id, receipt.transaction_id);
    let event: PlaceRequestEvent = events[0].decode().expect("decode event");
    assert_eq!(event.request_id, "R1");
    assert_eq!(event.location.as_deref(), Some("Winchester"));
    assert_eq!(event.container_details.colour, "Royal Purple");
    assert_eq!(
        event.requester.to_string(),
        "resource:org.acme.container_network.Producer#Paul"
    );
}

#[test]
fn duplicate_request_id_is_rejected_without_side_effects() {
    let sink = CollectingSink::new();
    let mut ledger = Ledger::in_memory(LedgerConfig::default()).with_sink(sink.clone());
    let factory = ledger.factory().clone();

    ledger.place_request(place(&factory, "R1", "Paul")).expect("first");
    let err = ledger
        .place_request(place(&factory, "R1", "Andy"))
        .expect_err("second placement must fail");
    assert_eq!(err.kind(), "DUPLICATE_IDENTIFIER");

    assert_eq!(ledger.get_request("R1").expect("R1").requester.identifier(), "Paul");
    assert!(ledger.list_containers().expect("containers").is_empty());
    assert_eq!(sink.events().len(), 1);
    assert_eq!(ledger.history().expect("history").len(), 1);
}

#[test]
fn missing_details_are_rejected() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    let factory = ledger.factory().clone();

    let mut tx = place(&factory, "R2", "Paul");
    tx.container_details.colour = String::new();
    let err = ledger.place_request(tx).expect_err("empty colour");
    assert_eq!(err.kind(), "MISSING_FIELD");

    let mut tx = place(&factory, "", "Paul");
    tx.request_id = "  ".to_string();
    assert!(ledger.place_request(tx).is_err());

    assert!(ledger.list_requests().expect("list").is_empty());
}

#[test]
fn requester_must_be_a_producer() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    let factory = ledger.factory().clone();

    let mut tx = place(&factory, "R3", "Paul");
    tx.requester = factory
        .new_relationship(RecordKind::Transporter, "Paul")
        .expect("ref");
    let err = ledger.place_request(tx).expect_err("wrong requester kind");
    assert_eq!(err.kind(), "VALIDATION");
}

#[test]
fn strict_relationships_require_a_registered_producer() {
    let config = LedgerConfig {
        strict_relationships: true,
        ..LedgerConfig::default()
    };
    let mut ledger = Ledger::in_memory(config);
    let factory = ledger.factory().clone();

    let err = ledger
        .place_request(place(&factory, "R1", "Paul"))
        .expect_err("Paul is not registered yet");
    assert_eq!(err.kind(), "NOT_FOUND");

    ledger
        .add_participant(AddParticipant {
            kind: RecordKind::Producer,
            id: "Paul".to_string(),
            name: Some("Paul".to_string()),
        })
        .expect("register Paul");
    ledger
        .place_request(place(&factory, "R1", "Paul"))
        .expect("placement after registration");
}

#[test]
fn transaction_json_shape_is_accepted() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    let raw = r#"{
        "type": "PlaceRequest",
        "requestId": "R9",
        "containerDetails": {
            "make": "resource:org.acme.container_network.Manufacturer#Morde",
            "modelType": "Putt",
            "colour": "Black"
        },
        "requester": "resource:org.acme.container_network.Producer#Sam"
    }"#;
    let tx: Transaction = serde_json::from_str(raw).expect("parse transaction");
    ledger.submit(tx).expect("submit");

    let request = ledger.get_request("R9").expect("R9");
    assert_eq!(request.container_details.model_type, "Putt");
    assert!(request.options.is_null());
    assert!(request.location.is_none());
}
