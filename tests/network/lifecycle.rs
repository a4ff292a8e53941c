use container_network::core::config::LedgerConfig;
use container_network::core::events::CollectingSink;
use container_network::core::memory::MemoryBackend;
use container_network::core::resource::{Factory, RecordKind, Relationship};
use container_network::network::intake::PlaceRequest;
use container_network::network::ledger::Ledger;
use container_network::network::lifecycle::UpdateRequestStatus;
use container_network::network::model::{
    ContainerDetails, ContainerStatus, OwnerSource, RequestStatus, UpdateRequestStatusEvent,
};
use container_network::network::participants::AddParticipant;

const VIN: &str = "ea290d9f5a6833a65";

fn placed_ledger(config: LedgerConfig) -> (Ledger<MemoryBackend>, CollectingSink) {
    let sink = CollectingSink::new();
    let mut ledger = Ledger::in_memory(config).with_sink(sink.clone());
    let factory = ledger.factory().clone();
    ledger
        .place_request(PlaceRequest {
            request_id: "R1".to_string(),
            container_details: ContainerDetails {
                make: factory
                    .new_relationship(RecordKind::Manufacturer, "Arium")
                    .expect("make"),
                model_type: "Nova".to_string(),
                colour: "Royal Purple".to_string(),
            },
            requester: factory
                .new_relationship(RecordKind::Producer, "Paul")
                .expect("requester"),
            options: serde_json::Value::Null,
            location: None,
        })
        .expect("place R1");
    (ledger, sink)
}

fn request_ref(factory: &Factory) -> Relationship {
    factory
        .new_relationship(RecordKind::Request, "R1")
        .expect("request ref")
}

fn update(
    factory: &Factory,
    status: RequestStatus,
    vin: Option<&str>,
    transporter: Option<&str>,
) -> UpdateRequestStatus {
    UpdateRequestStatus {
        request: request_ref(factory),
        request_status: status,
        vin: vin.map(str::to_string),
        transporter: transporter.map(|t| {
            factory
                .new_relationship(RecordKind::Transporter, t)
                .expect("transporter ref")
        }),
    }
}

#[test]
fn full_request_lifecycle_hands_container_to_transporter() {
    let (mut ledger, sink) = placed_ledger(LedgerConfig::default());
    let factory = ledger.factory().clone();

    let scheduled = ledger
        .update_request_status(update(
            &factory,
            RequestStatus::ScheduledForManufacture,
            None,
            None,
        ))
        .expect("schedule");
    assert!(scheduled.container.is_none());
    assert!(ledger.list_containers().expect("list").is_empty());

    let assigned = ledger
        .update_request_status(update(&factory, RequestStatus::VinAssigned, Some(VIN), None))
        .expect("assign vin");
    let container = assigned.container.expect("container created");
    assert_eq!(container.vin, VIN);
    assert_eq!(container.container_status, ContainerStatus::Available);
    assert!(container.owner.is_none());
    assert_eq!(container.container_details.model_type, "Nova");
    assert_eq!(container.container_details.colour, "Royal Purple");
    assert_eq!(container.container_details.make.identifier(), "Arium");

    let handed = ledger
        .update_request_status(update(
            &factory,
            RequestStatus::TransporterAssigned,
            Some(VIN),
            Some("T1"),
        ))
        .expect("assign transporter");
    assert_eq!(handed.owner_source, Some(OwnerSource::Transporter));

    let stored = ledger.get_container(VIN).expect("container");
    assert_eq!(stored.container_status, ContainerStatus::Active);
    let owner = stored.owner.expect("owner set");
    assert_eq!(owner.kind(), RecordKind::Transporter);
    assert_eq!(owner.identifier(), "T1");
    assert_eq!(
        ledger.containers_owned_by("T1").expect("owned").len(),
        1
    );

    ledger
        .update_request_status(update(&factory, RequestStatus::Delivered, None, None))
        .expect("deliver");
    assert_eq!(
        ledger.get_request("R1").expect("R1").request_status,
        RequestStatus::Delivered
    );

    let updates: Vec<UpdateRequestStatusEvent> = sink
        .events()
        .iter()
        .filter(|e| e.is::<UpdateRequestStatusEvent>())
        .map(|e| e.decode().expect("decode"))
        .collect();
    let statuses: Vec<RequestStatus> = updates.iter().map(|e| e.request_status).collect();
    assert_eq!(
        statuses,
        vec![
            RequestStatus::ScheduledForManufacture,
            RequestStatus::VinAssigned,
            RequestStatus::TransporterAssigned,
            RequestStatus::Delivered,
        ]
    );
    assert_eq!(updates[1].request.request_status, RequestStatus::VinAssigned);

    let history = ledger.history().expect("history");
    assert_eq!(history.len(), 5);
    let sequences: Vec<u64> = history.iter().map(|h| h.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    assert_eq!(history[0].transaction_type, "PlaceRequest");
    assert!(history[1..]
        .iter()
        .all(|h| h.transaction_type == "UpdateRequestStatus"));
    assert!(history.iter().all(|h| h.event_ids.len() == 1));
}

#[test]
fn vin_assignment_without_vin_changes_nothing() {
    let (mut ledger, sink) = placed_ledger(LedgerConfig::default());
    let factory = ledger.factory().clone();

    let err = ledger
        .update_request_status(update(&factory, RequestStatus::VinAssigned, None, None))
        .expect_err("vin is required");
    assert_eq!(err.kind(), "MISSING_FIELD");

    let err = ledger
        .update_request_status(update(&factory, RequestStatus::VinAssigned, Some("  "), None))
        .expect_err("blank vin");
    assert_eq!(err.kind(), "MISSING_FIELD");

    assert_eq!(
        ledger.get_request("R1").expect("R1").request_status,
        RequestStatus::Placed
    );
    assert!(ledger.list_containers().expect("list").is_empty());
    assert_eq!(sink.events().len(), 1);
    assert_eq!(ledger.history().expect("history").len(), 1);
}

#[test]
fn transporter_assignment_requires_existing_container() {
    let (mut ledger, _sink) = placed_ledger(LedgerConfig::default());
    let factory = ledger.factory().clone();

    let err = ledger
        .update_request_status(update(
            &factory,
            RequestStatus::TransporterAssigned,
            Some("nope"),
            Some("T1"),
        ))
        .expect_err("container missing");
    assert_eq!(err.kind(), "NOT_FOUND");
    assert_eq!(
        ledger.get_request("R1").expect("R1").request_status,
        RequestStatus::Placed
    );

    let err = ledger
        .update_request_status(update(
            &factory,
            RequestStatus::TransporterAssigned,
            None,
            Some("T1"),
        ))
        .expect_err("vin missing");
    assert_eq!(err.kind(), "MISSING_FIELD");
}

#[test]
fn unknown_request_is_not_found() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    let factory = ledger.factory().clone();

    let err = ledger
        .update_request_status(update(&factory, RequestStatus::Delivered, None, None))
        .expect_err("R1 was never placed");
    assert_eq!(err.kind(), "NOT_FOUND");
    assert!(ledger.history().expect("history").is_empty());
}

#[test]
fn reassigning_an_existing_vin_is_a_duplicate() {
    let (mut ledger, _sink) = placed_ledger(LedgerConfig::default());
    let factory = ledger.factory().clone();

    ledger
        .update_request_status(update(&factory, RequestStatus::VinAssigned, Some(VIN), None))
        .expect("first");
    let err = ledger
        .update_request_status(update(&factory, RequestStatus::VinAssigned, Some(VIN), None))
        .expect_err("second");
    assert_eq!(err.kind(), "DUPLICATE_IDENTIFIER");
    assert_eq!(ledger.list_containers().expect("list").len(), 1);
}

#[test]
fn missing_transporter_falls_back_to_requester_identifier() {
    let (mut ledger, sink) = placed_ledger(LedgerConfig::default());
    let factory = ledger.factory().clone();

    ledger
        .update_request_status(update(&factory, RequestStatus::VinAssigned, Some(VIN), None))
        .expect("assign vin");
    let outcome = ledger
        .update_request_status(update(
            &factory,
            RequestStatus::TransporterAssigned,
            Some(VIN),
            None,
        ))
        .expect("assign transporter");
    assert_eq!(outcome.owner_source, Some(OwnerSource::RequesterFallback));

    let owner = ledger
        .get_container(VIN)
        .expect("container")
        .owner
        .expect("owner");
    assert_eq!(owner.kind(), RecordKind::Transporter);
    assert_eq!(owner.identifier(), "Paul");

    let last = sink.events().pop().expect("event");
    let event: UpdateRequestStatusEvent = last.decode().expect("decode");
    assert_eq!(event.owner_source, Some(OwnerSource::RequesterFallback));
}

#[test]
fn strict_relationships_require_a_registered_transporter() {
    let config = LedgerConfig {
        strict_relationships: true,
        ..LedgerConfig::default()
    };
    let mut ledger = Ledger::in_memory(config);
    let factory = ledger.factory().clone();
    for (kind, id) in [(RecordKind::Producer, "Paul"), (RecordKind::Manufacturer, "Arium")] {
        ledger
            .add_participant(AddParticipant {
                kind,
                id: id.to_string(),
                name: None,
            })
            .expect("register");
    }
    ledger
        .place_request(PlaceRequest {
            request_id: "R1".to_string(),
            container_details: ContainerDetails {
                make: factory
                    .new_relationship(RecordKind::Manufacturer, "Arium")
                    .expect("make"),
                model_type: "Nova".to_string(),
                colour: "Royal Purple".to_string(),
            },
            requester: factory
                .new_relationship(RecordKind::Producer, "Paul")
                .expect("requester"),
            options: serde_json::Value::Null,
            location: None,
        })
        .expect("place");
    ledger
        .update_request_status(update(&factory, RequestStatus::VinAssigned, Some(VIN), None))
        .expect("assign vin");

    let err = ledger
        .update_request_status(update(
            &factory,
            RequestStatus::TransporterAssigned,
            Some(VIN),
            Some("T1"),
        ))
        .expect_err("T1 not registered");
    assert_eq!(err.kind(), "NOT_FOUND");
    let container = ledger.get_container(VIN).expect("container");
    assert_eq!(container.container_status, ContainerStatus::Available);
    assert!(container.owner.is_none());

    ledger
        .add_participant(AddParticipant {
            kind: RecordKind::Transporter,
            id: "T1".to_string(),
            name: Some("Haulage One".to_string()),
        })
        .expect("register T1");
    ledger
        .update_request_status(update(
            &factory,
            RequestStatus::TransporterAssigned,
            Some(VIN),
            Some("T1"),
        ))
        .expect("assign registered transporter");
    assert_eq!(
        ledger.get_container(VIN).expect("container").container_status,
        ContainerStatus::Active
    );
}

#[test]
fn unknown_status_string_is_rejected_at_parse_time() {
    let raw = r#"{
        "type": "UpdateRequestStatus",
        "request": "resource:org.acme.container_network.Request#R1",
        "requestStatus": "SHIPPED"
    }"#;
    let parsed = serde_json::from_str::<container_network::network::ledger::Transaction>(raw);
    assert!(parsed.is_err());

    let err = "SHIPPED".parse::<RequestStatus>().expect_err("unknown");
    assert_eq!(err.kind(), "VALIDATION");
}
