use dtcg_core::host::{HostValue, InMemoryStore, VariableStore, VariableType};
use dtcg_core::merge::{ConflictAction, ConflictKind, ImportSummary};
use dtcg_core::protocol::{Session, UiEvent, UiRequest};

const DOCUMENT: &str = r##"{
    "color": {
        "$type": "color",
        "brand": { "$value": "#FF0000" },
        "overlay": { "$value": "#00000080" }
    },
    "spacing": {
        "$type": "dimension",
        "sm": { "$value": "0.5rem" },
        "md": { "$value": "16px" }
    },
    "shadow": {
        "card": {
            "$type": "shadow",
            "$value": { "offsetX": "0px", "offsetY": "2px", "blur": "4px", "spread": "0px", "color": "#00000040" }
        }
    }
}"##;

#[test]
fn import_then_export_round_trips_values() {
    let mut store = InMemoryStore::new();
    let summary = dtcg_core::import(&mut store, DOCUMENT, |_, _| ConflictAction::IgnoreOnce).unwrap();

    assert_eq!(summary.collections, 3);
    assert_eq!(summary.variables, 4);
    assert_eq!(summary.effect_styles, 1);
    assert!(summary.warnings.is_empty());

    let output = dtcg_core::export(&store).unwrap();
    assert_eq!(output.variable_count, 4);
    assert_eq!(output.effect_count, 1);

    // Units are normalized: 0.5rem went in, 8px comes out.
    assert_eq!(output.document["spacing"]["sm"]["$value"], "8px");

    // Re-importing the exported document into a fresh store yields the
    // same host values.
    let exported = output.to_json().unwrap();
    let mut second = InMemoryStore::new();
    let resummary = dtcg_core::import(&mut second, &exported, |_, _| ConflictAction::IgnoreOnce).unwrap();
    assert_eq!(resummary.variables, 4);
    assert_eq!(resummary.effect_styles, 1);

    let spacing = second
        .collections()
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Spacing")
        .unwrap();
    let values: Vec<Option<HostValue>> = second
        .variables_in(spacing.id)
        .unwrap()
        .into_iter()
        .map(|v| v.value)
        .collect();
    assert!(values.contains(&Some(HostValue::Number(8.0))));
    assert!(values.contains(&Some(HostValue::Number(16.0))));
}

fn collect(session: &mut Session<InMemoryStore>, request: UiRequest) -> Vec<UiEvent> {
    let mut events = Vec::new();
    session.handle(request, &mut |event| events.push(event));
    events
}

#[test]
fn session_runs_a_conflict_free_import() {
    let mut session = Session::new(InMemoryStore::new());
    let events = collect(
        &mut session,
        UiRequest::Import {
            json: DOCUMENT.to_string(),
        },
    );

    let UiEvent::Complete { summary } = events.last().unwrap() else {
        panic!("expected a complete frame, got {:?}", events.last());
    };
    assert_eq!(summary.variables, 4);
    assert_eq!(summary.effect_styles, 1);
    assert!(!session.awaiting_conflict());

    // Progress frames preceded completion.
    assert!(events
        .iter()
        .any(|e| matches!(e, UiEvent::Progress { stage, .. } if stage == "Parsing JSON...")));
}

#[test]
fn session_suspends_on_conflict_and_resumes_on_response() {
    let mut store = InMemoryStore::new();
    let colors = store.create_collection("Colors").unwrap();
    let id = store
        .create_variable(colors.id, "color/brand", VariableType::Color)
        .unwrap();
    store
        .set_variable_value(
            id,
            colors.default_mode,
            HostValue::Color(dtcg_core::codec::parse_color("#000000").unwrap()),
        )
        .unwrap();

    let mut session = Session::new(store);
    let events = collect(
        &mut session,
        UiRequest::Import {
            json: DOCUMENT.to_string(),
        },
    );

    let UiEvent::Conflict { name, item_type } = events.last().unwrap() else {
        panic!("expected a conflict frame");
    };
    assert_eq!(name, "color/brand");
    assert_eq!(*item_type, ConflictKind::Variable);
    assert!(session.awaiting_conflict());

    // A second import while suspended is refused.
    let refused = collect(
        &mut session,
        UiRequest::Import {
            json: DOCUMENT.to_string(),
        },
    );
    assert!(matches!(refused.last(), Some(UiEvent::Error { .. })));

    let events = collect(
        &mut session,
        UiRequest::ConflictResponse {
            action: ConflictAction::OverrideOnce,
        },
    );
    let UiEvent::Complete { summary } = events.last().unwrap() else {
        panic!("expected a complete frame after resolution");
    };
    assert_eq!(summary.variables_updated, 1);
    assert_eq!(summary.variables, 3);
    assert_eq!(summary.effect_styles, 1);
    assert!(!session.awaiting_conflict());
}

#[test]
fn conflict_response_without_pending_conflict_is_an_error_frame() {
    let mut session = Session::new(InMemoryStore::new());
    let events = collect(
        &mut session,
        UiRequest::ConflictResponse {
            action: ConflictAction::IgnoreAll,
        },
    );
    assert!(matches!(events.last(), Some(UiEvent::Error { .. })));
}

#[test]
fn session_export_emits_export_complete() {
    let mut session = Session::new(InMemoryStore::new());
    collect(
        &mut session,
        UiRequest::Import {
            json: DOCUMENT.to_string(),
        },
    );

    let events = collect(&mut session, UiRequest::Export);
    let UiEvent::ExportComplete { json, summary } = events.last().unwrap() else {
        panic!("expected an export-complete frame");
    };
    assert_eq!(summary.variables, 4);
    assert_eq!(summary.effect_styles, 1);
    assert!(json.contains("\"$value\""));
}

#[test]
fn parse_failure_surfaces_as_an_error_frame() {
    let mut session = Session::new(InMemoryStore::new());
    let events = collect(
        &mut session,
        UiRequest::Import {
            json: "{ broken".to_string(),
        },
    );
    let UiEvent::Error { message } = events.last().unwrap() else {
        panic!("expected an error frame");
    };
    assert!(message.contains("invalid JSON"));
}

#[test]
fn empty_document_surfaces_as_an_error_frame() {
    let mut session = Session::new(InMemoryStore::new());
    let events = collect(
        &mut session,
        UiRequest::Import {
            json: "{}".to_string(),
        },
    );
    let UiEvent::Error { message } = events.last().unwrap() else {
        panic!("expected an error frame");
    };
    assert_eq!(message, "No valid tokens found");
}

#[test]
fn frames_use_the_wire_naming() {
    let conflict = UiEvent::Conflict {
        name: "color/brand".to_string(),
        item_type: ConflictKind::Variable,
    };
    let json = serde_json::to_value(&conflict).unwrap();
    assert_eq!(json["type"], "conflict");
    assert_eq!(json["itemType"], "variable");

    let response: UiRequest = serde_json::from_str(
        r#"{ "type": "conflict-response", "action": "override-all" }"#,
    )
    .unwrap();
    assert_eq!(
        response,
        UiRequest::ConflictResponse {
            action: ConflictAction::OverrideAll
        }
    );

    let complete = UiEvent::Complete {
        summary: ImportSummary {
            collections: 1,
            variables: 2,
            ..Default::default()
        },
    };
    let json = serde_json::to_value(&complete).unwrap();
    assert_eq!(json["type"], "complete");
    assert_eq!(json["summary"]["variablesUpdated"], 0);
    assert_eq!(json["summary"]["effectStyles"], 0);
}
