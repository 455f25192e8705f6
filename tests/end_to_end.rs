use std::fs;
use std::path::Path;

use lazyocredit::edit::EditKey;
use lazyocredit::export::{ExportFormat, export_session};
use lazyocredit::extraction::{Extractor, JsonExtractor};
use lazyocredit::mapper::{Viewport, ViewportBox, map_raw_to_viewport};
use lazyocredit::overlay::{ElementBody, RunKind, compose};
use lazyocredit::search::{Match, SearchSummary};
use lazyocredit::session::Effect;
use lazyocredit::workspace::{Stage, Workspace};
use pretty_assertions::assert_eq;

const INVOICE: &str = r#"{
    "content": [
        {"content": "Invoice 2024", "coordinates": [[0,0],[100,0],[100,20],[0,20]]},
        {"content": "Total: 500", "coordinates": [[0,30],[100,30],[100,50],[0,50]]}
    ],
    "image_size": {"width": 200, "height": 100},
    "type": "Facture"
}"#;

fn open_invoice(dir: &Path) -> Workspace {
    let path = dir.join("invoice.json");
    fs::write(&path, INVOICE).unwrap();
    let mut ws = Workspace::with_token(Some("token"));
    ws.upload(&JsonExtractor, &path).unwrap();
    ws
}

#[test]
fn first_region_maps_to_scaled_box() {
    let dir = tempfile::tempdir().unwrap();
    let ws = open_invoice(dir.path());
    let session = ws.session().unwrap();

    let region = session.regions().get(0).unwrap();
    let bbox = map_raw_to_viewport(&region.coordinates, session.image_size(), Viewport::default())
        .unwrap();
    assert_eq!(
        bbox,
        ViewportBox {
            left: 0,
            top: 0,
            width: 400,
            height: 226
        }
    );

    let frame = compose(session, Viewport::default());
    assert_eq!(frame.elements.len(), 2);
    assert_eq!(frame.element(0).unwrap().bbox, bbox);
    assert!(frame.skipped.is_empty());
}

#[test]
fn query_total_yields_single_match() {
    let dir = tempfile::tempdir().unwrap();
    let mut ws = open_invoice(dir.path());
    let session = ws.session_mut().unwrap();

    let expected = Match {
        region_index: 1,
        start: 0,
        end: 5,
    };
    let effects = session.set_query("Total");
    assert_eq!(effects, vec![Effect::RevealMatch(expected)]);
    assert_eq!(session.search().matches(), &[expected]);
    assert_eq!(
        session.search().summary(),
        SearchSummary::Results {
            current: 0,
            total: 1
        }
    );

    let frame = compose(session, Viewport::default());
    match &frame.element(1).unwrap().body {
        ElementBody::Highlighted(runs) => {
            assert_eq!(runs[0].text, "Total");
            assert_eq!(runs[0].kind, RunKind::Current);
            assert_eq!(runs[1].text, ": 500");
            assert_eq!(runs[1].kind, RunKind::Plain);
        }
        other => panic!("expected highlighted body, got {other:?}"),
    }
    assert!(matches!(frame.element(0).unwrap().body, ElementBody::Static(_)));
}

#[test]
fn export_joins_regions_with_blank_line() {
    let dir = tempfile::tempdir().unwrap();
    let ws = open_invoice(dir.path());
    let session = ws.session().unwrap();

    assert_eq!(session.plain_text(), "Invoice 2024\n\nTotal: 500");

    let out = dir.path().join("out");
    let written = export_session(session, ExportFormat::Text, &out, ws.source_path()).unwrap();
    assert_eq!(fs::read_to_string(written).unwrap(), "Invoice 2024\n\nTotal: 500");
}

#[test]
fn edit_then_search_sees_committed_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut ws = open_invoice(dir.path());

    let session = ws.session_mut().unwrap();
    session.set_query("due");
    assert_eq!(session.search().summary(), SearchSummary::NoResults);

    let effects = session.begin_edit(1).unwrap();
    assert_eq!(effects, vec![Effect::FocusEditor { index: 1 }]);
    for c in " due".chars() {
        session.edit_key(EditKey::Char(c)).unwrap();
    }
    // rozepsaný text se do hledání nepropisuje
    assert_eq!(session.search().summary(), SearchSummary::NoResults);

    let effects = session.edit_key(EditKey::Confirm { line_break: false }).unwrap();
    assert_eq!(effects, vec![Effect::ContentCommitted { index: 1 }]);
    assert_eq!(
        session.search().matches(),
        &[Match {
            region_index: 1,
            start: 11,
            end: 14
        }]
    );

    ws.observe(&effects);
    assert_eq!(ws.edited_content()[1].content, "Total: 500 due");

    let manifest = export_session(ws.session().unwrap(), ExportFormat::Json, dir.path(), ws.source_path())
        .unwrap();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(manifest).unwrap()).unwrap();
    assert_eq!(v["type"], "Facture");
    assert_eq!(v["regions"][1]["content"], "Total: 500 due");
    assert_eq!(v["source"]["size"], INVOICE.len() as u64);
}

#[test]
fn upstream_error_keeps_workspace_in_upload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("failed.json");
    fs::write(&path, r#"{"error": "unsupported file"}"#).unwrap();

    let mut ws = Workspace::with_token(Some("token"));
    let err = ws.upload(&JsonExtractor, &path).unwrap_err();
    assert!(err.to_string().contains("unsupported file"));
    assert_eq!(ws.stage(), Stage::Upload);

    // stejný backend, jiný soubor
    assert!(JsonExtractor.extract(&dir.path().join("nope.json")).is_err());
}

#[test]
fn malformed_region_is_skipped_but_exported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.json");
    fs::write(
        &path,
        r#"{"content": [
            {"content": "ok", "coordinates": [[0,0],[10,0],[10,10],[0,10]]},
            {"content": "broken", "coordinates": [[0,0],[10,0]]}
        ]}"#,
    )
    .unwrap();

    let mut ws = Workspace::with_token(Some("token"));
    ws.upload(&JsonExtractor, &path).unwrap();
    let session = ws.session().unwrap();

    assert_eq!(session.doc_type(), "Document");
    let frame = compose(session, Viewport::default());
    assert_eq!(frame.skipped, vec![1]);
    assert_eq!(session.plain_text(), "ok\n\nbroken");
}
