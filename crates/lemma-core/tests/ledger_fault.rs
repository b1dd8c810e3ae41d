//! Fault injection: crashed writers, foreign events, concurrent readers.

use lemma_core::Workbench;
use lemma_core::event::EventKind;
use lemma_core::ledger::{LEDGER_DIR, LEDGER_FILE, Ledger};
use lemma_core::model::node::EpistemicState;
use lemma_core::model::node_id::NodeId;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn nid(s: &str) -> NodeId {
    s.parse().expect("valid id")
}

fn append_raw(root: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new()
        .append(true)
        .open(root.join(LEDGER_DIR).join(LEDGER_FILE))
        .expect("open ledger file");
    file.write_all(bytes).expect("write");
}

#[test]
fn torn_write_is_invisible_to_readers() {
    let dir = TempDir::new().expect("tempdir");
    let wb = Workbench::init(dir.path(), "C", "a").expect("init");
    wb.accept(&nid("1")).expect("accept");

    // A writer died mid-record.
    append_raw(dir.path(), b"{\"seq\":4,\"timestamp\":\"2026-");

    let state = wb.load_state().expect("readers see the committed prefix");
    assert_eq!(
        state.node(&nid("1")).expect("root").epistemic,
        EpistemicState::Validated
    );
}

#[test]
fn append_after_torn_write_preserves_committed_events() {
    let dir = TempDir::new().expect("tempdir");
    let wb = Workbench::init(dir.path(), "C", "a").expect("init");

    append_raw(dir.path(), b"{\"half\":");

    // The next mutating operation truncates the tail and commits normally.
    wb.accept(&nid("1")).expect("accept");

    let loaded = Ledger::open(dir.path()).load().expect("load");
    let kinds: Vec<EventKind> = loaded.events.iter().map(|e| e.kind()).collect();
    assert_eq!(kinds[0], EventKind::ProofInitialized);
    assert!(kinds.contains(&EventKind::NodeValidated));
    for (i, event) in loaded.events.iter().enumerate() {
        assert_eq!(event.seq, i as u64 + 1, "dense seqs after recovery");
    }
}

#[test]
fn unknown_event_kind_from_a_newer_client_is_skipped() {
    let dir = TempDir::new().expect("tempdir");
    let wb = Workbench::init(dir.path(), "C", "a").expect("init");

    append_raw(
        dir.path(),
        b"{\"seq\":2,\"timestamp\":\"2026-07-30T12:00:00Z\",\"type\":\"node_annotated\",\"node_id\":\"1\",\"note\":\"hi\"}\n",
    );

    // State still loads; the foreign record holds seq 2.
    let state = wb.load_state().expect("load");
    assert!(state.is_initialized());

    wb.accept(&nid("1")).expect("accept");
    let loaded = Ledger::open(dir.path()).load().expect("load");
    assert_eq!(loaded.record_count, 4, "init + foreign + validated + taint");
    assert_eq!(loaded.events.len(), 3, "foreign record is not projected");
}

#[test]
fn mid_file_corruption_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let wb = Workbench::init(dir.path(), "C", "a").expect("init");

    append_raw(dir.path(), b"garbage line\n");
    append_raw(
        dir.path(),
        b"{\"seq\":3,\"timestamp\":\"2026-07-30T12:00:00Z\",\"type\":\"node_validated\",\"node_id\":\"1\"}\n",
    );

    let err = wb.load_state().unwrap_err();
    assert_eq!(err.error_kind(), "ledger_integrity");
}

#[test]
fn operations_refuse_a_foreign_future_ledger() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(dir.path().join(LEDGER_DIR)).expect("mkdir");
    std::fs::write(
        dir.path().join(LEDGER_DIR).join(LEDGER_FILE),
        "# lemma ledger v2\n",
    )
    .expect("write");

    let wb = Workbench::open(dir.path()).expect("open only checks existence");
    let err = wb.load_state().unwrap_err();
    assert_eq!(err.error_kind(), "version_mismatch");
}
