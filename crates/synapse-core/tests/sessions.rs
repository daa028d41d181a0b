//! Durable session store integration tests.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use synapse_core::sessions::SessionStore;
use synapse_core::state::{JsonlStateStore, SessionStateStore};
use synapse_core::types::Message;
use synapse_protocol::ContextHint;
use tempfile::tempdir;

fn durable_store(root: &std::path::Path) -> SessionStore {
    let state: Arc<dyn SessionStateStore> =
        Arc::new(JsonlStateStore::new(root).expect("state store"));
    SessionStore::with_state(state).expect("session store")
}

#[test]
fn sessions_survive_a_restart() {
    let temp = tempdir().expect("tempdir");

    let store = durable_store(temp.path());
    let session = store
        .create(
            "user-1",
            "gene questions",
            Some(ContextHint::gene_analysis("rec-7")),
        )
        .expect("create");
    store
        .append(session.id, "user-1", Message::user("what is rec-7?"))
        .expect("append user");
    store
        .append(session.id, "user-1", Message::assistant("a gene record"))
        .expect("append assistant");
    store
        .rename(session.id, "user-1", "rec-7 discussion")
        .expect("rename");
    drop(store);

    let restored = durable_store(temp.path());
    let reloaded = restored.get(session.id, "user-1").expect("reloaded");
    assert_eq!(reloaded.title, "rec-7 discussion");
    assert_eq!(reloaded.context, Some(ContextHint::gene_analysis("rec-7")));
    assert_eq!(reloaded.messages.len(), 2);
    assert_eq!(reloaded.messages[0].content, "what is rec-7?");
    assert_eq!(reloaded.messages[1].content, "a gene record");
}

#[test]
fn delete_removes_the_rollout_file() {
    let temp = tempdir().expect("tempdir");

    let store = durable_store(temp.path());
    let session = store.create("user-1", "ephemeral", None).expect("create");
    assert_eq!(store.delete(session.id, "user-1").expect("delete"), true);
    drop(store);

    let restored = durable_store(temp.path());
    assert!(restored.get(session.id, "user-1").is_none());
    assert!(restored.is_empty());
}

#[test]
fn restart_preserves_recent_activity_ordering() {
    let temp = tempdir().expect("tempdir");

    let store = durable_store(temp.path());
    let older = store.create("user-1", "older", None).expect("create");
    let newer = store.create("user-1", "newer", None).expect("create");
    store
        .append(older.id, "user-1", Message::user("late activity"))
        .expect("append");
    drop(store);

    let restored = durable_store(temp.path());
    let summaries = restored.list("user-1");
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].id, older.id);
    assert_eq!(summaries[1].id, newer.id);
}
