use super::*;
use crate::storage::MemoryStore;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

fn tracker() -> (Arc<MemoryStore>, SearchTracker) {
    let store = Arc::new(MemoryStore::new());
    let tracker = SearchTracker::new(store.clone());
    (store, tracker)
}

// =============================================================================
// Transitions
// =============================================================================

#[test]
fn add_registers_pending_task() {
    let (_, tracker) = tracker();
    let id = tracker.add_search(SearchDescriptor::new(TaskKind::GameSuggestion, "Cyberpunk 2077").subtitle("high-60fps"));

    let task = tracker.get_search_by_id(&id).unwrap();
    assert!(task.is_pending());
    assert_eq!(task.kind, TaskKind::GameSuggestion);
    assert_eq!(task.subtitle.as_deref(), Some("high-60fps"));
    assert!(task.start_time > 0);
    assert_eq!(tracker.pending_count(), 1);
}

#[test]
fn complete_runs_callback_exactly_once() {
    let (_, tracker) = tracker();
    let completes = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(None));

    let (c, e, s) = (completes.clone(), errors.clone(), seen.clone());
    let id = tracker.add_search(
        SearchDescriptor::new(TaskKind::QuickSearch, "RTX 4060")
            .on_complete(move |result| {
                c.fetch_add(1, Ordering::SeqCst);
                *s.lock().unwrap() = Some(result.clone());
            })
            .on_error(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
            }),
    );

    tracker.complete_search(&id, json!({ "ok": true }));
    tracker.complete_search(&id, json!({ "ok": false }));
    tracker.error_search(&id, TaskError::new("E_X", "late"));

    assert_eq!(completes.load(Ordering::SeqCst), 1);
    assert_eq!(errors.load(Ordering::SeqCst), 0);
    assert_eq!(*seen.lock().unwrap(), Some(json!({ "ok": true })));
    let task = tracker.get_search_by_id(&id).unwrap();
    assert_eq!(task.result(), Some(&json!({ "ok": true })));
    assert!(task.error().is_none());
    assert_eq!(tracker.pending_count(), 0);
}

#[test]
fn error_runs_error_callback_exactly_once() {
    let (_, tracker) = tracker();
    let completes = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));

    let (c, e) = (completes.clone(), errors.clone());
    let id = tracker.add_search(
        SearchDescriptor::new(TaskKind::AdvancedConfig, "Advanced")
            .on_complete(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(move |err| {
                assert_eq!(err.code, "E_TIMEOUT");
                e.fetch_add(1, Ordering::SeqCst);
            }),
    );

    tracker.error_search(&id, TaskError::new("E_TIMEOUT", "request timed out after 120s"));
    tracker.complete_search(&id, json!({}));

    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(completes.load(Ordering::SeqCst), 0);
    let task = tracker.get_search_by_id(&id).unwrap();
    assert_eq!(task.error().map(|e| e.code.as_str()), Some("E_TIMEOUT"));
    assert!(task.result().is_none());
}

#[test]
fn unknown_ids_are_ignored() {
    let (_, tracker) = tracker();
    tracker.complete_search("missing", json!({}));
    tracker.error_search("missing", TaskError::new("E_X", "x"));
    assert!(!tracker.remove_search("missing"));
    assert!(tracker.list().is_empty());
}

#[test]
fn remove_is_idempotent() {
    let (_, tracker) = tracker();
    let keep = tracker.add_search(SearchDescriptor::new(TaskKind::QuickSearch, "keep"));
    let gone = tracker.add_search(SearchDescriptor::new(TaskKind::QuickSearch, "gone"));

    assert!(tracker.remove_search(&gone));
    assert!(!tracker.remove_search(&gone));
    let ids: Vec<String> = tracker.list().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![keep]);
}

#[test]
fn removed_task_ignores_late_result() {
    let (_, tracker) = tracker();
    let completes = Arc::new(AtomicUsize::new(0));
    let c = completes.clone();
    let id = tracker.add_search(SearchDescriptor::new(TaskKind::ComponentSuggestion, "RTX 4070").on_complete(
        move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        },
    ));

    tracker.remove_search(&id);
    tracker.complete_search(&id, json!({}));
    assert_eq!(completes.load(Ordering::SeqCst), 0);
    assert!(tracker.get_search_by_id(&id).is_none());
}

#[test]
fn callback_may_reenter_tracker() {
    let (_, tracker) = tracker();
    let inner = tracker.clone();
    let id = tracker.add_search(SearchDescriptor::new(TaskKind::QuickSearch, "first").on_complete(move |_| {
        inner.add_search(SearchDescriptor::new(TaskKind::QuickSearch, "follow-up"));
    }));

    tracker.complete_search(&id, json!({}));
    assert_eq!(tracker.list().len(), 2);
    assert_eq!(tracker.pending_count(), 1);
}

#[test]
fn list_keeps_insertion_order() {
    let (_, tracker) = tracker();
    for title in ["a", "b", "c"] {
        tracker.add_search(SearchDescriptor::new(TaskKind::QuickSearch, title));
    }
    let titles: Vec<String> = tracker.list().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["a", "b", "c"]);
}

#[test]
fn empty_subtitle_is_dropped() {
    let descriptor = SearchDescriptor::new(TaskKind::AdvancedConfig, "Advanced").subtitle("");
    assert!(descriptor.subtitle.is_none());
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn registry_survives_reload_without_callbacks() {
    let (store, tracker) = tracker();
    let done = tracker.add_search(SearchDescriptor::new(TaskKind::QuickSearch, "done"));
    let open = tracker.add_search(SearchDescriptor::new(TaskKind::GameSuggestion, "open"));
    tracker.complete_search(&done, json!({ "items": 3 }));

    let restored = SearchTracker::load(store);
    let tasks = restored.list();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].result(), Some(&json!({ "items": 3 })));
    assert!(tasks[1].is_pending());

    restored.error_search(&open, TaskError::new("E_X", "gave up"));
    assert!(restored.get_search_by_id(&open).unwrap().error().is_some());
}

#[test]
fn persisted_state_is_tagged() {
    let (store, tracker) = tracker();
    let id = tracker.add_search(SearchDescriptor::new(TaskKind::AdvancedConfig, "Advanced"));
    tracker.error_search(&id, TaskError::new("E_API_RESPONSE", "status 500"));

    let raw: Value = serde_json::from_str(&store.get(STORAGE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(raw[0]["kind"], "advanced-config");
    assert_eq!(raw[0]["state"]["status"], "errored");
    assert_eq!(raw[0]["state"]["error"]["code"], "E_API_RESPONSE");
    assert!(raw[0].get("onComplete").is_none());
}

#[test]
fn corrupt_registry_loads_empty() {
    let store = Arc::new(MemoryStore::new());
    store.set(STORAGE_KEY, "{not json").unwrap();
    assert!(SearchTracker::load(store).list().is_empty());
}

// =============================================================================
// Events and cancellation
// =============================================================================

#[tokio::test]
async fn subscribers_see_every_transition() {
    let (_, tracker) = tracker();
    let mut rx = tracker.subscribe();

    let id = tracker.add_search(SearchDescriptor::new(TaskKind::QuickSearch, "RTX 4060"));
    tracker.complete_search(&id, json!([]));
    tracker.remove_search(&id);

    assert!(matches!(rx.recv().await.unwrap(), TrackerEvent::Added(t) if t.id == id));
    assert!(matches!(rx.recv().await.unwrap(), TrackerEvent::Completed(t) if t.result() == Some(&json!([]))));
    assert_eq!(rx.recv().await.unwrap(), TrackerEvent::Removed(id));
}

#[tokio::test]
async fn remove_aborts_attached_operation() {
    let (_, tracker) = tracker();
    let id = tracker.add_search(SearchDescriptor::new(TaskKind::GameSuggestion, "slow"));
    let handle = tokio::spawn(async {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    });
    assert!(tracker.attach_abort(&id, handle.abort_handle()));

    tracker.remove_search(&id);
    let joined = handle.await;
    assert!(joined.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn attach_to_removed_task_aborts_immediately() {
    let (_, tracker) = tracker();
    let handle = tokio::spawn(async {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    });
    assert!(!tracker.attach_abort("missing", handle.abort_handle()));
    assert!(handle.await.unwrap_err().is_cancelled());
}

// =============================================================================
// elapsed_label
// =============================================================================

#[test]
fn elapsed_label_formats() {
    assert_eq!(elapsed_label(0, 999), "0s");
    assert_eq!(elapsed_label(0, 42_000), "42s");
    assert_eq!(elapsed_label(0, 60_000), "1m 0s");
    assert_eq!(elapsed_label(1_000, 186_500), "3m 5s");
    assert_eq!(elapsed_label(5_000, 1_000), "0s");
}
