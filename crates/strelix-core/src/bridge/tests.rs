use super::*;
use crate::storage::{KeyValueStorage, MemoryStorage};
use serde_json::json;
use strelix_models::MediaIdentity;

const KEY: &str = "vidLinkProgress";
const PLAYER: &str = "https://vidlink.pro";

fn setup() -> (Arc<MemoryStorage>, ProgressStore, SyncBridge) {
    let storage = Arc::new(MemoryStorage::new());
    let progress = ProgressStore::new(storage.clone(), KEY);
    let bridge = SyncBridge::new(
        progress.clone(),
        ContinueWatchingSelector::default(),
        &PlayerConfig::default(),
    );
    (storage, progress, bridge)
}

fn media_data() -> Value {
    json!({
        "type": "MEDIA_DATA",
        "data": {
            "movie-786892": {
                "id": 786892,
                "type": "movie",
                "title": "Furiosa",
                "poster_path": "/iADOJ8Zymht2JPMoy3R7xceZprc.jpg",
                "progress": { "watched": 1200.5, "duration": 8880.0 },
                "last_updated": 1718000000000i64
            },
            "tv-94997": {
                "id": 94997,
                "type": "tv",
                "title": "House of the Dragon",
                "poster_path": "/t9XkeE7HzOsdQcDDDapDYh8Rrmt.jpg",
                "backdrop_path": "/etj8E2o0Bud0HkONVQPjyCkIvpv.jpg",
                "progress": { "watched": 300, "duration": 3600 },
                "last_season_watched": "2",
                "last_episode_watched": "3",
                "show_progress": {
                    "s2e3": {
                        "season": "2",
                        "episode": "3",
                        "progress": { "watched": 300, "duration": 3600 }
                    }
                },
                "last_updated": 1718000500000i64
            }
        }
    })
}

fn rejection(outcome: MessageOutcome) -> MessageRejection {
    match outcome {
        MessageOutcome::Rejected(rejection) => rejection,
        other => panic!("expected a rejection, got {:?}", other),
    }
}

#[test]
fn test_trusted_message_is_ingested() {
    let (_, progress, bridge) = setup();
    bridge.attach();

    let outcome = bridge.handle_message(&InboundMessage::new(PLAYER, media_data()));
    assert!(matches!(outcome, MessageOutcome::Ingested { records: 2 }));

    let stored = progress.get_all();
    let show = stored.get(&MediaIdentity::series(94997)).unwrap();
    assert_eq!(show.last_season_watched, Some(2));
    assert_eq!(show.last_episode_watched, Some(3));
    assert_eq!(
        stored.get(&MediaIdentity::movie(786892)).unwrap().title,
        "Furiosa"
    );
}

#[test]
fn test_untrusted_origin_changes_nothing() {
    let (storage, progress, bridge) = setup();
    bridge.attach();

    let outcome = bridge.handle_message(&InboundMessage::new("https://evil.example", media_data()));
    assert_eq!(
        rejection(outcome),
        MessageRejection::UntrustedOrigin("https://evil.example".to_string())
    );
    assert!(progress.get_all().is_empty());
    assert_eq!(storage.get(KEY).unwrap(), None);
}

#[test]
fn test_origin_must_match_exactly() {
    let (_, progress, bridge) = setup();
    bridge.attach();

    for origin in ["https://vidlink.pro/", "http://vidlink.pro", "https://vidlink.pro.evil.example"] {
        let outcome = bridge.handle_message(&InboundMessage::new(origin, media_data()));
        assert!(matches!(rejection(outcome), MessageRejection::UntrustedOrigin(_)));
    }
    assert!(progress.get_all().is_empty());
}

#[test]
fn test_wrong_type_is_rejected() {
    let (_, progress, bridge) = setup();
    bridge.attach();

    let mut payload = media_data();
    payload["type"] = json!("PLAYER_EVENT");
    let outcome = bridge.handle_message(&InboundMessage::new(PLAYER, payload));
    assert_eq!(
        rejection(outcome),
        MessageRejection::UnexpectedType(Some("PLAYER_EVENT".to_string()))
    );

    let outcome = bridge.handle_message(&InboundMessage::new(PLAYER, json!("MEDIA_DATA")));
    assert_eq!(rejection(outcome), MessageRejection::UnexpectedType(None));
    assert!(progress.get_all().is_empty());
}

#[test]
fn test_non_object_data_is_rejected() {
    let (_, progress, bridge) = setup();
    bridge.attach();

    for data in [json!([1, 2]), json!("x"), json!(null)] {
        let payload = json!({ "type": "MEDIA_DATA", "data": data });
        let outcome = bridge.handle_message(&InboundMessage::new(PLAYER, payload));
        assert!(matches!(rejection(outcome), MessageRejection::MalformedPayload(_)));
    }

    let outcome = bridge.handle_message(&InboundMessage::new(PLAYER, json!({ "type": "MEDIA_DATA" })));
    assert!(matches!(rejection(outcome), MessageRejection::MalformedPayload(_)));
    assert!(progress.get_all().is_empty());
}

#[test]
fn test_malformed_entries_are_skipped() {
    let (_, progress, bridge) = setup();
    bridge.attach();

    let payload = json!({
        "type": "MEDIA_DATA",
        "data": {
            "movie-1": { "id": 1, "type": "movie", "title": "Kept", "progress": { "watched": 10, "duration": 100 } },
            "movie-2": { "type": "movie", "title": "No id" },
            "movie-3": "not a record"
        }
    });
    let outcome = bridge.handle_message(&InboundMessage::new(PLAYER, payload));
    assert!(matches!(outcome, MessageOutcome::Ingested { records: 1 }));
    assert!(progress.get_all().contains(&MediaIdentity::movie(1)));
}

#[test]
fn test_gaps_inside_a_record_keep_the_title() {
    let (_, progress, bridge) = setup();
    bridge.attach();

    let payload = json!({
        "type": "MEDIA_DATA",
        "data": {
            "tv-1399": {
                "id": 1399,
                "type": "tv",
                "title": "Game of Thrones",
                "progress": { "watched": 900, "duration": 3000 },
                "show_progress": {
                    "s1e1": { "episode": "1", "progress": { "watched": 900, "duration": 3000 } }
                }
            },
            "movie-550": {
                "id": 550,
                "type": "movie",
                "title": "Fight Club",
                "progress": { "watched": 40, "duration": null }
            }
        }
    });
    let outcome = bridge.handle_message(&InboundMessage::new(PLAYER, payload));
    assert!(matches!(outcome, MessageOutcome::Ingested { records: 2 }));

    let stored = progress.get_all();
    let show = stored.get(&MediaIdentity::series(1399)).unwrap();
    assert_eq!(
        show.episode_progress(strelix_models::EpisodeKey::new(1, 1))
            .unwrap()
            .progress
            .watched,
        900.0
    );
    assert_eq!(stored.get(&MediaIdentity::movie(550)).unwrap().progress.duration, 0.0);
}

#[test]
fn test_undecodable_snapshot_leaves_store_intact() {
    let (_, progress, bridge) = setup();
    bridge.attach();
    bridge.handle_message(&InboundMessage::new(PLAYER, media_data()));
    let before = progress.get_all();
    assert_eq!(before.len(), 2);

    let payload = json!({
        "type": "MEDIA_DATA",
        "data": {
            "movie-1": { "type": "movie", "title": "No id" },
            "movie-2": "not a record"
        }
    });
    let outcome = bridge.handle_message(&InboundMessage::new(PLAYER, payload));
    assert!(matches!(rejection(outcome), MessageRejection::MalformedPayload(_)));
    assert_eq!(progress.get_all(), before);

    // An empty state from the player is still stored as-is
    let empty = json!({ "type": "MEDIA_DATA", "data": {} });
    assert!(matches!(
        bridge.handle_message(&InboundMessage::new(PLAYER, empty)),
        MessageOutcome::Ingested { records: 0 }
    ));
    assert!(progress.get_all().is_empty());
}

#[test]
fn test_detached_bridge_ignores_messages() {
    let (_, progress, bridge) = setup();
    assert!(!bridge.is_listening());
    assert_eq!(
        rejection(bridge.handle_message(&InboundMessage::new(PLAYER, media_data()))),
        MessageRejection::Detached
    );

    bridge.attach();
    bridge.attach();
    assert!(bridge.is_listening());
    bridge.detach();
    assert!(!bridge.is_listening());

    assert_eq!(
        rejection(bridge.handle_message(&InboundMessage::new(PLAYER, media_data()))),
        MessageRejection::Detached
    );
    assert!(progress.get_all().is_empty());
}

#[test]
fn test_second_message_replaces_snapshot() {
    let (_, progress, bridge) = setup();
    bridge.attach();
    bridge.handle_message(&InboundMessage::new(PLAYER, media_data()));

    let payload = json!({
        "type": "MEDIA_DATA",
        "data": {
            "movie-9": { "id": 9, "type": "movie", "title": "Only", "progress": { "watched": 1, "duration": 2 } }
        }
    });
    assert!(bridge
        .handle_message(&InboundMessage::new(PLAYER, payload))
        .is_ingested());

    let stored = progress.get_all();
    assert_eq!(stored.len(), 1);
    assert!(stored.contains(&MediaIdentity::movie(9)));
}

#[test]
fn test_refresh_on_external_write_only() {
    let (storage, progress, bridge) = setup();
    let refreshes = Arc::new(Mutex::new(Vec::new()));
    let sink = refreshes.clone();
    bridge.on_refresh(move |items| {
        sink.lock()
            .unwrap()
            .push(items.iter().map(|item| item.identity).collect::<Vec<_>>());
    });
    bridge.attach();

    // Local writes (including the bridge's own ingest) do not trigger a refresh
    bridge.handle_message(&InboundMessage::new(PLAYER, media_data()));
    assert!(refreshes.lock().unwrap().is_empty());

    let snapshot = progress.get_all();
    storage.write_external(KEY, Some(&serde_json::to_string(&snapshot).unwrap()));
    assert_eq!(
        *refreshes.lock().unwrap(),
        vec![vec![MediaIdentity::series(94997), MediaIdentity::movie(786892)]]
    );

    bridge.detach();
    storage.write_external(KEY, None);
    assert_eq!(refreshes.lock().unwrap().len(), 1);
}

#[test]
fn test_drop_releases_subscription() {
    let (storage, progress, bridge) = setup();
    bridge.attach();
    assert_eq!(storage.notifier().listener_count(), 1);

    drop(bridge);
    assert_eq!(storage.notifier().listener_count(), 0);
    assert!(progress.get_all().is_empty());
}
