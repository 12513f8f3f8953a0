//! End-to-end lobby loading: compose, persist, status, buffering job

mod helpers;

use helpers::*;
use std::sync::Arc;
use uuid::Uuid;
use vgmq_common::events::{EmptyReason, EventBus, LobbyStatus, VgmqEvent};
use vgmq_lobby::store::LobbyStore;
use vgmq_lobby::{
    CompositionSettings, Error, LoadOutcome, LobbyMusicLoader, SqliteCatalog, SqliteJobQueue,
    SqliteLobbyStore,
};

fn loader(db: &TestDb, events: Arc<EventBus>) -> LobbyMusicLoader {
    LobbyMusicLoader::new(
        Arc::new(SqliteCatalog::new(db.pool.clone())),
        Arc::new(SqliteLobbyStore::new(db.pool.clone())),
        Arc::new(SqliteJobQueue::new(db.pool.clone())),
        events,
        CompositionSettings::default(),
    )
    .with_seed(42)
}

async fn status(db: &TestDb, lobby_id: Uuid) -> LobbyStatus {
    SqliteLobbyStore::new(db.pool.clone())
        .load_lobby(lobby_id)
        .await
        .unwrap()
        .status
}

fn statuses(events: &[VgmqEvent]) -> Vec<LobbyStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            VgmqEvent::LobbyStatusChanged { status, .. } => Some(*status),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_successful_load_saves_and_starts_lobby() {
    let db = TestDb::new().await;
    let host = add_user(&db.pool, "host").await;
    let player = add_user(&db.pool, "player").await;
    let spectator = add_user(&db.pool, "spectator").await;
    add_owned_games(&db.pool, host, 3, 60.0, None).await;
    add_owned_games(&db.pool, player, 3, 60.0, None).await;
    let spectator_games = add_owned_games(&db.pool, spectator, 3, 60.0, None).await;

    let lobby_id = add_lobby(
        &db.pool,
        LobbyRow {
            code: "ZX81".to_string(),
            track_count: 4,
            ..Default::default()
        },
    )
    .await;
    join(&db.pool, lobby_id, host, "Host").await;
    join(&db.pool, lobby_id, player, "Player").await;
    join(&db.pool, lobby_id, spectator, "Spectator").await;

    let events = event_bus();
    let mut rx = events.subscribe();

    let outcome = loader(&db, Arc::clone(&events)).load(lobby_id).await.unwrap();

    let entries = match outcome {
        LoadOutcome::Playing(entries) => entries,
        other => panic!("expected Playing, got {:?}", other),
    };
    assert_eq!(entries.len(), 4);
    assert!(entries
        .iter()
        .all(|e| !spectator_games.contains(&e.track.game.id)));

    assert_eq!(status(&db, lobby_id).await, LobbyStatus::Playing);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM lobby_tracks").await, 4);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM lobby_track_hints").await, 12);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM lobby_track_answers").await, 4);

    let job_key: String = sqlx::query_scalar("SELECT job_key FROM jobs")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(job_key, "lobbyZX81bufferMusic1");

    let emitted = drain(&mut rx);
    assert_eq!(statuses(&emitted), vec![LobbyStatus::Loading, LobbyStatus::Playing]);
    assert!(emitted
        .iter()
        .any(|e| matches!(e, VgmqEvent::RoundComposed { entry_count: 4, .. })));
}

#[tokio::test]
async fn test_reload_replaces_round_and_keeps_single_job() {
    let db = TestDb::new().await;
    let host = add_user(&db.pool, "host").await;
    add_owned_games(&db.pool, host, 6, 60.0, None).await;
    let lobby_id = add_lobby(&db.pool, LobbyRow { track_count: 3, ..Default::default() }).await;
    join(&db.pool, lobby_id, host, "Host").await;

    let loader = loader(&db, event_bus());
    loader.load(lobby_id).await.unwrap();
    loader.load(lobby_id).await.unwrap();

    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM lobby_tracks").await, 3);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM lobby_track_hints").await, 9);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM jobs").await, 1);
}

#[tokio::test]
async fn test_empty_catalog_returns_lobby_to_waiting() {
    let db = TestDb::new().await;
    let host = add_user(&db.pool, "host").await;
    let game = add_game(&db.pool, "Disabled", false).await;
    own(&db.pool, game, host).await;
    add_track(&db.pool, game, 60.0, None).await;

    let lobby_id = add_lobby(&db.pool, LobbyRow::default()).await;
    join(&db.pool, lobby_id, host, "Host").await;

    let events = event_bus();
    let mut rx = events.subscribe();

    let outcome = loader(&db, Arc::clone(&events)).load(lobby_id).await.unwrap();

    assert!(matches!(outcome, LoadOutcome::Empty(EmptyReason::NoTracksFound)));
    assert_eq!(status(&db, lobby_id).await, LobbyStatus::Waiting);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM lobby_tracks").await, 0);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM jobs").await, 0);

    let emitted = drain(&mut rx);
    assert!(emitted.iter().any(|e| matches!(
        e,
        VgmqEvent::LobbyEmpty { reason: EmptyReason::NoTracksFound, .. }
    )));
    assert_eq!(statuses(&emitted), vec![LobbyStatus::Loading, LobbyStatus::Waiting]);
}

#[tokio::test]
async fn test_spectators_only_is_no_eligible_players() {
    let db = TestDb::new().await;
    let spectator = add_user(&db.pool, "spectator").await;
    add_owned_games(&db.pool, spectator, 5, 60.0, None).await;
    let lobby_id = add_lobby(&db.pool, LobbyRow::default()).await;
    join(&db.pool, lobby_id, spectator, "Spectator").await;

    let events = event_bus();
    let mut rx = events.subscribe();

    let result = loader(&db, Arc::clone(&events)).load(lobby_id).await;

    assert!(matches!(result, Err(Error::NoEligiblePlayers)));
    assert_eq!(status(&db, lobby_id).await, LobbyStatus::Waiting);
    assert!(drain(&mut rx).iter().any(|e| matches!(
        e,
        VgmqEvent::LobbyEmpty { reason: EmptyReason::NoPlayers, .. }
    )));
}

#[tokio::test]
async fn test_hint_pool_failure_saves_nothing() {
    let db = TestDb::new().await;
    let host = add_user(&db.pool, "host").await;
    add_owned_games(&db.pool, host, 2, 60.0, None).await;
    let lobby_id = add_lobby(&db.pool, LobbyRow { track_count: 2, ..Default::default() }).await;
    join(&db.pool, lobby_id, host, "Host").await;

    let events = event_bus();
    let mut rx = events.subscribe();

    let result = loader(&db, Arc::clone(&events)).load(lobby_id).await;

    assert!(matches!(result, Err(Error::InsufficientHintPool { .. })));
    assert_eq!(status(&db, lobby_id).await, LobbyStatus::Waiting);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM lobby_tracks").await, 0);
    assert_eq!(count(&db.pool, "SELECT COUNT(*) FROM jobs").await, 0);

    let emitted = drain(&mut rx);
    assert!(emitted
        .iter()
        .any(|e| matches!(e, VgmqEvent::CompositionFailed { .. })));
    assert_eq!(statuses(&emitted), vec![LobbyStatus::Loading, LobbyStatus::Waiting]);
}

#[tokio::test]
async fn test_unknown_lobby_is_not_found() {
    let db = TestDb::new().await;

    let result = loader(&db, event_bus()).load(Uuid::new_v4()).await;

    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_disconnected_players_are_ignored() {
    let db = TestDb::new().await;
    let host = add_user(&db.pool, "host").await;
    let gone = add_user(&db.pool, "gone").await;
    add_owned_games(&db.pool, host, 4, 60.0, None).await;
    let gone_games = add_owned_games(&db.pool, gone, 4, 60.0, None).await;

    let lobby_id = add_lobby(&db.pool, LobbyRow { track_count: 2, ..Default::default() }).await;
    join(&db.pool, lobby_id, host, "Host").await;
    join(&db.pool, lobby_id, gone, "Player").await;
    sqlx::query("UPDATE lobby_users SET disconnected = 1 WHERE user_id = ?")
        .bind(gone.to_string())
        .execute(&db.pool)
        .await
        .unwrap();

    let players = SqliteLobbyStore::new(db.pool.clone())
        .participants(lobby_id)
        .await
        .unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].id, host);

    match loader(&db, event_bus()).load(lobby_id).await.unwrap() {
        LoadOutcome::Playing(entries) => {
            assert!(entries.iter().all(|e| !gone_games.contains(&e.track.game.id)));
        }
        other => panic!("expected Playing, got {:?}", other),
    }
}
