// File: jukebot-core/tests/scheduler_tests.rs

mod test_utils;

use jukebot_common::models::{
    ChannelTarget, LoadResult, Notification, SessionKey, TrackEndReason,
};
use jukebot_core::services::PlayOutcome;
use jukebot_core::Error;

use test_utils::helpers::*;

const SESSION: SessionKey = SessionKey(4242);
const CHANNEL: ChannelTarget = ChannelTarget(77);

#[tokio::test]
async fn test_enqueue_play_skip_flow() {
    let h = harness(vec![]).await;
    for name in ["a", "b"] {
        h.node.respond(
            &format!("https://example.com/{name}"),
            LoadResult::SingleItem(item(name)),
        );
    }
    let scheduler = h.sessions.scheduler(SESSION);

    scheduler.enqueue(CHANNEL, "https://example.com/a", true).await.unwrap();
    assert_eq!(scheduler.play().await.unwrap(), PlayOutcome::Started(item("a")));

    scheduler.enqueue(CHANNEL, "https://example.com/b", true).await.unwrap();
    assert_eq!(scheduler.play().await.unwrap(), PlayOutcome::AlreadyPlaying);
    assert_eq!(scheduler.summary().queue_size, 1);

    let next = scheduler.skip_current_song().await.unwrap();
    assert_eq!(next.map(|i| i.title().to_string()), Some("b".to_string()));
    assert_eq!(h.node.playing(SESSION).as_deref(), Some("b"));

    assert_eq!(scheduler.skip_current_song().await.unwrap(), None);
    assert!(!scheduler.is_playing().await.unwrap());
    assert_eq!(h.node.started(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_track_end_starts_next_and_notifies() {
    let h = harness(vec![]).await;
    h.node.respond("https://example.com/a", LoadResult::SingleItem(item("a")));
    h.node.respond("https://example.com/b", LoadResult::SingleItem(item("b")));
    let scheduler = h.sessions.scheduler(SESSION);

    scheduler.enqueue(CHANNEL, "https://example.com/a", true).await.unwrap();
    scheduler.play().await.unwrap();
    scheduler.enqueue(CHANNEL, "https://example.com/b", true).await.unwrap();

    scheduler.on_track_end(TrackEndReason::Finished).await.unwrap();
    scheduler.on_track_end(TrackEndReason::Finished).await.unwrap();

    let sent = h.sink.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, CHANNEL);
    assert!(matches!(&sent[0].1, Notification::NowPlaying { item, summary }
        if item.title() == "b" && summary.queue_size == 0));
    assert_eq!(sent[1], (CHANNEL, Notification::QueueEmpty));
}

#[tokio::test]
async fn test_track_end_without_target_is_invariant_violation() {
    let h = harness(vec![]).await;
    let scheduler = h.sessions.scheduler(SESSION);

    let err = scheduler.on_track_end(TrackEndReason::Finished).await.unwrap_err();
    assert!(matches!(err, Error::InvariantViolation(_)));
    assert!(h.sink.sent().is_empty());
}

#[tokio::test]
async fn test_track_end_reasons_that_do_not_continue() {
    let h = harness(vec![]).await;
    h.node.respond("https://example.com/a", LoadResult::SingleItem(item("a")));
    let scheduler = h.sessions.scheduler(SESSION);
    scheduler.enqueue(CHANNEL, "https://example.com/a", true).await.unwrap();

    for reason in [
        TrackEndReason::Stopped,
        TrackEndReason::Replaced,
        TrackEndReason::Cleanup,
        TrackEndReason::LoadFailed,
    ] {
        scheduler.on_track_end(reason).await.unwrap();
    }

    assert!(h.node.started().is_empty());
    assert_eq!(scheduler.summary().queue_size, 1);
    assert!(h.sink.sent().is_empty());
}

#[tokio::test]
async fn test_queued_song_discards_pending_playlist() {
    let h = harness(vec![]).await;
    let playlist_url = "https://www.youtube.com/playlist?list=PL1";
    h.node.respond(
        playlist_url,
        LoadResult::PlaylistItems {
            name: "mix".into(),
            items: vec![item("p1"), item("p2"), item("p3")],
            selected: None,
        },
    );
    h.node.respond("https://example.com/q", LoadResult::SingleItem(item("q")));
    let scheduler = h.sessions.scheduler(SESSION);

    scheduler.enqueue(CHANNEL, playlist_url, false).await.unwrap();
    assert_eq!(scheduler.summary().playlist_size, 3);
    assert_eq!(scheduler.play().await.unwrap(), PlayOutcome::Started(item("p1")));

    scheduler.enqueue(CHANNEL, "https://example.com/q", true).await.unwrap();
    scheduler.on_track_end(TrackEndReason::Finished).await.unwrap();

    assert_eq!(h.node.playing(SESSION).as_deref(), Some("q"));
    assert_eq!(scheduler.summary().playlist_size, 0);
}

#[tokio::test]
async fn test_play_command_only_takes_first_of_playlist() {
    let h = harness(vec![]).await;
    let playlist_url = "https://www.youtube.com/playlist?list=PL1";
    h.node.respond(
        playlist_url,
        LoadResult::PlaylistItems {
            name: "mix".into(),
            items: vec![item("p1"), item("p2")],
            selected: None,
        },
    );
    let scheduler = h.sessions.scheduler(SESSION);

    let first = scheduler.enqueue(CHANNEL, playlist_url, true).await.unwrap();
    assert_eq!(first.title(), "p1");
    assert_eq!(scheduler.summary().queue_size, 1);
    assert_eq!(scheduler.summary().playlist_size, 0);
}

#[tokio::test]
async fn test_remove_session_stops_and_forgets() {
    let h = harness(vec![]).await;
    h.node.respond("https://example.com/a", LoadResult::SingleItem(item("a")));
    let scheduler = h.sessions.scheduler(SESSION);
    scheduler.enqueue(CHANNEL, "https://example.com/a", true).await.unwrap();
    scheduler.play().await.unwrap();

    h.sessions.remove(SESSION).await;

    assert!(h.node.playing(SESSION).is_none());
    assert!(h.sessions.get(SESSION).is_none());
    assert!(h.sessions.active_sessions().is_empty());
    assert_eq!(scheduler.notification_target(), None);
}

#[tokio::test]
async fn test_play_command_takes_linked_entry_of_playlist() {
    let h = harness(vec![]).await;
    let url = "https://www.youtube.com/watch?v=p2&list=PL1";
    h.node.respond(
        url,
        LoadResult::PlaylistItems {
            name: "mix".into(),
            items: vec![item("p1"), item("p2"), item("p3")],
            selected: Some(1),
        },
    );
    let scheduler = h.sessions.scheduler(SESSION);

    let first = scheduler.enqueue(CHANNEL, url, true).await.unwrap();
    assert_eq!(first.title(), "p2");
    assert_eq!(scheduler.play().await.unwrap(), PlayOutcome::Started(item("p2")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_skip_racing_track_end_starts_each_item_once() {
    for _ in 0..50 {
        let h = harness(vec![]).await;
        for name in ["a", "b", "c", "d"] {
            h.node.respond(
                &format!("https://example.com/{name}"),
                LoadResult::SingleItem(item(name)),
            );
        }
        let scheduler = h.sessions.scheduler(SESSION);
        for name in ["a", "b", "c", "d"] {
            scheduler
                .enqueue(CHANNEL, &format!("https://example.com/{name}"), true)
                .await
                .unwrap();
        }
        scheduler.play().await.unwrap();

        let skipper = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.skip_current_song().await })
        };
        let ender = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.on_track_end(TrackEndReason::Finished).await })
        };
        skipper.await.unwrap().unwrap();
        ender.await.unwrap().unwrap();

        let mut started = h.node.started();
        assert_eq!(started.len(), 3);
        assert_eq!(started[0], "a");
        started.sort();
        started.dedup();
        assert_eq!(started, vec!["a", "b", "c"]);
        // The one left over is still queued.
        assert_eq!(scheduler.summary().queue_size, 1);
        assert_eq!(scheduler.store().shift().map(|i| i.title().to_string()), Some("d".to_string()));
    }
}
