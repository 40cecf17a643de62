// File: src/services/queue_store.rs
//
// Ordered playback state for one session: a FIFO queue plus a replaceable,
// size-capped playlist buffer. Both live under one lock so pops and
// replace-on-add are atomic with respect to each other.

use std::collections::VecDeque;

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use tracing::trace;

use jukebot_common::models::{PlayableItem, QueueSummary, ShuffleTarget, PLAYLIST_MAX_SIZE};

/// Which container an item was popped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Queue,
    Playlist,
}

#[derive(Default)]
struct Containers {
    queue: VecDeque<PlayableItem>,
    playlist: VecDeque<PlayableItem>,
}

#[derive(Default)]
pub struct QueueStore {
    inner: Mutex<Containers>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the main queue. `None` is a no-op that returns false.
    pub fn add(&self, item: Option<PlayableItem>) -> bool {
        match item {
            Some(item) => {
                self.inner.lock().queue.push_back(item);
                true
            }
            None => false,
        }
    }

    /// Replaces the playlist buffer with the first `PLAYLIST_MAX_SIZE` items.
    pub fn add_playlist(&self, items: Vec<PlayableItem>) {
        let buffer: VecDeque<PlayableItem> = items.into_iter().take(PLAYLIST_MAX_SIZE).collect();
        trace!("(QueueStore) playlist buffer replaced with {} item(s)", buffer.len());
        self.inner.lock().playlist = buffer;
    }

    pub fn shift(&self) -> Option<PlayableItem> {
        self.inner.lock().queue.pop_front()
    }

    pub fn shift_playlist(&self) -> Option<PlayableItem> {
        self.inner.lock().playlist.pop_front()
    }

    /// Picks what plays next. Anything in the main queue wins and throws
    /// away a pending playlist; the playlist is only drained once the
    /// queue is empty.
    pub fn pop_next(&self) -> Option<PlayableItem> {
        self.pop_next_with_origin().map(|(item, _)| item)
    }

    /// [`pop_next`](Self::pop_next), also reporting where the item came from.
    pub fn pop_next_with_origin(&self) -> Option<(PlayableItem, Origin)> {
        let mut inner = self.inner.lock();
        if !inner.queue.is_empty() || inner.playlist.is_empty() {
            inner.playlist.clear();
            inner.queue.pop_front().map(|item| (item, Origin::Queue))
        } else {
            inner.playlist.pop_front().map(|item| (item, Origin::Playlist))
        }
    }

    /// Puts a popped item back at the head of its container.
    pub fn restore(&self, item: PlayableItem, origin: Origin) {
        let mut inner = self.inner.lock();
        match origin {
            Origin::Queue => inner.queue.push_front(item),
            Origin::Playlist => inner.playlist.push_front(item),
        }
    }

    pub fn clear(&self) {
        self.inner.lock().queue.clear();
    }

    pub fn clear_playlist(&self) {
        self.inner.lock().playlist.clear();
    }

    pub fn clear_all(&self) {
        let mut inner = self.inner.lock();
        inner.queue.clear();
        inner.playlist.clear();
    }

    /// Shuffles the playlist buffer if it has items, else the main queue.
    pub fn shuffle(&self) -> ShuffleTarget {
        let mut rng = rand::rng();
        let mut inner = self.inner.lock();
        if !inner.playlist.is_empty() {
            inner.playlist.make_contiguous().shuffle(&mut rng);
            ShuffleTarget::Playlist
        } else if !inner.queue.is_empty() {
            inner.queue.make_contiguous().shuffle(&mut rng);
            ShuffleTarget::Queue
        } else {
            ShuffleTarget::Nothing
        }
    }

    pub fn size(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn playlist_size(&self) -> usize {
        self.inner.lock().playlist.len()
    }

    pub fn has_playlist(&self) -> bool {
        !self.inner.lock().playlist.is_empty()
    }

    /// Both sizes read under the same lock.
    pub fn snapshot_summary(&self) -> QueueSummary {
        let inner = self.inner.lock();
        QueueSummary {
            queue_size: inner.queue.len(),
            playlist_size: inner.playlist.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukebot_common::models::TrackSource;
    use rand::Rng;
    use std::sync::Arc;

    fn item(name: &str) -> PlayableItem {
        PlayableItem::new(
            name,
            "artist",
            1_000,
            TrackSource {
                encoded: format!("enc-{name}"),
                identifier: name.into(),
                uri: None,
                source_name: "youtube".into(),
            },
        )
    }

    fn items(n: usize) -> Vec<PlayableItem> {
        (0..n).map(|i| item(&format!("p{i}"))).collect()
    }

    fn title(item: Option<PlayableItem>) -> Option<String> {
        item.map(|i| i.title().to_string())
    }

    #[test]
    fn test_fifo_order() {
        let store = QueueStore::new();
        assert!(store.add(Some(item("a"))));
        assert!(store.add(Some(item("b"))));
        assert_eq!(title(store.shift()).as_deref(), Some("a"));
        assert_eq!(title(store.shift()).as_deref(), Some("b"));
        assert_eq!(store.shift(), None);
    }

    #[test]
    fn test_add_none_is_noop() {
        let store = QueueStore::new();
        assert!(!store.add(None));
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_playlist_truncates_and_replaces() {
        let store = QueueStore::new();
        store.add_playlist(items(150));
        assert_eq!(store.playlist_size(), PLAYLIST_MAX_SIZE);

        store.add_playlist(vec![item("a"), item("b")]);
        store.add_playlist(vec![item("c")]);
        assert_eq!(store.playlist_size(), 1);
        assert_eq!(title(store.shift_playlist()).as_deref(), Some("c"));
    }

    #[test]
    fn test_empty_pops_are_repeatable() {
        let store = QueueStore::new();
        for _ in 0..3 {
            assert_eq!(store.shift(), None);
            assert_eq!(store.shift_playlist(), None);
            assert_eq!(store.pop_next(), None);
        }
    }

    #[test]
    fn test_queue_has_priority_over_playlist() {
        let store = QueueStore::new();
        store.add(Some(item("x")));
        store.add_playlist(vec![item("y"), item("z")]);

        assert_eq!(title(store.pop_next()).as_deref(), Some("x"));
        assert!(!store.has_playlist());
        assert_eq!(store.pop_next(), None);
    }

    #[test]
    fn test_restore_returns_item_to_its_container() {
        let store = QueueStore::new();
        store.add(Some(item("a")));
        store.add(Some(item("b")));

        let (popped, origin) = store.pop_next_with_origin().unwrap();
        assert_eq!(origin, Origin::Queue);
        store.restore(popped, origin);
        assert_eq!(title(store.shift()).as_deref(), Some("a"));

        store.add_playlist(vec![item("y"), item("z")]);
        store.clear();
        let (popped, origin) = store.pop_next_with_origin().unwrap();
        assert_eq!(origin, Origin::Playlist);
        store.restore(popped, origin);
        assert_eq!(store.playlist_size(), 2);
        assert_eq!(title(store.shift_playlist()).as_deref(), Some("y"));
    }

    #[test]
    fn test_playlist_drains_when_queue_empty() {
        let store = QueueStore::new();
        store.add_playlist(vec![item("y"), item("z")]);
        assert_eq!(title(store.pop_next()).as_deref(), Some("y"));
        assert_eq!(title(store.pop_next()).as_deref(), Some("z"));
        assert_eq!(store.pop_next(), None);
    }

    #[test]
    fn test_shuffle_prefers_playlist() {
        let store = QueueStore::new();
        assert_eq!(store.shuffle(), ShuffleTarget::Nothing);

        store.add(Some(item("a")));
        store.add(Some(item("b")));
        assert_eq!(store.shuffle(), ShuffleTarget::Queue);
        assert_eq!(store.size(), 2);

        store.add_playlist(items(10));
        assert_eq!(store.shuffle(), ShuffleTarget::Playlist);
        assert_eq!(store.playlist_size(), 10);
        assert_eq!(store.size(), 2);
    }

    #[test]
    fn test_clear_all_and_summary() {
        let store = QueueStore::new();
        store.add(Some(item("a")));
        store.add_playlist(items(3));
        assert_eq!(
            store.snapshot_summary(),
            QueueSummary { queue_size: 1, playlist_size: 3 }
        );
        store.clear_all();
        assert_eq!(store.snapshot_summary(), QueueSummary::default());
    }

    /// Random operation sequences keep the counters honest.
    #[test]
    fn test_sizes_track_random_operations() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let store = QueueStore::new();
            let (mut queued, mut buffered) = (0usize, 0usize);
            for _ in 0..200 {
                match rng.random_range(0..6) {
                    0 => {
                        store.add(Some(item("q")));
                        queued += 1;
                    }
                    1 => {
                        let n = rng.random_range(0..160);
                        store.add_playlist(items(n));
                        buffered = n.min(PLAYLIST_MAX_SIZE);
                    }
                    2 => {
                        if store.shift().is_some() {
                            queued -= 1;
                        }
                    }
                    3 => {
                        if store.shift_playlist().is_some() {
                            buffered -= 1;
                        }
                    }
                    4 => {
                        store.clear();
                        queued = 0;
                    }
                    _ => {
                        store.clear_playlist();
                        buffered = 0;
                    }
                }
                assert_eq!(store.size(), queued);
                assert_eq!(store.playlist_size(), buffered);
                assert!(store.playlist_size() <= PLAYLIST_MAX_SIZE);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pops_never_duplicate() {
        let store = Arc::new(QueueStore::new());
        for i in 0..500 {
            store.add(Some(item(&format!("i{i}"))));
        }

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut got = Vec::new();
                while let Some(item) = store.pop_next() {
                    got.push(item.title().to_string());
                }
                got
            }));
        }

        let mut all = Vec::new();
        for h in handles {
            all.extend(h.await.unwrap());
        }
        all.sort();
        let before = all.len();
        all.dedup();
        assert_eq!(before, 500);
        assert_eq!(all.len(), 500);
    }
}
