// File: src/services/scheduler.rs
//
// Per-session playback state machine. Idle when the node has no current
// item, Playing otherwise. Commands and track-end events both funnel into
// `play_next`, which reads from the QueueStore and hands the item to the
// node.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use jukebot_common::models::{
    ChannelTarget, Notification, PlayableItem, QueueSummary, SessionKey, ShuffleTarget,
    TrackEndReason,
};

use crate::config::PLAYLIST_URL_MARKERS;
use crate::platforms::lavalink::NodeRegistry;
use crate::platforms::{AudioNode, NotificationSink};
use crate::services::queue_store::QueueStore;
use crate::services::resolver::ResolutionPipeline;
use crate::{Error, ResolutionError};

/// What `play()` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    AlreadyPlaying,
    Started(PlayableItem),
    NothingToPlay,
}

/// Whether `url` looks like a playlist or album link.
pub fn is_playlist_url(url: &str) -> bool {
    PLAYLIST_URL_MARKERS.iter().any(|m| url.contains(m))
}

pub struct PlaybackScheduler {
    session: SessionKey,
    store: QueueStore,
    pipeline: Arc<ResolutionPipeline>,
    nodes: Arc<NodeRegistry>,
    sink: Arc<dyn NotificationSink>,
    target: RwLock<Option<ChannelTarget>>,
}

impl PlaybackScheduler {
    pub fn new(
        session: SessionKey,
        pipeline: Arc<ResolutionPipeline>,
        nodes: Arc<NodeRegistry>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            session,
            store: QueueStore::new(),
            pipeline,
            nodes,
            sink,
            target: RwLock::new(None),
        }
    }

    pub fn session(&self) -> SessionKey {
        self.session
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn notification_target(&self) -> Option<ChannelTarget> {
        *self.target.read()
    }

    pub fn summary(&self) -> QueueSummary {
        self.store.snapshot_summary()
    }

    fn node(&self) -> Arc<dyn AudioNode> {
        self.nodes.node_for(self.session)
    }

    /// Resolves `url` and queues the result. Returns the first resolved
    /// item for the caller's confirmation message.
    pub async fn enqueue(
        &self,
        channel: ChannelTarget,
        url: &str,
        block_playlists: bool,
    ) -> Result<PlayableItem, Error> {
        *self.target.write() = Some(channel);

        if url.trim().is_empty() {
            return Err(ResolutionError::InvalidUrl("Invalid url.".into()).into());
        }

        let as_playlist = !block_playlists && is_playlist_url(url);
        let items = self.pipeline.resolve(self.session, url, as_playlist).await?;
        let first = items.first().cloned().ok_or(ResolutionError::Empty)?;

        if as_playlist {
            info!(
                "(Scheduler) session {} queued playlist of {} item(s)",
                self.session,
                items.len()
            );
            self.store.add_playlist(items);
        } else {
            info!("(Scheduler) session {} queued '{}'", self.session, first.qualified_name());
            self.store.add(Some(first.clone()));
        }
        Ok(first)
    }

    pub async fn is_playing(&self) -> Result<bool, Error> {
        Ok(self.node().current_item(self.session).await?.is_some())
    }

    /// Starts the next item unless something is already playing.
    pub async fn play(&self) -> Result<PlayOutcome, Error> {
        if self.is_playing().await? {
            debug!("(Scheduler) session {} already playing", self.session);
            return Ok(PlayOutcome::AlreadyPlaying);
        }
        Ok(match self.play_next().await? {
            Some(item) => PlayOutcome::Started(item),
            None => PlayOutcome::NothingToPlay,
        })
    }

    /// Stops whatever plays and starts the next item, if any.
    pub async fn skip_current_song(&self) -> Result<Option<PlayableItem>, Error> {
        self.node().set_current_item(self.session, None).await?;
        self.play_next().await
    }

    pub fn shuffle(&self) -> ShuffleTarget {
        let target = self.store.shuffle();
        debug!("(Scheduler) session {} shuffled {:?}", self.session, target);
        target
    }

    /// Stops playback and forgets all queued state. Never fails; a stop
    /// error is only logged.
    pub async fn destroy(&self) {
        if let Err(e) = self.node().set_current_item(self.session, None).await {
            warn!(
                "(Scheduler) session {}: failed to stop current song: {}",
                self.session, e
            );
        }
        self.store.clear_all();
        *self.target.write() = None;
        info!("(Scheduler) session {} destroyed", self.session);
    }

    /// Reacts to the node finishing an item.
    pub async fn on_track_end(&self, reason: TrackEndReason) -> Result<(), Error> {
        // Load failures were already reported by the load path.
        if reason == TrackEndReason::LoadFailed || !reason.may_start_next() {
            debug!(
                "(Scheduler) session {} track ended ({}), not continuing",
                self.session, reason
            );
            return Ok(());
        }

        let next = self.play_next().await?;

        let Some(target) = self.notification_target() else {
            let msg = format!(
                "session {} has no notification target after track end",
                self.session
            );
            error!("(Scheduler) {}", msg);
            return Err(Error::InvariantViolation(msg));
        };

        let notification = match next {
            Some(item) => Notification::NowPlaying {
                item,
                summary: self.store.snapshot_summary(),
            },
            None => Notification::QueueEmpty,
        };
        self.sink.notify(target, notification).await
    }

    /// Pops per the queue-over-playlist rule and starts the item on the node.
    /// An item the node refuses goes back where it came from.
    async fn play_next(&self) -> Result<Option<PlayableItem>, Error> {
        let Some((item, origin)) = self.store.pop_next_with_origin() else {
            info!("(Scheduler) session {} queue empty", self.session);
            return Ok(None);
        };

        if let Err(e) = self
            .node()
            .set_current_item(self.session, Some(item.clone()))
            .await
        {
            warn!(
                "(Scheduler) session {}: node refused '{}', requeued: {}",
                self.session,
                item.qualified_name(),
                e
            );
            self.store.restore(item, origin);
            return Err(e);
        }

        info!(
            "(Scheduler) session {} now playing '{}'",
            self.session,
            item.qualified_name()
        );
        Ok(Some(item))
    }
}
