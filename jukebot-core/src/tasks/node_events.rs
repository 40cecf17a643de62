// jukebot-core/src/tasks/node_events.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use jukebot_common::models::{NodeEvent, SessionKey};

use crate::eventbus::NodeEventBus;
use crate::services::SessionManager;

/// Feeds audio-node events from the bus into the session manager until
/// the bus shuts down or every publisher is gone.
///
/// Each session gets its own worker, so events for one guild stay in order
/// while a slow guild never holds up another.
pub async fn spawn_node_event_dispatch(
    bus: Arc<NodeEventBus>,
    sessions: Arc<SessionManager>,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe(None).await;
    let mut shutdown_rx = bus.shutdown_rx.clone();

    tokio::spawn(async move {
        let mut lanes: HashMap<SessionKey, mpsc::UnboundedSender<NodeEvent>> = HashMap::new();

        loop {
            tokio::select! {
                maybe_event = rx.recv() => {
                    let Some(event) = maybe_event else { break };
                    match event.session() {
                        Some(session) => route(&mut lanes, &sessions, session, event),
                        None => handle(&sessions, event).await,
                    }
                }
                Ok(_) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        // Dropping the senders lets each worker drain and exit.
        lanes.clear();
        info!("(NodeEvents) dispatch loop stopped");
    })
}

fn route(
    lanes: &mut HashMap<SessionKey, mpsc::UnboundedSender<NodeEvent>>,
    sessions: &Arc<SessionManager>,
    session: SessionKey,
    event: NodeEvent,
) {
    let lane = lanes
        .entry(session)
        .or_insert_with(|| spawn_lane(session, sessions.clone()));
    if let Err(mpsc::error::SendError(event)) = lane.send(event) {
        warn!("(NodeEvents) worker for {} is gone, restarting it", session);
        let fresh = spawn_lane(session, sessions.clone());
        let _ = fresh.send(event);
        lanes.insert(session, fresh);
    }
}

fn spawn_lane(
    session: SessionKey,
    sessions: Arc<SessionManager>,
) -> mpsc::UnboundedSender<NodeEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    debug!("(NodeEvents) worker started for {}", session);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            handle(&sessions, event).await;
        }
    });
    tx
}

async fn handle(sessions: &SessionManager, event: NodeEvent) {
    if let Err(e) = sessions.handle_node_event(event).await {
        error!("(NodeEvents) event handling failed: {}", e);
    }
}
