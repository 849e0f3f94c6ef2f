//! Application state and per-session actors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::gauge;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use explorer::{
    ControllerState, PassReport, ReactiveController, SessionContext, SurfaceSnapshot, UiEvent,
};
use wms_common::{WmsError, WmsResult};

/// Queued commands per session before senders wait.
const SESSION_QUEUE_DEPTH: usize = 32;

/// Fastest the idle sweeper will run.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Shared application state.
pub struct AppState {
    pub controller: Arc<ReactiveController>,
    /// Sessions untouched for longer than this are evicted
    idle_timeout: Duration,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

struct SessionEntry {
    handle: SessionHandle,
    last_used: Instant,
}

impl AppState {
    pub fn new(controller: Arc<ReactiveController>, idle_timeout: Duration) -> Self {
        Self {
            controller,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Spawn a session and run its initial pass.
    pub async fn create_session(&self) -> WmsResult<EventOutcome> {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SESSION_QUEUE_DEPTH);
        tokio::spawn(run_session(id, self.controller.clone(), rx));

        let handle = SessionHandle { commands: tx };
        let outcome = handle.request(SessionCommand::Initialize).await?;

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id,
            SessionEntry {
                handle,
                last_used: Instant::now(),
            },
        );
        gauge!("explorer_sessions_active").set(sessions.len() as f64);
        info!(session = %id, "Created session");
        Ok(outcome)
    }

    /// Look up a session and mark it as used.
    pub async fn session(&self, id: &Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_used = Instant::now();
        Some(entry.handle.clone())
    }

    /// Drop a session; its actor exits once in-flight commands finish.
    pub async fn remove_session(&self, id: &Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id).is_some();
        gauge!("explorer_sessions_active").set(sessions.len() as f64);
        if removed {
            info!(session = %id, "Removed session");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every session idle for longer than the idle timeout.
    ///
    /// Returns the number evicted. A pass already in flight finishes; the
    /// actor exits once its last handle is gone.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = now.duration_since(entry.last_used) <= self.idle_timeout;
            if !keep {
                info!(session = %id, "Evicting idle session");
            }
            keep
        });
        let evicted = before - sessions.len();
        gauge!("explorer_sessions_active").set(sessions.len() as f64);
        evicted
    }

    /// Run [`AppState::evict_idle`] periodically until the state is dropped.
    pub fn spawn_idle_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let period = (self.idle_timeout / 2).max(MIN_SWEEP_INTERVAL);
        let state = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else {
                    break;
                };
                let evicted = state.evict_idle().await;
                if evicted > 0 {
                    debug!(evicted, "Idle sweep");
                }
            }
        })
    }
}

/// Serializable view of one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub state: ControllerState,
    pub passes: u64,
    pub snapshot: SurfaceSnapshot,
}

/// Result of a pass together with the session state after it.
#[derive(Debug)]
pub struct EventOutcome {
    pub result: WmsResult<PassReport>,
    pub view: SessionView,
}

enum SessionCommand {
    Initialize(oneshot::Sender<EventOutcome>),
    Event(UiEvent, oneshot::Sender<EventOutcome>),
    View(oneshot::Sender<SessionView>),
}

/// Sending side of a session actor.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Queue `event` and wait for its pass to finish.
    pub async fn dispatch(&self, event: UiEvent) -> WmsResult<EventOutcome> {
        self.request(|reply| SessionCommand::Event(event, reply)).await
    }

    pub async fn view(&self) -> WmsResult<SessionView> {
        self.request(SessionCommand::View).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> WmsResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| session_closed())?;
        reply_rx.await.map_err(|_| session_closed())
    }
}

fn session_closed() -> WmsError {
    WmsError::InternalError("Session actor has stopped".to_string())
}

/// Owns one session's context and surface; handles commands one at a time.
async fn run_session(
    id: Uuid,
    controller: Arc<ReactiveController>,
    mut commands: mpsc::Receiver<SessionCommand>,
) {
    let mut ctx = SessionContext::new(id.to_string());
    let mut surface = SurfaceSnapshot::default();

    while let Some(command) = commands.recv().await {
        match command {
            SessionCommand::Initialize(reply) => {
                let result = controller.initialize(&mut ctx, &mut surface).await;
                let _ = reply.send(EventOutcome {
                    result,
                    view: view(id, &ctx, &surface),
                });
            }
            SessionCommand::Event(event, reply) => {
                let result = controller.handle(&mut ctx, event, &mut surface).await;
                let _ = reply.send(EventOutcome {
                    result,
                    view: view(id, &ctx, &surface),
                });
            }
            SessionCommand::View(reply) => {
                let _ = reply.send(view(id, &ctx, &surface));
            }
        }
    }

    debug!(session = %id, passes = ctx.passes, "Session actor stopped");
}

fn view(id: Uuid, ctx: &SessionContext, surface: &SurfaceSnapshot) -> SessionView {
    SessionView {
        session_id: id,
        state: ctx.state,
        passes: ctx.passes,
        snapshot: surface.clone(),
    }
}
