use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{bars, config::RenderConfig, radial, render::RenderSurface, session::PlaybackSession};

/// Identifier of one outstanding frame-callback request.
pub type FrameRequestId = u64;

/// Host-supplied frame-timing primitive.
///
/// Implementations hand out one callback slot per display refresh, the way a
/// browser's `requestAnimationFrame` does; the engine never owns a wall-clock
/// timer. A request stays pending until the host fires it (by passing its id
/// back to [`RenderScheduler::on_frame`]) or the scheduler cancels it.
pub trait FrameTiming {
    fn request_frame(&mut self) -> FrameRequestId;
    fn cancel_frame(&mut self, id: FrameRequestId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Drives the per-frame render loop.
///
/// Owns the frame-request lifecycle exclusively: at most one request is
/// outstanding while running, and stopping revokes it before it can fire, so
/// the surface is never mutated after `stop` returns. Each fired frame
/// samples the session once and hands the same snapshot to the bar renderer
/// and the circular renderer.
pub struct RenderScheduler {
    timing: Box<dyn FrameTiming>,
    state: SchedulerState,
    pending: Option<FrameRequestId>,
    render: RenderConfig,
}

impl RenderScheduler {
    pub fn new(timing: Box<dyn FrameTiming>, render: RenderConfig) -> Self {
        Self {
            timing,
            state: SchedulerState::Stopped,
            pending: None,
            render,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Enters the running state and arms the first frame request. Calling
    /// this while already running is a no-op; a second callback chain is
    /// never created.
    pub fn start(&mut self) {
        if self.state == SchedulerState::Running {
            tracing::debug!("render loop already running");
            return;
        }
        self.state = SchedulerState::Running;
        self.pending = Some(self.timing.request_frame());
        tracing::debug!("render loop started");
    }

    /// Leaves the running state, revoking the pending frame request before
    /// it can fire. Idempotent; safe without a prior start.
    pub fn stop(&mut self) {
        if let Some(id) = self.pending.take() {
            self.timing.cancel_frame(id);
        }
        if self.state == SchedulerState::Running {
            tracing::debug!("render loop stopped");
        }
        self.state = SchedulerState::Stopped;
    }

    /// Runs one animation frame and re-arms for the next.
    ///
    /// `id` must match the outstanding request; callbacks that were cancelled
    /// or superseded are ignored, which is what guarantees zero drawing after
    /// a stop even if the host delivers a revoked callback late.
    pub fn on_frame(
        &mut self,
        id: FrameRequestId,
        session: &mut PlaybackSession,
        surface: &mut RenderSurface,
    ) {
        if self.state != SchedulerState::Running || self.pending != Some(id) {
            tracing::trace!(id, "ignoring stale frame callback");
            return;
        }
        self.pending = None;

        let snapshot = session.sample();
        surface.begin_frame(self.render.background);
        surface.extend(bars::render(
            &snapshot,
            surface.width() as f32,
            surface.height() as f32,
        ));
        surface.extend(radial::render(
            &snapshot,
            surface.center(),
            self.render.base_radius,
        ));

        self.pending = Some(self.timing.request_frame());
    }
}

impl fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("state", &self.state)
            .field("pending", &self.pending)
            .finish()
    }
}

/// Deterministic [`FrameTiming`] for hosts that pump frames themselves,
/// e.g. the CLI demo. Requested frames queue up in order and are handed back
/// one at a time through [`ManualFrameTiming::next_due`].
#[derive(Debug, Clone, Default)]
pub struct ManualFrameTiming {
    shared: Arc<Mutex<ManualTimingState>>,
}

#[derive(Debug, Default)]
struct ManualTimingState {
    next_id: FrameRequestId,
    due: Vec<FrameRequestId>,
}

impl ManualFrameTiming {
    /// Pops the oldest request that is still due, if any.
    pub fn next_due(&self) -> Option<FrameRequestId> {
        let mut state = self.lock();
        if state.due.is_empty() {
            None
        } else {
            Some(state.due.remove(0))
        }
    }

    pub fn pending_count(&self) -> usize {
        self.lock().due.len()
    }

    fn lock(&self) -> MutexGuard<'_, ManualTimingState> {
        // Request bookkeeping stays valid even if a panicking test poisoned it.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameTiming for ManualFrameTiming {
    fn request_frame(&mut self) -> FrameRequestId {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.due.push(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        self.lock().due.retain(|&due| due != id);
    }
}
