//! Frame scheduling: Idle / Running state machine over a host scheduler
//!
//! The loop itself never sleeps or spawns. The host owns the clock and calls
//! [`RenderLoop::on_frame`] when a requested frame comes due; the loop only
//! ever holds one pending request and cancels it synchronously on stop.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Identifies one requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Host-side source of display refresh callbacks
pub trait FrameScheduler {
    /// Ask for one callback at the next refresh
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraw a request; a cancelled handle must never be delivered
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
}

/// Drives sampling and drawing once per refresh while a source is active
pub struct RenderLoop<S: FrameScheduler> {
    scheduler: S,
    state: LoopState,
    pending: Option<FrameHandle>,
    ticks: u64,
}

impl<S: FrameScheduler> RenderLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            state: LoopState::Idle,
            pending: None,
            ticks: 0,
        }
    }

    /// Idle → Running; schedules the first frame
    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        self.state = LoopState::Running;
        self.pending = Some(self.scheduler.request_frame());
        tracing::debug!("render loop started");
    }

    /// Running → Idle; the pending frame is cancelled before returning
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        if self.state == LoopState::Running {
            tracing::debug!(ticks = self.ticks, "render loop stopped");
        }
        self.state = LoopState::Idle;
    }

    /// Deliver a due frame
    ///
    /// Returns true when the caller should sample and draw now. The next frame
    /// is already requested when this returns true.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        if self.state != LoopState::Running || self.pending != Some(handle) {
            return false;
        }
        self.ticks += 1;
        self.pending = Some(self.scheduler.request_frame());
        true
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Outstanding frame request, if any
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Frames drawn since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

/// Scheduler whose frames fire only when the owner says so
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    queue: VecDeque<FrameHandle>,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest outstanding request
    pub fn fire(&mut self) -> Option<FrameHandle> {
        self.queue.pop_front()
    }

    /// Number of outstanding requests
    pub fn outstanding(&self) -> usize {
        self.queue.len()
    }

    /// Number of requests withdrawn so far
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.queue.push_back(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.queue.len();
        self.queue.retain(|&h| h != handle);
        self.cancelled += before - self.queue.len();
    }
}

/// Fixed-rate scheduler for hosts without a refresh callback
#[derive(Debug)]
pub struct IntervalScheduler {
    interval: Duration,
    next_id: u64,
    pending: Option<(FrameHandle, Instant)>,
    last_fired: Option<Instant>,
}

impl IntervalScheduler {
    /// `frame_rate` is clamped to 1 - 240 fps
    pub fn new(frame_rate: u32) -> Self {
        let fps = frame_rate.clamp(1, 240);
        Self {
            interval: Duration::from_secs(1) / fps,
            next_id: 0,
            pending: None,
            last_fired: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The pending frame, if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<FrameHandle> {
        match self.pending {
            Some((handle, due)) if now >= due => {
                self.pending = None;
                self.last_fired = Some(now);
                Some(handle)
            }
            _ => None,
        }
    }

    /// Time left until the pending frame is due (`None` when nothing is pending)
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .map(|(_, due)| due.saturating_duration_since(now))
    }
}

impl FrameScheduler for IntervalScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        let now = Instant::now();
        let due = match self.last_fired {
            Some(last) => (last + self.interval).max(now),
            None => now,
        };
        self.pending = Some((handle, due));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if matches!(self.pending, Some((h, _)) if h == handle) {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_to_running_and_back() {
        let mut render_loop = RenderLoop::new(ManualScheduler::new());
        assert_eq!(render_loop.state(), LoopState::Idle);

        render_loop.start();
        assert!(render_loop.is_running());
        assert_eq!(render_loop.scheduler().outstanding(), 1);

        render_loop.stop();
        assert_eq!(render_loop.state(), LoopState::Idle);
        assert_eq!(render_loop.scheduler().outstanding(), 0);
        assert_eq!(render_loop.scheduler().cancelled(), 1);
    }

    #[test]
    fn test_each_tick_reschedules_once() {
        let mut render_loop = RenderLoop::new(ManualScheduler::new());
        render_loop.start();
        for _ in 0..10 {
            let handle = render_loop.scheduler_mut().fire().unwrap();
            assert!(render_loop.on_frame(handle));
            assert_eq!(render_loop.scheduler().outstanding(), 1);
        }
        assert_eq!(render_loop.ticks(), 10);
    }

    #[test]
    fn test_stale_handle_after_stop_is_ignored() {
        let mut render_loop = RenderLoop::new(ManualScheduler::new());
        render_loop.start();
        let handle = render_loop.pending().unwrap();
        render_loop.stop();
        assert!(!render_loop.on_frame(handle));
        assert_eq!(render_loop.ticks(), 0);
    }

    #[test]
    fn test_double_start_keeps_one_request() {
        let mut render_loop = RenderLoop::new(ManualScheduler::new());
        render_loop.start();
        render_loop.start();
        assert_eq!(render_loop.scheduler().outstanding(), 1);
    }

    #[test]
    fn test_interval_scheduler_paces_frames() {
        let mut scheduler = IntervalScheduler::new(50);
        assert_eq!(scheduler.interval(), Duration::from_millis(20));

        let first = scheduler.request_frame();
        let now = Instant::now();
        assert_eq!(scheduler.poll(now), Some(first));

        scheduler.request_frame();
        assert_eq!(scheduler.poll(now), None);
        assert!(scheduler.time_until_due(now).unwrap() > Duration::ZERO);
        assert!(scheduler.poll(now + Duration::from_millis(25)).is_some());
    }

    #[test]
    fn test_interval_cancel() {
        let mut scheduler = IntervalScheduler::new(60);
        let handle = scheduler.request_frame();
        scheduler.cancel_frame(handle);
        assert!(scheduler.poll(Instant::now() + Duration::from_secs(1)).is_none());
        assert!(scheduler.time_until_due(Instant::now()).is_none());
    }
}
