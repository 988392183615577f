//! Process-wide audio context abstraction
//!
//! The context owns the hardware stream and pulls stereo blocks from whatever
//! processor the signal graph installs. It is acquired once, then only ever
//! suspended and resumed; graphs come and go on top of it.

use parking_lot::Mutex;
use ringbuf::traits::Producer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capture::{capture_ring, CaptureProducer, CaptureReader, CAPTURE_RING_CAPACITY};
use crate::error::GraphError;

/// Run state of the hardware context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextState {
    #[default]
    Suspended,
    Running,
}

/// Something that renders stereo interleaved blocks for the context
pub trait Processor: Send {
    fn process(&mut self, out: &mut [f32]);
}

/// Processor shared between the control side and the audio callback
pub type SharedProcessor = Arc<Mutex<dyn Processor>>;

/// Slot the output callback pulls from
pub(crate) type ProcessorSlot = Arc<Mutex<Option<SharedProcessor>>>;

/// Render one block from the installed processor
///
/// Uses try_lock on both levels so the real-time thread never blocks; on
/// contention or with nothing installed the block is silence.
pub(crate) fn render_slot(slot: &ProcessorSlot, out: &mut [f32]) {
    let Some(guard) = slot.try_lock() else {
        out.fill(0.0);
        return;
    };
    match guard.as_ref().and_then(|p| p.try_lock()) {
        Some(mut processor) => processor.process(out),
        None => out.fill(0.0),
    };
}

/// Hardware audio context shared by successive signal graphs
pub trait AudioContext {
    /// Handle that keeps a live capture device open; dropping it releases the device
    type Capture;

    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    fn state(&self) -> ContextState;

    /// Start (or restart) pulling audio
    ///
    /// Must be triggered by a user action. May fail with
    /// [`GraphError::PlaybackBlocked`] when the platform refuses playback.
    fn resume(&mut self) -> Result<(), GraphError>;

    /// Stop pulling audio without releasing the context
    fn suspend(&mut self) -> Result<(), GraphError>;

    /// Install or remove the processor the output pulls from
    fn set_processor(&mut self, processor: Option<SharedProcessor>);

    /// Whether a processor is currently installed
    fn in_use(&self) -> bool;

    /// Open the default capture device
    ///
    /// May raise a platform permission prompt; must be started from a direct
    /// user action.
    fn open_capture(&mut self) -> Result<(Self::Capture, CaptureReader), GraphError>;
}

/// Capture permission behaviour of an [`OfflineContext`]
#[derive(Debug, Clone, Default)]
pub enum CapturePermission {
    #[default]
    Denied,
    /// Granted; the given mono signal is queued as captured input
    Granted(Vec<f32>),
}

/// Handle for an offline capture; releases the simulated device on drop
pub struct OfflineCapture {
    active: Arc<AtomicBool>,
}

impl Drop for OfflineCapture {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// In-process context that renders blocks on demand
///
/// Behaves like the hardware context (suspend/resume, processor slot, capture)
/// without a device, for tests and headless rendering.
pub struct OfflineContext {
    sample_rate: u32,
    state: ContextState,
    slot: ProcessorSlot,
    autoplay_allowed: bool,
    capture_permission: CapturePermission,
    capture_active: Arc<AtomicBool>,
    capture_producer: Option<CaptureProducer>,
    resume_count: usize,
}

impl OfflineContext {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: ContextState::Suspended,
            slot: Arc::new(Mutex::new(None)),
            autoplay_allowed: true,
            capture_permission: CapturePermission::Denied,
            capture_active: Arc::new(AtomicBool::new(false)),
            capture_producer: None,
            resume_count: 0,
        }
    }

    /// Whether `resume` succeeds (simulates the platform autoplay policy)
    pub fn set_autoplay_allowed(&mut self, allowed: bool) {
        self.autoplay_allowed = allowed;
    }

    pub fn set_capture_permission(&mut self, permission: CapturePermission) {
        self.capture_permission = permission;
    }

    /// Whether a capture device is currently held open
    pub fn capture_active(&self) -> bool {
        self.capture_active.load(Ordering::SeqCst)
    }

    /// Number of successful resumes
    pub fn resume_count(&self) -> usize {
        self.resume_count
    }

    /// Queue more mono input on the open capture
    pub fn feed_capture(&mut self, samples: &[f32]) -> usize {
        match self.capture_producer.as_mut() {
            Some(producer) if self.capture_active.load(Ordering::SeqCst) => {
                producer.push_slice(samples)
            }
            _ => 0,
        }
    }

    /// Render one stereo interleaved block; silence while suspended
    pub fn render_into(&mut self, out: &mut [f32]) {
        match self.state {
            ContextState::Running => render_slot(&self.slot, out),
            ContextState::Suspended => out.fill(0.0),
        }
    }

    /// Render `frames` stereo frames into a new buffer
    pub fn render_block(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * 2];
        self.render_into(&mut out);
        out
    }
}

impl AudioContext for OfflineContext {
    type Capture = OfflineCapture;

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<(), GraphError> {
        if !self.autoplay_allowed {
            return Err(GraphError::PlaybackBlocked);
        }
        if self.state == ContextState::Suspended {
            self.resume_count += 1;
        }
        self.state = ContextState::Running;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), GraphError> {
        self.state = ContextState::Suspended;
        Ok(())
    }

    fn set_processor(&mut self, processor: Option<SharedProcessor>) {
        *self.slot.lock() = processor;
    }

    fn in_use(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn open_capture(&mut self) -> Result<(OfflineCapture, CaptureReader), GraphError> {
        let CapturePermission::Granted(signal) = &self.capture_permission else {
            return Err(GraphError::PermissionDenied);
        };
        let (mut producer, reader) = capture_ring(CAPTURE_RING_CAPACITY);
        producer.push_slice(signal);
        self.capture_producer = Some(producer);
        self.capture_active.store(true, Ordering::SeqCst);
        Ok((
            OfflineCapture {
                active: self.capture_active.clone(),
            },
            reader,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f32);

    impl Processor for Constant {
        fn process(&mut self, out: &mut [f32]) {
            out.fill(self.0);
        }
    }

    #[test]
    fn test_suspended_renders_silence() {
        let mut ctx = OfflineContext::new(48000);
        ctx.set_processor(Some(Arc::new(Mutex::new(Constant(0.5)))));
        assert!(ctx.render_block(4).iter().all(|&s| s == 0.0));

        ctx.resume().unwrap();
        assert!(ctx.render_block(4).iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_empty_slot_renders_silence() {
        let mut ctx = OfflineContext::new(48000);
        ctx.resume().unwrap();
        assert!(!ctx.in_use());
        assert!(ctx.render_block(4).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_autoplay_block() {
        let mut ctx = OfflineContext::new(48000);
        ctx.set_autoplay_allowed(false);
        assert_eq!(ctx.resume(), Err(GraphError::PlaybackBlocked));
        assert_eq!(ctx.state(), ContextState::Suspended);

        ctx.set_autoplay_allowed(true);
        assert!(ctx.resume().is_ok());
        assert_eq!(ctx.resume_count(), 1);
    }

    #[test]
    fn test_capture_permission() {
        let mut ctx = OfflineContext::new(48000);
        assert!(matches!(ctx.open_capture(), Err(GraphError::PermissionDenied)));

        ctx.set_capture_permission(CapturePermission::Granted(vec![0.25; 8]));
        let (handle, _reader) = ctx.open_capture().unwrap();
        assert!(ctx.capture_active());
        assert_eq!(ctx.feed_capture(&[0.1; 4]), 4);

        drop(handle);
        assert!(!ctx.capture_active());
        assert_eq!(ctx.feed_capture(&[0.1; 4]), 0);
    }
}
