//! Live capture transport: device callback to graph via a lock-free ring

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use rubato::{FftFixedIn, Resampler};

use crate::error::GraphError;

/// Ring capacity in mono samples (~1.3s at 48kHz)
pub const CAPTURE_RING_CAPACITY: usize = 65536;

/// Producer half, owned by the capture device callback
pub type CaptureProducer = HeapProd<f32>;

/// Create a capture ring and the reader the graph consumes it through
pub fn capture_ring(capacity: usize) -> (CaptureProducer, CaptureReader) {
    let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
    (producer, CaptureReader::new(consumer))
}

/// Input frames per resampler chunk
const RESAMPLE_CHUNK: usize = 1024;

/// Device side of a live capture
///
/// Pushes mono samples into the ring, converting from the device rate to the
/// context rate when the two differ. All buffers are allocated up front.
pub struct CaptureWriter {
    producer: CaptureProducer,
    converter: Option<RateConverter>,
}

struct RateConverter {
    resampler: FftFixedIn<f32>,
    pending: Vec<f32>,
    output: Vec<Vec<f32>>,
}

impl CaptureWriter {
    pub fn new(producer: CaptureProducer, device_rate: u32, context_rate: u32) -> Result<Self, GraphError> {
        if device_rate == 0 || context_rate == 0 {
            return Err(GraphError::Device("invalid capture sample rate".to_string()));
        }

        let converter = if device_rate == context_rate {
            None
        } else {
            let resampler = FftFixedIn::<f32>::new(
                device_rate as usize,
                context_rate as usize,
                RESAMPLE_CHUNK,
                2,
                1,
            )
            .map_err(|e| GraphError::Device(format!("Failed to create capture resampler: {}", e)))?;
            let output = vec![vec![0.0; resampler.output_frames_max()]];
            tracing::info!(device_rate, context_rate, "resampling live capture");
            Some(RateConverter {
                resampler,
                pending: Vec::with_capacity(RESAMPLE_CHUNK),
                output,
            })
        };

        Ok(Self { producer, converter })
    }

    /// Queue one mono sample at the device rate
    ///
    /// A full ring means the reader is behind; samples are dropped rather
    /// than blocking the device callback.
    pub fn push(&mut self, sample: f32) {
        let Some(converter) = &mut self.converter else {
            let _ = self.producer.try_push(sample);
            return;
        };

        converter.pending.push(sample);
        if converter.pending.len() < RESAMPLE_CHUNK {
            return;
        }
        let result = converter.resampler.process_into_buffer(
            &[converter.pending.as_slice()],
            &mut converter.output[..],
            None,
        );
        converter.pending.clear();
        if let Ok((_, written)) = result {
            self.producer.push_slice(&converter.output[0][..written]);
        }
    }
}

/// Consumer half of a live capture, read by the graph's source node
pub struct CaptureReader {
    consumer: HeapCons<f32>,
    /// Pre-allocated mono scratch (avoids allocation in the audio callback)
    mono: Vec<f32>,
}

impl CaptureReader {
    const SCRATCH_FRAMES: usize = 4096;

    fn new(consumer: HeapCons<f32>) -> Self {
        Self {
            consumer,
            mono: vec![0.0; Self::SCRATCH_FRAMES],
        }
    }

    /// Fill a stereo interleaved block from captured mono samples
    ///
    /// Underruns are padded with silence. A backlog of more than four blocks
    /// is dropped down to two so the display tracks the live signal.
    pub fn read_stereo(&mut self, out: &mut [f32]) {
        let frames = out.len() / 2;
        let backlog = self.consumer.occupied_len();
        if backlog > frames * 4 {
            self.consumer.skip(backlog - frames * 2);
        }

        for chunk in out.chunks_mut(Self::SCRATCH_FRAMES * 2) {
            let wanted = chunk.len() / 2;
            let got = self.consumer.pop_slice(&mut self.mono[..wanted]);
            for (frame, &s) in chunk.chunks_exact_mut(2).zip(self.mono[..got].iter()) {
                frame[0] = s;
                frame[1] = s;
            }
            chunk[got * 2..].fill(0.0);
        }
    }

    /// Samples waiting to be read
    pub fn buffered(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// Drop everything captured so far
    pub fn discard(&mut self) {
        let backlog = self.consumer.occupied_len();
        self.consumer.skip(backlog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::Producer;

    #[test]
    fn test_mono_duplicated_to_stereo() {
        let (mut producer, mut reader) = capture_ring(64);
        producer.push_slice(&[0.1, 0.2, 0.3]);

        let mut out = [9.0f32; 8];
        reader.read_stereo(&mut out);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2, 0.3, 0.3, 0.0, 0.0]);
    }

    #[test]
    fn test_backlog_trimmed() {
        let (mut producer, mut reader) = capture_ring(1024);
        let burst: Vec<f32> = (0..100).map(|i| i as f32).collect();
        producer.push_slice(&burst);

        // 4 frames per block: backlog of 100 is cut to 8, then 4 are read
        let mut out = [0.0f32; 8];
        reader.read_stereo(&mut out);
        assert_eq!(out[0], 92.0);
        assert_eq!(out[6], 95.0);
    }

    #[test]
    fn test_writer_passes_through_at_same_rate() {
        let (producer, reader) = capture_ring(64);
        let mut writer = CaptureWriter::new(producer, 48000, 48000).unwrap();
        for i in 0..10 {
            writer.push(i as f32);
        }
        assert_eq!(reader.buffered(), 10);
    }

    #[test]
    fn test_writer_converts_device_rate() {
        let (producer, reader) = capture_ring(CAPTURE_RING_CAPACITY);
        let mut writer = CaptureWriter::new(producer, 44100, 48000).unwrap();

        // One second at 44.1k arrives as roughly one second at 48k; the
        // trailing partial chunk is still pending
        for i in 0..44100 {
            writer.push((i as f32 * 0.05).sin() * 0.5);
        }
        let buffered = reader.buffered();
        assert!((46_000..=48_600).contains(&buffered), "{}", buffered);
    }

    #[test]
    fn test_writer_rejects_zero_rate() {
        let (producer, _reader) = capture_ring(64);
        assert!(CaptureWriter::new(producer, 0, 48000).is_err());
    }

    #[test]
    fn test_discard() {
        let (mut producer, mut reader) = capture_ring(64);
        producer.push_slice(&[0.5; 10]);
        reader.discard();

        let mut out = [1.0f32; 4];
        reader.read_stereo(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
