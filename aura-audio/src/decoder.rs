//! Media decoding for file sources

use std::path::Path;
use std::sync::Arc;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey};
use symphonia::core::probe::Hint;

use crate::error::DecodeError;

/// A decoded file ready for playback
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved stereo samples at `sample_rate`
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: u32,
    pub title: String,
}

/// Decodes media files to stereo at the context rate
pub struct Decoder {
    target_sample_rate: u32,
}

impl Decoder {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Decode an audio file (mp3, flac, ogg, wav, aac)
    pub fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| DecodeError::Decode(e.to_string()))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoAudioTrack)?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        // Rate and channel count come from the decoded buffers; codec params may omit them
        let mut layout: Option<(u32, u16)> = None;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::Decode(e.to_string()))?;

        let title = track_title(&mut format, path);

        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(_) => break,
            };
            if packet.track_id() != track_id {
                continue;
            }
            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                // Corrupt packets are skipped, the rest of the file still plays
                Err(_) => continue,
            };

            let spec = *decoded.spec();
            if layout.is_none() {
                layout = Some((spec.rate, spec.channels.count() as u16));
            }
            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(sample_buf.samples());
        }

        let Some((source_rate, channels)) = layout.filter(|_| !samples.is_empty()) else {
            return Err(DecodeError::Decode("no audio frames decoded".to_string()));
        };

        tracing::debug!(
            path = %path.display(),
            source_rate,
            channels,
            "decoded media file"
        );
        self.prepare(&samples, source_rate, channels, title)
    }

    /// Convert interleaved samples of any layout to stereo at the target rate
    pub fn prepare(
        &self,
        samples: &[f32],
        sample_rate: u32,
        channels: u16,
        title: String,
    ) -> Result<DecodedAudio, DecodeError> {
        if channels == 0 || sample_rate == 0 {
            return Err(DecodeError::Decode("invalid stream layout".to_string()));
        }

        let stereo = to_stereo(samples, channels as usize);
        let stereo = if sample_rate != self.target_sample_rate {
            resample_stereo(&stereo, sample_rate, self.target_sample_rate)?
        } else {
            stereo
        };

        Ok(DecodedAudio {
            samples: Arc::new(stereo),
            sample_rate: self.target_sample_rate,
            title,
        })
    }
}

/// Mono is duplicated, extra channels beyond the first two are dropped
fn to_stereo(samples: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        2 => samples[..samples.len() - samples.len() % 2].to_vec(),
        1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        n => samples
            .chunks_exact(n)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

fn resample_stereo(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>, DecodeError> {
    use rubato::{FftFixedInOut, Resampler};

    let frames = samples.len() / 2;
    let mut resampler = FftFixedInOut::<f32>::new(source_rate as usize, target_rate as usize, 1024, 2)
        .map_err(|e| DecodeError::Decode(e.to_string()))?;

    let deinterleaved: [Vec<f32>; 2] = [
        samples.iter().step_by(2).copied().collect(),
        samples.iter().skip(1).step_by(2).copied().collect(),
    ];

    let chunk_size = resampler.input_frames_next();
    let mut output: [Vec<f32>; 2] = [Vec::new(), Vec::new()];
    let mut pos = 0;

    while pos < frames {
        let remaining = frames - pos;
        let padded: Vec<Vec<f32>> = deinterleaved
            .iter()
            .map(|ch| {
                let mut v = ch[pos..(pos + chunk_size).min(frames)].to_vec();
                v.resize(chunk_size, 0.0);
                v
            })
            .collect();
        let input_refs: Vec<&[f32]> = padded.iter().map(|v| v.as_slice()).collect();

        let resampled = resampler
            .process(&input_refs, None)
            .map_err(|e| DecodeError::Decode(e.to_string()))?;

        // The final partial chunk only contributes its proportional share
        let keep = if remaining < chunk_size {
            remaining * target_rate as usize / source_rate as usize
        } else {
            usize::MAX
        };
        for (out, data) in output.iter_mut().zip(resampled) {
            out.extend(&data[..keep.min(data.len())]);
        }
        pos += chunk_size;
    }

    let [left, right] = output;
    Ok(left.into_iter().zip(right).flat_map(|(l, r)| [l, r]).collect())
}

fn track_title(format: &mut Box<dyn FormatReader>, path: &Path) -> String {
    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string();

    if let Some(meta) = format.metadata().current() {
        if let Some(tag) = meta
            .tags()
            .iter()
            .find(|t| t.std_key == Some(StandardTagKey::TrackTitle))
        {
            title = tag.value.to_string();
        }
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_to_stereo() {
        assert_eq!(to_stereo(&[0.1, 0.2], 1), vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_surround_keeps_front_pair() {
        let six = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        assert_eq!(to_stereo(&six, 6), vec![1.0, 2.0, 7.0, 8.0]);
    }

    #[test]
    fn test_prepare_same_rate_passthrough() {
        let decoder = Decoder::new(48000);
        let audio = decoder
            .prepare(&[0.5; 96000], 48000, 2, "tone".to_string())
            .unwrap();
        assert_eq!(audio.samples.len(), 96000);
        assert_eq!(audio.title, "tone");
    }

    #[test]
    fn test_prepare_resamples() {
        let decoder = Decoder::new(48000);
        let audio = decoder
            .prepare(&vec![0.0; 44100], 44100, 1, "half".to_string())
            .unwrap();
        assert_eq!(audio.sample_rate, 48000);
        // One second of mono at 44.1k becomes roughly one second at 48k
        let seconds = (audio.samples.len() / 2) as f64 / 48000.0;
        assert!((seconds - 1.0).abs() < 0.05, "{}", seconds);
    }

    #[test]
    fn test_prepare_rejects_zero_channels() {
        let decoder = Decoder::new(48000);
        assert!(decoder.prepare(&[0.0; 4], 48000, 0, String::new()).is_err());
    }

    /// Minimal 16-bit PCM wav file
    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let data_len = (samples.len() * 2) as u32;
        let block_align = channels * 2;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_mono_file_keeps_its_length() {
        let path = std::env::temp_dir().join(format!("aura-mono-{}.wav", std::process::id()));
        let samples: Vec<i16> = (0..4800).map(|i| ((i % 100) * 100) as i16).collect();
        write_wav(&path, 48000, 1, &samples);

        let audio = Decoder::new(48000).decode(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        // 0.1s of mono becomes 0.1s of stereo, not 0.05s
        assert_eq!(audio.samples.len(), 9600);
        assert_eq!(audio.samples[200], audio.samples[201]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let decoder = Decoder::new(48000);
        let err = decoder.decode(Path::new("/nonexistent/track.mp3")).unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }
}
