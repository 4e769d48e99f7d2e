//! Sample-buffer helpers and playback shared by capture and announcements.

use crate::error::DebateError;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::time::Duration;
use tracing::warn;

/// Average interleaved frames down to a single channel.
pub fn downmix_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Linear-interpolation resampler. Adequate for speech audio.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let rate = from_rate as f32 / to_rate as f32;
    let new_len = (samples.len() as f32 / rate) as usize;
    let mut result = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_pos = i as f32 * rate;
        let src_idx = src_pos as usize;
        let frac = src_pos - src_idx as f32;

        if src_idx + 1 < samples.len() {
            // Linear interpolation between adjacent samples
            result.push(samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac);
        } else if src_idx < samples.len() {
            result.push(samples[src_idx]);
        }
    }

    result
}

/// Plays mono samples through the default output device, blocking until the
/// buffer has drained. Must run on a blocking-capable thread.
pub fn play_samples(samples: Vec<f32>, sample_rate: u32) -> Result<(), DebateError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| DebateError::Announcement("no output device available".to_string()))?;
    let supported = device
        .default_output_config()
        .map_err(|e| DebateError::Announcement(e.to_string()))?;

    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(DebateError::Announcement(format!(
            "unsupported output sample format: {:?}",
            supported.sample_format()
        )));
    }

    let device_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let config = supported.config();

    let resampled = resample_linear(&samples, sample_rate, device_rate);
    let total = resampled.len();
    // Generous upper bound on playback time; the done signal fires first.
    let max_wait = Duration::from_secs_f64(total as f64 / device_rate as f64 + 5.0);

    let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
    let mut position = 0usize;
    let mut signalled = false;

    let stream = device
        .build_output_stream(
            &config,
            move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in out.chunks_mut(channels) {
                    let value = if position < total {
                        let v = resampled[position];
                        position += 1;
                        v
                    } else {
                        0.0
                    };
                    for slot in frame {
                        *slot = value;
                    }
                }
                if position >= total && !signalled {
                    signalled = true;
                    let _ = done_tx.send(());
                }
            },
            |err| warn!("output stream error: {err}"),
            None,
        )
        .map_err(|e| DebateError::Announcement(e.to_string()))?;

    stream
        .play()
        .map_err(|e| DebateError::Announcement(e.to_string()))?;

    let _ = done_rx.recv_timeout(max_wait);
    // Let the last buffer reach the device before teardown.
    std::thread::sleep(Duration::from_millis(200));
    drop(stream);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_mono_averages_channels() {
        let stereo = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mono = downmix_mono(&stereo, 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix_mono(&samples, 1), samples);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_halves_length_when_downsampling() {
        let samples: Vec<f32> = (0..480).map(|i| i as f32 / 480.0).collect();
        let resampled = resample_linear(&samples, 48000, 24000);
        let diff = (resampled.len() as i64 - 240).abs();
        assert!(diff <= 1, "expected ~240 samples, got {}", resampled.len());
    }

    #[test]
    fn test_resample_upsampling_interpolates() {
        let samples = vec![0.0, 1.0];
        let resampled = resample_linear(&samples, 8000, 16000);
        assert!(resampled.len() >= 3);
        // Interpolated values stay within the input range.
        for &s in &resampled {
            assert!((0.0..=1.0).contains(&s));
        }
    }
}
