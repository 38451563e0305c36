use crate::decode::DecodedAudio;

/// Somewhere to play decoded reply audio. `play` blocks until the clip has
/// been handed to the device and drained.
pub trait PlaybackSink: Send + Sync {
    fn play(&self, audio: DecodedAudio) -> anyhow::Result<()>;
}

/// Sink for builds or hosts without an output device.
pub struct UnavailableSink;

impl PlaybackSink for UnavailableSink {
    fn play(&self, audio: DecodedAudio) -> anyhow::Result<()> {
        anyhow::bail!(
            "audio output unavailable; dropped {}ms reply",
            audio.duration_ms()
        )
    }
}

#[cfg(feature = "audio-io")]
pub use speaker::CpalSink;

#[cfg(feature = "audio-io")]
mod speaker {
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::{Duration, Instant};

    use anyhow::Context;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    use super::PlaybackSink;
    use crate::decode::DecodedAudio;
    use crate::resample::resample_mono_f32;

    // Extra time allowed beyond the clip length before giving up on the device.
    const DRAIN_SLACK: Duration = Duration::from_secs(2);

    /// Plays through the default output device.
    pub struct CpalSink;

    impl PlaybackSink for CpalSink {
        fn play(&self, audio: DecodedAudio) -> anyhow::Result<()> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .context("no output device available")?;
            log::debug!(
                "using output device: {}",
                device.name().unwrap_or_else(|_| "unknown".to_string())
            );

            let config: cpal::StreamConfig = device
                .default_output_config()
                .context("get output config")?
                .into();
            let channels = config.channels as usize;
            let out_rate = config.sample_rate.0;

            let samples = resample_mono_f32(&audio.samples, audio.sample_rate_hz, out_rate)?;
            let expected = Duration::from_millis(samples.len() as u64 * 1000 / out_rate.max(1) as u64);

            let queue = Arc::new(Mutex::new(std::collections::VecDeque::from(samples)));
            let feed = queue.clone();

            let stream = device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        let mut q = feed.lock().unwrap_or_else(PoisonError::into_inner);
                        for frame in data.chunks_mut(channels.max(1)) {
                            let s = q.pop_front().unwrap_or(0.0);
                            frame.fill(s);
                        }
                    },
                    |err| log::error!("audio output stream error: {err}"),
                    None,
                )
                .context("build output stream")?;
            stream.play().context("start output stream")?;

            let deadline = Instant::now() + expected + DRAIN_SLACK;
            while !queue.lock().unwrap_or_else(PoisonError::into_inner).is_empty() {
                if Instant::now() > deadline {
                    anyhow::bail!("output device stalled during playback");
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            // Let the last callback buffer reach the speaker.
            std::thread::sleep(Duration::from_millis(100));
            drop(stream);
            Ok(())
        }
    }
}
