// Microphone capture over cpal.
//
// cpal streams are not `Send` on every host, so each recording owns a worker
// thread that builds the stream, keeps it alive and drops it on stop. Dropping
// the stream drops the callback and with it the fragment sender, which closes
// the channel the recorder is draining.

use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Sample, SampleFormat, SizedSample, Stream};
use iva_engine::traits::{CaptureControl, CaptureDevice, CaptureHandle};
use tokio::sync::{mpsc, oneshot};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum AudioCaptureError {
    #[error("no input device found")]
    NoInputDevice,

    #[error("failed to get default config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to play stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("audio worker startup timeout")]
    WorkerTimeout,

    #[error("audio worker exited during startup")]
    WorkerGone,
}

pub fn list_input_device_names() -> anyhow::Result<Vec<String>> {
    let host = cpal::default_host();
    let mut out: Vec<String> = host.input_devices()?.filter_map(|d| d.name().ok()).collect();
    out.sort();
    out.dedup();
    Ok(out)
}

/// Opens the configured (or default) input device for each recording.
pub struct CpalCaptureDevice {
    preferred: Option<String>,
}

impl CpalCaptureDevice {
    pub fn new(preferred: Option<String>) -> Self {
        Self {
            preferred: preferred.filter(|n| !n.trim().is_empty()),
        }
    }

    fn pick_device(&self) -> Result<Device, AudioCaptureError> {
        let host = cpal::default_host();

        if let Some(needle) = self.preferred.as_deref().map(str::trim) {
            if let Ok(devices) = host.input_devices() {
                for dev in devices {
                    if dev.name().is_ok_and(|name| name == needle) {
                        log::info!("using input device: {needle}");
                        return Ok(dev);
                    }
                }
            }
            log::warn!("preferred input device not found, falling back to default: {needle}");
        }

        host.default_input_device()
            .ok_or(AudioCaptureError::NoInputDevice)
    }
}

struct WorkerStop(Option<std_mpsc::Sender<()>>);

impl CaptureControl for WorkerStop {
    fn stop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for WorkerStop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl CaptureDevice for CpalCaptureDevice {
    async fn open(&self) -> anyhow::Result<CaptureHandle> {
        let device = self.pick_device()?;
        let default_cfg = device
            .default_input_config()
            .map_err(AudioCaptureError::from)?;
        let sample_rate_hz = default_cfg.sample_rate().0;

        let (fragment_tx, fragment_rx) = mpsc::unbounded_channel::<Vec<f32>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), AudioCaptureError>>();

        std::thread::spawn(move || {
            let config: cpal::StreamConfig = default_cfg.clone().into();
            let channels = config.channels as usize;
            let stream = match default_cfg.sample_format() {
                SampleFormat::I16 => build_input_stream::<i16>(&device, &config, channels, fragment_tx),
                SampleFormat::U16 => build_input_stream::<u16>(&device, &config, channels, fragment_tx),
                SampleFormat::I8 => build_input_stream::<i8>(&device, &config, channels, fragment_tx),
                SampleFormat::U8 => build_input_stream::<u8>(&device, &config, channels, fragment_tx),
                SampleFormat::I32 => build_input_stream::<i32>(&device, &config, channels, fragment_tx),
                SampleFormat::U32 => build_input_stream::<u32>(&device, &config, channels, fragment_tx),
                SampleFormat::F64 => build_input_stream::<f64>(&device, &config, channels, fragment_tx),
                _ => build_input_stream::<f32>(&device, &config, channels, fragment_tx),
            };

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    log::error!("audio stream build failed: {e}");
                    let _ = ready_tx.send(Err(e.into()));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                log::error!("audio stream play failed: {e}");
                let _ = ready_tx.send(Err(e.into()));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            // Returns on stop or when the control is dropped.
            let _ = stop_rx.recv();
            drop(stream);
            log::debug!("capture worker stopped");
        });

        let control = WorkerStop(Some(stop_tx));
        match tokio::time::timeout(STARTUP_TIMEOUT, ready_rx).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => return Err(e.into()),
            Ok(Err(_)) => return Err(AudioCaptureError::WorkerGone.into()),
            Err(_) => return Err(AudioCaptureError::WorkerTimeout.into()),
        }

        Ok(CaptureHandle {
            sample_rate_hz,
            fragments: fragment_rx,
            control: Box::new(control),
        })
    }
}

fn build_input_stream<T>(
    device: &Device,
    config: &cpal::StreamConfig,
    channels: usize,
    fragment_tx: mpsc::UnboundedSender<Vec<f32>>,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let channels = channels.max(1);
    let cb = move |data: &[T], _: &cpal::InputCallbackInfo| {
        let mono: Vec<f32> = if channels == 1 {
            data.iter().map(|&s| s.to_sample::<f32>()).collect()
        } else {
            data.chunks_exact(channels)
                .map(|frame| {
                    frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32
                })
                .collect()
        };
        let _ = fragment_tx.send(mono);
    };

    device.build_input_stream(
        config,
        cb,
        |err| log::error!("audio stream error: {err}"),
        None,
    )
}
