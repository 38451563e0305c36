use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use iva_engine::traits::{CaptureControl, CaptureDevice, CaptureHandle};
use tokio::sync::{mpsc, oneshot};

use crate::decode::{DecodedAudio, decode_to_mono};

const DEFAULT_FRAGMENT_MS: u32 = 100;

/// Capture device that replays a decoded file as if it were a microphone.
///
/// Every `open` starts from the beginning of the file. When paced, fragments
/// are released in real time so the recording lasts as long as the user holds
/// it; otherwise the whole file is delivered at once.
pub struct FileCaptureDevice {
    audio: Arc<DecodedAudio>,
    fragment_ms: u32,
    paced: bool,
}

impl FileCaptureDevice {
    pub fn new(audio: DecodedAudio) -> Self {
        Self {
            audio: Arc::new(audio),
            fragment_ms: DEFAULT_FRAGMENT_MS,
            paced: true,
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str());
        let audio = decode_to_mono(bytes, ext).with_context(|| format!("decode {}", path.display()))?;
        log::info!(
            "loaded clip {}: {} Hz, ~{}ms",
            path.display(),
            audio.sample_rate_hz,
            audio.duration_ms()
        );
        Ok(Self::new(audio))
    }

    pub fn with_fragment_ms(mut self, fragment_ms: u32) -> Self {
        self.fragment_ms = fragment_ms.max(1);
        self
    }

    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    fn fragment_len(&self) -> usize {
        let n = self.audio.sample_rate_hz as u64 * self.fragment_ms as u64 / 1000;
        (n as usize).max(1)
    }
}

struct StopSignal(Option<oneshot::Sender<()>>);

impl CaptureControl for StopSignal {
    fn stop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

#[async_trait]
impl CaptureDevice for FileCaptureDevice {
    async fn open(&self) -> anyhow::Result<CaptureHandle> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let audio = self.audio.clone();
        let len = self.fragment_len();
        let pause = Duration::from_millis(self.fragment_ms as u64);
        let paced = self.paced;

        tokio::spawn(async move {
            let mut chunks = audio.samples.chunks(len);
            loop {
                if paced {
                    tokio::select! {
                        _ = &mut stop_rx => {
                            // Flush the fragment that was "in the buffer" when stopped.
                            if let Some(last) = chunks.next() {
                                let _ = tx.send(last.to_vec());
                            }
                            break;
                        }
                        _ = tokio::time::sleep(pause) => {}
                    }
                }
                let Some(chunk) = chunks.next() else { break };
                if tx.send(chunk.to_vec()).is_err() {
                    break;
                }
            }
            log::debug!("file capture finished");
        });

        Ok(CaptureHandle {
            sample_rate_hz: self.audio.sample_rate_hz,
            fragments: rx,
            control: Box::new(StopSignal(Some(stop_tx))),
        })
    }
}
