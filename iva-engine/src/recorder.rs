use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use iva_core::types::RecorderState;
use tokio::sync::mpsc;

use crate::error::RecorderError;
use crate::traits::{CaptureControl, CaptureDevice, CaptureHandle, Clip};

struct RecordingSession {
    sample_rate_hz: u32,
    chunks: Vec<Vec<f32>>,
    fragments: mpsc::UnboundedReceiver<Vec<f32>>,
    control: Box<dyn CaptureControl>,
}

impl RecordingSession {
    fn new(handle: CaptureHandle) -> Self {
        Self {
            sample_rate_hz: handle.sample_rate_hz,
            chunks: Vec::new(),
            fragments: handle.fragments,
            control: handle.control,
        }
    }

    fn absorb_pending(&mut self) {
        while let Ok(fragment) = self.fragments.try_recv() {
            self.chunks.push(fragment);
        }
    }

    /// Stop the device and wait until it has delivered its last fragment.
    async fn finish(self, stop_timeout: Duration) -> Clip {
        let RecordingSession {
            sample_rate_hz,
            mut chunks,
            mut fragments,
            mut control,
        } = self;

        control.stop();

        let drain = async {
            while let Some(fragment) = fragments.recv().await {
                chunks.push(fragment);
            }
        };
        if tokio::time::timeout(stop_timeout, drain).await.is_err() {
            log::warn!("capture device did not close within {stop_timeout:?}; using fragments received so far");
        }

        Clip {
            sample_rate_hz,
            fragments: chunks,
        }
    }

    fn discard(mut self) {
        self.control.stop();
    }
}

enum Phase {
    Idle,
    Opening,
    Capturing(RecordingSession),
    Finalizing,
}

struct RecorderInner {
    phase: Phase,
    // Bumped whenever an in-progress recording is abandoned.
    epoch: u64,
}

/// Drives the Idle -> Capturing -> Finalizing -> Idle cycle and owns the
/// capture device for the length of one recording.
#[derive(Clone)]
pub struct RecorderController {
    device: Arc<dyn CaptureDevice>,
    inner: Arc<Mutex<RecorderInner>>,
    stop_timeout: Duration,
}

impl RecorderController {
    pub fn new(device: Arc<dyn CaptureDevice>, stop_timeout: Duration) -> Self {
        Self {
            device,
            inner: Arc::new(Mutex::new(RecorderInner {
                phase: Phase::Idle,
                epoch: 0,
            })),
            stop_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecorderInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> RecorderState {
        match self.lock().phase {
            // Waiting for the device is not yet listening.
            Phase::Idle | Phase::Opening => RecorderState::Idle,
            Phase::Capturing(_) => RecorderState::Capturing,
            Phase::Finalizing => RecorderState::Finalizing,
        }
    }

    /// Number of fragments buffered by the active recording.
    pub fn buffered_fragments(&self) -> usize {
        match &mut self.lock().phase {
            Phase::Capturing(session) => {
                session.absorb_pending();
                session.chunks.len()
            }
            _ => 0,
        }
    }

    pub async fn start(&self) -> Result<(), RecorderError> {
        let epoch = {
            let mut inner = self.lock();
            if !matches!(inner.phase, Phase::Idle) {
                return Err(RecorderError::AlreadyRecording);
            }
            inner.phase = Phase::Opening;
            inner.epoch
        };

        let opened = self.device.open().await;

        let mut inner = self.lock();
        let still_wanted = inner.epoch == epoch && matches!(inner.phase, Phase::Opening);
        match opened {
            Ok(handle) if still_wanted => {
                inner.phase = Phase::Capturing(RecordingSession::new(handle));
                log::info!("recording started");
                Ok(())
            }
            Ok(handle) => {
                RecordingSession::new(handle).discard();
                Err(RecorderError::Cancelled)
            }
            Err(e) => {
                if still_wanted {
                    inner.phase = Phase::Idle;
                }
                log::warn!("capture device unavailable: {e:#}");
                Err(RecorderError::DeviceUnavailable(e.to_string()))
            }
        }
    }

    /// Finish the active recording. Returns `None` when nothing was being
    /// captured, when another stop is already finalizing, or when the
    /// recording was aborted while its last fragments were being collected.
    pub async fn stop(&self) -> Option<Clip> {
        let (session, epoch) = {
            let mut inner = self.lock();
            match std::mem::replace(&mut inner.phase, Phase::Finalizing) {
                Phase::Capturing(session) => (session, inner.epoch),
                Phase::Opening => {
                    // Released before the device answered: cancel the pending start.
                    inner.phase = Phase::Idle;
                    inner.epoch += 1;
                    return None;
                }
                other => {
                    inner.phase = other;
                    return None;
                }
            }
        };

        let clip = session.finish(self.stop_timeout).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            log::debug!("discarding clip from an aborted recording");
            return None;
        }
        inner.phase = Phase::Idle;
        log::info!(
            "recording finished: {} fragments (~{}ms)",
            clip.fragments.len(),
            clip.duration_ms()
        );
        Some(clip)
    }

    /// Drop any recording without producing a clip.
    pub fn abort(&self) -> bool {
        let mut inner = self.lock();
        inner.epoch += 1;
        match std::mem::replace(&mut inner.phase, Phase::Idle) {
            Phase::Capturing(session) => {
                session.discard();
                log::info!("recording aborted");
                true
            }
            Phase::Idle => false,
            Phase::Opening | Phase::Finalizing => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    // Records stop requests; the test drives the fragment channel directly.
    struct FlagControl {
        stopped: Arc<AtomicBool>,
    }

    impl CaptureControl for FlagControl {
        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    struct ScriptedDevice {
        senders: Mutex<Vec<mpsc::UnboundedSender<Vec<f32>>>>,
        stopped: Arc<AtomicBool>,
        deny: bool,
        opens: AtomicUsize,
    }

    impl ScriptedDevice {
        fn new(deny: bool) -> Arc<Self> {
            Arc::new(Self {
                senders: Mutex::new(Vec::new()),
                stopped: Arc::new(AtomicBool::new(false)),
                deny,
                opens: AtomicUsize::new(0),
            })
        }

        fn sender(&self) -> mpsc::UnboundedSender<Vec<f32>> {
            self.senders.lock().unwrap().last().cloned().unwrap()
        }

        fn close(&self) {
            self.senders.lock().unwrap().clear();
        }
    }

    #[async_trait::async_trait]
    impl CaptureDevice for ScriptedDevice {
        async fn open(&self) -> anyhow::Result<CaptureHandle> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.deny {
                anyhow::bail!("permission denied");
            }
            let (tx, rx) = mpsc::unbounded_channel();
            self.senders.lock().unwrap().push(tx);
            Ok(CaptureHandle {
                sample_rate_hz: 16_000,
                fragments: rx,
                control: Box::new(FlagControl {
                    stopped: self.stopped.clone(),
                }),
            })
        }
    }

    fn recorder(device: Arc<ScriptedDevice>) -> RecorderController {
        RecorderController::new(device, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn stop_without_start_is_a_noop() {
        let rec = recorder(ScriptedDevice::new(false));
        assert_eq!(rec.stop().await, None);
        assert_eq!(rec.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn denied_device_stays_idle() {
        let dev = ScriptedDevice::new(true);
        let rec = recorder(dev.clone());
        let err = rec.start().await.unwrap_err();
        assert!(matches!(err, RecorderError::DeviceUnavailable(_)));
        assert_eq!(rec.state(), RecorderState::Idle);
        assert_eq!(dev.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_start_is_rejected_and_keeps_buffer() {
        let dev = ScriptedDevice::new(false);
        let rec = recorder(dev.clone());
        rec.start().await.unwrap();
        dev.sender().send(vec![1.0]).unwrap();

        assert_eq!(rec.start().await, Err(RecorderError::AlreadyRecording));
        assert_eq!(dev.opens.load(Ordering::SeqCst), 1);
        assert_eq!(rec.buffered_fragments(), 1);
        assert_eq!(rec.state(), RecorderState::Capturing);
    }

    #[tokio::test]
    async fn stop_waits_for_final_fragment() {
        let dev = ScriptedDevice::new(false);
        let rec = recorder(dev.clone());
        rec.start().await.unwrap();

        let tx = dev.sender();
        tx.send(vec![0.1]).unwrap();
        tx.send(vec![0.2]).unwrap();

        let stopping = tokio::spawn({
            let rec = rec.clone();
            async move { rec.stop().await }
        });

        // The last fragment lands after stop was requested.
        for _ in 0..100 {
            if dev.stopped.load(Ordering::SeqCst) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(dev.stopped.load(Ordering::SeqCst));
        assert_eq!(rec.state(), RecorderState::Finalizing);
        assert_eq!(rec.stop().await, None);

        tx.send(vec![0.3]).unwrap();
        drop(tx);
        dev.close();

        let clip = stopping.await.unwrap().unwrap();
        assert_eq!(clip.fragments, vec![vec![0.1], vec![0.2], vec![0.3]]);
        assert_eq!(rec.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn each_recording_gets_a_fresh_buffer() {
        let dev = ScriptedDevice::new(false);
        let rec = recorder(dev.clone());

        rec.start().await.unwrap();
        dev.sender().send(vec![1.0]).unwrap();
        dev.close();
        assert_eq!(rec.stop().await.unwrap().fragments.len(), 1);

        rec.start().await.unwrap();
        dev.sender().send(vec![2.0]).unwrap();
        dev.close();
        let clip = rec.stop().await.unwrap();
        assert_eq!(clip.fragments, vec![vec![2.0]]);
    }

    #[tokio::test]
    async fn abort_discards_recording() {
        let dev = ScriptedDevice::new(false);
        let rec = recorder(dev.clone());
        rec.start().await.unwrap();
        dev.sender().send(vec![1.0]).unwrap();

        assert!(rec.abort());
        assert!(dev.stopped.load(Ordering::SeqCst));
        assert_eq!(rec.state(), RecorderState::Idle);
        assert_eq!(rec.stop().await, None);
    }

    #[tokio::test]
    async fn stop_timeout_keeps_fragments_received_so_far() {
        let dev = ScriptedDevice::new(false);
        let rec = recorder(dev.clone());
        rec.start().await.unwrap();
        dev.sender().send(vec![0.5]).unwrap();

        // The device never closes its channel.
        let clip = rec.stop().await.unwrap();
        assert_eq!(clip.fragments, vec![vec![0.5]]);
        assert_eq!(rec.state(), RecorderState::Idle);
    }
}
