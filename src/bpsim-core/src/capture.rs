//! Human speech capture.
//!
//! Drives the lifecycle of one microphone recording: wait for the operator's
//! start signal, pull frames off the device on a background thread, wait for
//! the stop signal, then materialize the take as a transient WAV file. The
//! controller never raises out of `capture`; any failure is logged and the
//! turn proceeds with no recording, leaving the filesystem untouched.

use crate::audio::{downmix_mono, resample_linear};
use crate::error::DebateError;
use crate::role::Role;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use tempfile::TempPath;
use tracing::{info, warn};

/// Operator start/stop signals for one recording.
pub trait CaptureGate: Send + Sync {
    /// Blocks until the operator arms and starts the recording.
    fn wait_for_start(&self, role: Role);
    /// Blocks until the operator stops the recording.
    fn wait_for_stop(&self);
}

/// Reads start/stop signals from stdin (press Enter).
pub struct StdinGate;

impl CaptureGate for StdinGate {
    fn wait_for_start(&self, role: Role) {
        println!("Press Enter to start recording for {role}... ");
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
    }

    fn wait_for_stop(&self) {
        println!("Press Enter again to stop recording... ");
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
    }
}

/// A recorded take. The backing file is deleted when the handle drops, so
/// release holds on every exit path.
pub struct CapturedAudio {
    path: TempPath,
}

impl CapturedAudio {
    /// Wraps an existing file; it will be deleted when the handle drops.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: TempPath::from_path(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_ref()
    }
}

/// Microphone input source. `record` returns the mono frames captured
/// between stream start and the gate's stop signal, already resampled to
/// the requested rate.
pub trait InputBackend: Send + Sync {
    fn record(&self, sample_rate: u32, gate: &dyn CaptureGate) -> Result<Vec<f32>, DebateError>;
}

/// cpal-backed microphone input.
pub struct CpalInput;

impl InputBackend for CpalInput {
    fn record(&self, sample_rate: u32, gate: &dyn CaptureGate) -> Result<Vec<f32>, DebateError> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| DebateError::Device("no input device available".to_string()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| DebateError::Device(e.to_string()))?;

        let device_rate = supported.sample_rate().0;
        let channels = supported.channels();
        let config = supported.config();

        let (tx, rx) = mpsc::channel::<Vec<f32>>();
        // Frames are enqueued only while this is set; armed-but-not-started
        // and already-stopped callbacks are dropped.
        let active = Arc::new(AtomicBool::new(false));

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => {
                let tx = tx.clone();
                let active = Arc::clone(&active);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if active.load(Ordering::Relaxed) {
                            let _ = tx.send(data.to_vec());
                        }
                    },
                    |err| warn!("input stream error: {err}"),
                    None,
                )
            }
            cpal::SampleFormat::I16 => {
                let tx = tx.clone();
                let active = Arc::clone(&active);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if active.load(Ordering::Relaxed) {
                            let converted =
                                data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                            let _ = tx.send(converted);
                        }
                    },
                    |err| warn!("input stream error: {err}"),
                    None,
                )
            }
            other => {
                return Err(DebateError::Device(format!(
                    "unsupported input sample format: {other:?}"
                )));
            }
        }
        .map_err(|e| DebateError::Device(e.to_string()))?;

        stream
            .play()
            .map_err(|e| DebateError::Device(e.to_string()))?;
        active.store(true, Ordering::Relaxed);

        gate.wait_for_stop();

        active.store(false, Ordering::Relaxed);
        drop(stream);

        let mut frames = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            frames.extend(chunk);
        }

        let mono = downmix_mono(&frames, channels);
        Ok(resample_linear(&mono, device_rate, sample_rate))
    }
}

/// Manages the start/stop lifecycle of one human recording at a time.
///
/// At most one take is live system-wide; concurrent capture attempts
/// serialize on the internal turn lock.
pub struct AudioCaptureController {
    backend: Arc<dyn InputBackend>,
    gate: Arc<dyn CaptureGate>,
    temp_dir: PathBuf,
    turn: tokio::sync::Mutex<()>,
}

impl AudioCaptureController {
    pub fn new(backend: Arc<dyn InputBackend>, gate: Arc<dyn CaptureGate>) -> Self {
        Self {
            backend,
            gate,
            temp_dir: std::env::temp_dir(),
            turn: tokio::sync::Mutex::new(()),
        }
    }

    /// Place transient takes in a specific directory instead of the system
    /// temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Runs one full capture for a human turn. Returns `None` when the
    /// device cannot be acquired, nothing was recorded, or the take cannot
    /// be materialized; in every failure branch the filesystem is left
    /// exactly as it was before the call.
    pub async fn capture(&self, role: Role, sample_rate: u32) -> Option<CapturedAudio> {
        let _guard = self.turn.lock().await;

        let backend = Arc::clone(&self.backend);
        let gate = Arc::clone(&self.gate);
        let temp_dir = self.temp_dir.clone();
        let result = tokio::task::spawn_blocking(move || {
            record_take(backend.as_ref(), gate.as_ref(), role, sample_rate, &temp_dir)
        })
        .await;

        match result {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                warn!("recording for {role} failed: {e}");
                None
            }
            Err(e) => {
                warn!("recording task for {role} panicked: {e}");
                None
            }
        }
    }
}

fn record_take(
    backend: &dyn InputBackend,
    gate: &dyn CaptureGate,
    role: Role,
    sample_rate: u32,
    temp_dir: &Path,
) -> Result<Option<CapturedAudio>, DebateError> {
    gate.wait_for_start(role);
    info!("starting recording for {role}");

    let frames = backend.record(sample_rate, gate)?;
    info!("recording stopped, {} frames captured", frames.len());

    if frames.is_empty() {
        warn!("no audio data recorded");
        return Ok(None);
    }

    Ok(Some(materialize(&frames, sample_rate, temp_dir)?))
}

/// Writes the take as 16-bit mono WAV. The file only exists after a fully
/// successful write: dropping the `NamedTempFile` on any error removes the
/// partial artifact before the error is surfaced.
fn materialize(
    frames: &[f32],
    sample_rate: u32,
    temp_dir: &Path,
) -> Result<CapturedAudio, DebateError> {
    let file = tempfile::Builder::new()
        .prefix("bpsim-take-")
        .suffix(".wav")
        .tempfile_in(temp_dir)
        .map_err(|e| DebateError::Processing(e.to_string()))?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(file.path(), spec)
        .map_err(|e| DebateError::Processing(e.to_string()))?;
    for &sample in frames {
        let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(clamped)
            .map_err(|e| DebateError::Processing(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| DebateError::Processing(e.to_string()))?;

    let path = file.into_temp_path();
    info!("audio saved temporarily to {}", path.display());
    Ok(CapturedAudio { path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct NoopGate;

    impl CaptureGate for NoopGate {
        fn wait_for_start(&self, _role: Role) {}
        fn wait_for_stop(&self) {}
    }

    struct FramesBackend(Vec<f32>);

    impl InputBackend for FramesBackend {
        fn record(
            &self,
            _sample_rate: u32,
            _gate: &dyn CaptureGate,
        ) -> Result<Vec<f32>, DebateError> {
            Ok(self.0.clone())
        }
    }

    struct FailingBackend;

    impl InputBackend for FailingBackend {
        fn record(
            &self,
            _sample_rate: u32,
            _gate: &dyn CaptureGate,
        ) -> Result<Vec<f32>, DebateError> {
            Err(DebateError::Device("device busy".to_string()))
        }
    }

    /// Asserts that no two recordings are ever in flight at once.
    struct OverlapBackend {
        in_flight: AtomicBool,
        overlapped: Arc<AtomicBool>,
        calls: AtomicUsize,
    }

    impl InputBackend for OverlapBackend {
        fn record(
            &self,
            _sample_rate: u32,
            _gate: &dyn CaptureGate,
        ) -> Result<Vec<f32>, DebateError> {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            std::thread::sleep(Duration::from_millis(50));
            self.in_flight.store(false, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.25; 64])
        }
    }

    fn dir_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_device_failure_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let controller = AudioCaptureController::new(Arc::new(FailingBackend), Arc::new(NoopGate))
            .with_temp_dir(dir.path());

        let result = controller.capture(Role::LeaderOfOpposition, 16000).await;

        assert!(result.is_none());
        assert_eq!(dir_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_empty_take_returns_none_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let controller =
            AudioCaptureController::new(Arc::new(FramesBackend(Vec::new())), Arc::new(NoopGate))
                .with_temp_dir(dir.path());

        let result = controller.capture(Role::GovernmentWhip, 16000).await;

        assert!(result.is_none());
        assert_eq!(dir_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_processing_failure_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let controller =
            AudioCaptureController::new(Arc::new(FramesBackend(vec![0.5; 32])), Arc::new(NoopGate))
                .with_temp_dir(&missing);

        let result = controller.capture(Role::MemberOfOpposition, 16000).await;

        assert!(result.is_none());
        assert_eq!(dir_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_successful_take_creates_one_wav_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let controller =
            AudioCaptureController::new(Arc::new(FramesBackend(vec![0.5; 320])), Arc::new(NoopGate))
                .with_temp_dir(dir.path());

        let audio = controller
            .capture(Role::PrimeMinister, 16000)
            .await
            .expect("capture should succeed");
        assert_eq!(dir_entries(dir.path()), 1);

        let reader = hound::WavReader::open(audio.path()).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.len(), 320);

        drop(audio);
        assert_eq!(dir_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_concurrent_captures_serialize() {
        let dir = tempfile::tempdir().unwrap();
        let overlapped = Arc::new(AtomicBool::new(false));
        let backend = Arc::new(OverlapBackend {
            in_flight: AtomicBool::new(false),
            overlapped: Arc::clone(&overlapped),
            calls: AtomicUsize::new(0),
        });
        let controller = Arc::new(
            AudioCaptureController::new(backend.clone(), Arc::new(NoopGate))
                .with_temp_dir(dir.path()),
        );

        let a = Arc::clone(&controller);
        let b = Arc::clone(&controller);
        let (first, second) = tokio::join!(
            a.capture(Role::PrimeMinister, 16000),
            b.capture(Role::LeaderOfOpposition, 16000),
        );

        assert!(first.is_some());
        assert!(second.is_some());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(
            !overlapped.load(Ordering::SeqCst),
            "recordings must never overlap"
        );
    }
}
