//! Recording session management.
//!
//! A [`RecordingSession`] owns one background capture loop that samples
//! frames from a backend, normalizes them, and appends them to a WebM
//! stream until the cooperative stop flag is set. One session records one
//! stream; the stop flag is the only state shared with the caller.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use proofshot_common::error::{ProofshotError, ProofshotResult};
use proofshot_platform_core::{resolve_bounds, Bounds, CaptureTarget};

use crate::backend::{BackendKind, BackendRegistry, FrameSource};
use crate::encoder::{FrameSink, WebmEncoder};
use crate::frame::normalize;

/// Configuration for starting a new recording session.
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Output WebM file path.
    pub output_path: PathBuf,

    /// Frame rate written into the container metadata. This sets playback
    /// speed, not the sampling cadence; the loop runs as fast as
    /// capture + encode allows.
    pub fps: u32,

    /// Scale factor applied to every frame, in (0, 1].
    pub scale_factor: f64,

    /// Monitor to record: 0 = whole virtual screen, n >= 1 = nth physical
    /// monitor. Recording captures whole monitors only (no sub-region).
    pub monitor_index: usize,

    /// Requested backend; `None` lets the registry pick.
    pub backend: Option<BackendKind>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("recording.webm"),
            fps: 25,
            scale_factor: 1.0,
            monitor_index: 0,
            backend: None,
        }
    }
}

/// State of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session created but not started.
    Idle,
    /// Background loop is appending frames.
    Recording,
    /// Stop flag set, waiting for the loop to finalize the stream.
    Stopping,
    /// Stream closed and resources released.
    Closed,
}

/// A screen-recording session backed by one background capture loop.
pub struct RecordingSession {
    config: RecordingConfig,
    registry: BackendRegistry,
    state: SessionState,
    stop_flag: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<ProofshotResult<u64>>>,
    started_at: Option<Instant>,
}

impl RecordingSession {
    /// Create a new session against an already-probed backend registry.
    pub fn new(config: RecordingConfig, registry: &BackendRegistry) -> Self {
        Self {
            config,
            registry: registry.clone(),
            state: SessionState::Idle,
            stop_flag: Arc::new(AtomicBool::new(false)),
            task: None,
            started_at: None,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get a clone of the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Recording duration so far.
    pub fn elapsed_secs(&self) -> f64 {
        self.started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Start recording.
    ///
    /// Resolves the monitor bounds up front so a missing monitor surfaces
    /// here, before any stream is opened, then spawns the capture loop.
    pub async fn start(&mut self) -> ProofshotResult<()> {
        if self.state != SessionState::Idle {
            return Err(ProofshotError::capture("session already started"));
        }
        if self.config.fps == 0 {
            return Err(ProofshotError::config("frame rate must be positive"));
        }
        if !(self.config.scale_factor > 0.0 && self.config.scale_factor <= 1.0) {
            return Err(ProofshotError::config(format!(
                "scale factor {} outside (0, 1]",
                self.config.scale_factor
            )));
        }

        let kind = self.registry.select(self.config.backend)?;

        // Initial bounds probe, on the caller's side of the spawn.
        let probe = kind.create()?;
        let monitors = probe.monitors().map_err(|e| {
            ProofshotError::monitor_unavailable(format!("monitor enumeration failed: {e}"))
        })?;
        let bounds = resolve_bounds(&monitors, &CaptureTarget::monitor(self.config.monitor_index))
            .map_err(|e| match e {
                ProofshotError::MonitorUnavailable { .. } => e,
                other => ProofshotError::monitor_unavailable(other.to_string()),
            })?;
        drop(probe);

        tracing::info!(
            backend = %kind,
            monitor = self.config.monitor_index,
            width = bounds.width,
            height = bounds.height,
            fps = self.config.fps,
            path = %self.config.output_path.display(),
            "Starting recording session"
        );

        let output_path = self.config.output_path.clone();
        let fps = self.config.fps;
        let scale_factor = self.config.scale_factor;
        let stop = self.stop_flag.clone();

        self.stop_flag.store(false, Ordering::SeqCst);
        self.task = Some(tokio::task::spawn_blocking(move || {
            let mut source = kind.create()?;
            run_recording_loop(source.as_mut(), &bounds, scale_factor, &stop, |w, h| {
                Ok(Box::new(WebmEncoder::open(&output_path, w, h, fps)?))
            })
        }));
        self.started_at = Some(Instant::now());
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Stop recording and finalize the output file.
    ///
    /// Sets the stop flag, joins the capture loop (which guarantees the
    /// stream is closed before this returns), and propagates any error the
    /// loop hit mid-recording.
    pub async fn stop(&mut self) -> ProofshotResult<PathBuf> {
        if self.state != SessionState::Recording {
            return Err(ProofshotError::capture("session is not recording"));
        }
        self.state = SessionState::Stopping;
        self.stop_flag.store(true, Ordering::SeqCst);

        let task = self
            .task
            .take()
            .ok_or_else(|| ProofshotError::capture("recording task missing"))?;
        let joined = task
            .await
            .map_err(|e| ProofshotError::capture(format!("recording task panicked: {e}")))?;

        self.state = SessionState::Closed;

        match joined {
            Ok(frames) => {
                tracing::info!(
                    frames,
                    duration_secs = self.elapsed_secs(),
                    path = %self.config.output_path.display(),
                    "Recording stopped"
                );
                Ok(self.config.output_path.clone())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Recording loop exited with error");
                Err(e)
            }
        }
    }
}

/// The producer loop: grab, normalize, append, check the stop flag.
///
/// The stream is opened with the first observed frame's post-normalization
/// dimensions; any later frame of a different size is rejected as a fatal
/// error. The stop flag is checked once per iteration, so at most one more
/// frame is appended after it is set. The sink is always closed on the way
/// out, keeping whatever frames were written.
fn run_recording_loop(
    source: &mut dyn FrameSource,
    bounds: &Bounds,
    scale_factor: f64,
    stop: &AtomicBool,
    open_sink: impl FnOnce(u32, u32) -> ProofshotResult<Box<dyn FrameSink>>,
) -> ProofshotResult<u64> {
    let first_raw = source.grab(bounds).map_err(|e| {
        ProofshotError::monitor_unavailable(format!("initial frame grab failed: {e}"))
    })?;
    let first = normalize(&first_raw, scale_factor)?;
    let (stream_width, stream_height) = (first.width, first.height);

    let mut sink = open_sink(stream_width, stream_height)?;

    let run = (|| -> ProofshotResult<()> {
        sink.append(&first)?;
        while !stop.load(Ordering::SeqCst) {
            let raw = source.grab(bounds)?;
            let frame = normalize(&raw, scale_factor)?;
            if frame.width != stream_width || frame.height != stream_height {
                return Err(ProofshotError::capture(format!(
                    "captured frame drifted to {}x{}; stream is fixed at {stream_width}x{stream_height}",
                    frame.width, frame.height
                )));
            }
            sink.append(&frame)?;
        }
        Ok(())
    })();

    let closed = sink.close();
    match run {
        Ok(()) => {
            closed?;
            Ok(sink.frames_written())
        }
        Err(e) => {
            // Best-effort finalize of the partial file; the capture error
            // is the one the caller needs to see.
            if let Err(close_err) = closed {
                tracing::warn!(error = %close_err, "Failed to finalize partial recording");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofshot_platform_core::MonitorInfo;

    use crate::frame::{ChannelOrder, Frame, RawFrame};

    struct ScriptedSource {
        grabs: usize,
        stop: Arc<AtomicBool>,
        stop_after: usize,
        fail_on: Option<usize>,
        drift_on: Option<usize>,
    }

    impl ScriptedSource {
        fn new(stop: Arc<AtomicBool>, stop_after: usize) -> Self {
            Self {
                grabs: 0,
                stop,
                stop_after,
                fail_on: None,
                drift_on: None,
            }
        }

        fn frame(width: u32, height: u32) -> RawFrame {
            RawFrame::packed(
                vec![0x20; (width * height) as usize * 4],
                width,
                height,
                ChannelOrder::Rgba,
            )
        }
    }

    impl FrameSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn monitors(&self) -> ProofshotResult<Vec<MonitorInfo>> {
            Ok(vec![MonitorInfo {
                name: "fake".to_string(),
                width: 64,
                height: 48,
                x: 0,
                y: 0,
                primary: true,
            }])
        }

        fn grab(&mut self, _bounds: &Bounds) -> ProofshotResult<RawFrame> {
            self.grabs += 1;
            if Some(self.grabs) == self.fail_on {
                return Err(ProofshotError::capture("scripted grab failure"));
            }
            if self.grabs >= self.stop_after {
                self.stop.store(true, Ordering::SeqCst);
            }
            if Some(self.grabs) == self.drift_on {
                return Ok(Self::frame(32, 48));
            }
            Ok(Self::frame(64, 48))
        }
    }

    #[derive(Default)]
    struct CountingSink {
        frames: u64,
        closed: bool,
        dims: Option<(u32, u32)>,
    }

    impl FrameSink for CountingSink {
        fn append(&mut self, frame: &Frame) -> ProofshotResult<()> {
            assert!(!self.closed, "append after close");
            if let Some((w, h)) = self.dims {
                assert_eq!((frame.width, frame.height), (w, h));
            }
            self.frames += 1;
            Ok(())
        }

        fn close(&mut self) -> ProofshotResult<()> {
            self.closed = true;
            Ok(())
        }

        fn frames_written(&self) -> u64 {
            self.frames
        }
    }

    fn bounds() -> Bounds {
        Bounds {
            x: 0,
            y: 0,
            width: 64,
            height: 48,
        }
    }

    #[test]
    fn loop_appends_at_most_one_frame_after_stop() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = ScriptedSource::new(stop.clone(), 3);

        let frames = run_recording_loop(&mut source, &bounds(), 1.0, &stop, |w, h| {
            Ok(Box::new(CountingSink {
                dims: Some((w, h)),
                ..CountingSink::default()
            }))
        })
        .unwrap();

        // The grab that sets the stop flag is still appended; nothing after.
        assert_eq!(frames, 3);
        assert_eq!(source.grabs, 3);
    }

    #[test]
    fn stream_dimensions_come_from_first_normalized_frame() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = ScriptedSource::new(stop.clone(), 2);

        run_recording_loop(&mut source, &bounds(), 0.5, &stop, |w, h| {
            assert_eq!((w, h), (32, 24));
            Ok(Box::new(CountingSink {
                dims: Some((w, h)),
                ..CountingSink::default()
            }))
        })
        .unwrap();
    }

    #[test]
    fn dimension_drift_is_fatal_but_stream_is_finalized() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = ScriptedSource::new(stop.clone(), 100);
        source.drift_on = Some(3);

        let err = run_recording_loop(&mut source, &bounds(), 1.0, &stop, |_, _| {
            Ok(Box::new(CountingSink::default()))
        })
        .unwrap_err();
        assert!(matches!(err, ProofshotError::Capture { .. }));
        assert!(err.to_string().contains("drifted"));
    }

    #[test]
    fn first_grab_failure_is_monitor_unavailable_and_opens_no_stream() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = ScriptedSource::new(stop.clone(), 100);
        source.fail_on = Some(1);

        let err = run_recording_loop(&mut source, &bounds(), 1.0, &stop, |_, _| {
            panic!("stream must not be opened when the initial grab fails");
        })
        .unwrap_err();
        assert!(matches!(err, ProofshotError::MonitorUnavailable { .. }));
    }

    #[test]
    fn mid_recording_failure_propagates_after_close() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = ScriptedSource::new(stop.clone(), 100);
        source.fail_on = Some(4);

        let err = run_recording_loop(&mut source, &bounds(), 1.0, &stop, |_, _| {
            Ok(Box::new(CountingSink::default()))
        })
        .unwrap_err();
        assert!(matches!(err, ProofshotError::Capture { .. }));
    }

    #[tokio::test]
    async fn start_with_no_backend_fails_and_stays_idle() {
        let registry = BackendRegistry::with_available(vec![]);
        let mut session = RecordingSession::new(RecordingConfig::default(), &registry);
        // No backend available: start fails before any task is spawned.
        let err = session.start().await.unwrap_err();
        assert!(matches!(err, ProofshotError::UnsupportedBackend { .. }));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn stop_without_start_is_an_error() {
        let registry = BackendRegistry::with_available(vec![]);
        let mut session = RecordingSession::new(RecordingConfig::default(), &registry);
        let err = session.stop().await.unwrap_err();
        assert!(matches!(err, ProofshotError::Capture { .. }));
    }

    #[tokio::test]
    #[ignore = "requires graphical display and GStreamer vp8enc/webmmux plugins"]
    async fn end_to_end_records_a_scaled_webm() {
        let registry = BackendRegistry::probe();
        let path = std::env::temp_dir().join("proofshot-session-e2e.webm");
        let config = RecordingConfig {
            output_path: path.clone(),
            fps: 10,
            scale_factor: 0.5,
            monitor_index: 0,
            backend: None,
        };

        let mut session = RecordingSession::new(config, &registry);
        session.start().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        let out = session.stop().await.unwrap();

        assert_eq!(out, path);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_file(&path).ok();
    }
}
