//! Video output sink.
//!
//! [`WebmEncoder`] muxes normalized RGB frames into a VP8-coded WebM file
//! through a GStreamer push pipeline:
//!
//! ```text
//! appsrc (RGB) → videoconvert → vp8enc → webmmux → filesink
//! ```
//!
//! The caps pin the exact frame size and the container frame rate; the
//! encoder therefore refuses frames whose dimensions differ from the ones
//! the stream was opened with.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::AppSrc;

use proofshot_common::error::{ProofshotError, ProofshotResult};

use crate::frame::Frame;

/// Where the recording loop appends normalized frames.
///
/// The concrete sink is the WebM encoder; tests substitute an in-memory
/// implementation.
pub trait FrameSink {
    /// Append one frame to the output stream, in capture order.
    fn append(&mut self, frame: &Frame) -> ProofshotResult<()>;

    /// Flush and finalize the output. Idempotent.
    fn close(&mut self) -> ProofshotResult<()>;

    /// Frames appended so far.
    fn frames_written(&self) -> u64;
}

pub struct WebmEncoder {
    pipeline: gst::Pipeline,
    appsrc: AppSrc,
    path: PathBuf,
    width: u32,
    height: u32,
    fps: u32,
    frames: u64,
    closed: bool,
}

impl WebmEncoder {
    /// Open a WebM stream at `path` with fixed frame dimensions and the
    /// container frame rate. Dimensions come from the first observed frame
    /// and hold for the life of the stream.
    pub fn open(path: &Path, width: u32, height: u32, fps: u32) -> ProofshotResult<Self> {
        if fps == 0 {
            return Err(ProofshotError::config("frame rate must be positive"));
        }
        if width == 0 || height == 0 {
            return Err(ProofshotError::encode(format!(
                "cannot open a {width}x{height} stream"
            )));
        }
        init_gstreamer()?;

        let location = escape_path(path);
        let keyint = fps.saturating_mul(2).max(2);
        // deadline=1 puts vp8enc in realtime mode so encoding keeps up with
        // the capture loop instead of buffering frames.
        let launch = format!(
            "appsrc name=src is-live=true format=time \
                 caps=\"video/x-raw,format=RGB,width={width},height={height},framerate={fps}/1\" \
             ! videoconvert \
             ! vp8enc deadline=1 keyframe-max-dist={keyint} \
             ! webmmux \
             ! filesink location=\"{location}\""
        );

        let pipeline = gst::parse::launch(&launch)
            .map_err(|e| ProofshotError::encode(format!("failed to build encode pipeline: {e}")))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| ProofshotError::encode("launch string did not produce a pipeline"))?;

        let appsrc = pipeline
            .by_name("src")
            .ok_or_else(|| ProofshotError::encode("appsrc element missing from pipeline"))?
            .downcast::<AppSrc>()
            .map_err(|_| ProofshotError::encode("element 'src' is not an appsrc"))?;

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| ProofshotError::encode(format!("failed to start encode pipeline: {e:?}")))?;

        tracing::debug!(path = %path.display(), width, height, fps, "WebM stream opened");

        Ok(Self {
            pipeline,
            appsrc,
            path: path.to_path_buf(),
            width,
            height,
            fps,
            frames: 0,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain the pipeline after EOS so the muxer finalizes the container.
    /// Without this the tail of the recording can be truncated.
    fn drain_eos(&self) {
        let Some(bus) = self.pipeline.bus() else {
            return;
        };
        let deadline = Duration::from_secs(10);
        let start = std::time::Instant::now();
        loop {
            let elapsed = start.elapsed();
            if elapsed >= deadline {
                tracing::warn!("EOS drain timed out; output may be truncated");
                break;
            }
            let remaining = deadline - elapsed;
            match bus.timed_pop(gst::ClockTime::from_nseconds(remaining.as_nanos() as u64)) {
                Some(msg) => match msg.view() {
                    gst::MessageView::Eos(_) => break,
                    gst::MessageView::Error(e) => {
                        tracing::warn!(error = %e.error(), "Pipeline error during EOS drain");
                        break;
                    }
                    _ => {}
                },
                None => {
                    tracing::warn!("EOS drain timed out; output may be truncated");
                    break;
                }
            }
        }
    }
}

impl FrameSink for WebmEncoder {
    fn append(&mut self, frame: &Frame) -> ProofshotResult<()> {
        if self.closed {
            return Err(ProofshotError::encode("stream already closed"));
        }
        if frame.width != self.width || frame.height != self.height {
            return Err(ProofshotError::encode(format!(
                "frame {}x{} does not match stream opened at {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }

        let mut buffer = gst::Buffer::with_size(frame.data.len())
            .map_err(|e| ProofshotError::encode(format!("buffer allocation failed: {e}")))?;
        {
            let buffer = buffer.get_mut().ok_or_else(|| {
                ProofshotError::encode("freshly allocated buffer is not writable")
            })?;
            let pts_ns = self.frames * 1_000_000_000 / self.fps as u64;
            buffer.set_pts(gst::ClockTime::from_nseconds(pts_ns));
            buffer.set_duration(gst::ClockTime::from_nseconds(
                1_000_000_000 / self.fps as u64,
            ));
            let mut map = buffer
                .map_writable()
                .map_err(|_| ProofshotError::encode("failed to map buffer writable"))?;
            map.copy_from_slice(&frame.data);
        }

        self.appsrc
            .push_buffer(buffer)
            .map_err(|e| ProofshotError::encode(format!("appsrc rejected frame: {e:?}")))?;
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self) -> ProofshotResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.appsrc.end_of_stream().is_err() {
            tracing::warn!("Failed to send EOS; output may be truncated");
        } else {
            self.drain_eos();
        }

        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| ProofshotError::encode(format!("failed to stop encode pipeline: {e:?}")))?;

        tracing::debug!(frames = self.frames, path = %self.path.display(), "WebM stream closed");
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames
    }
}

impl Drop for WebmEncoder {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.appsrc.end_of_stream();
            self.pipeline.set_state(gst::State::Null).ok();
        }
    }
}

fn init_gstreamer() -> ProofshotResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(ProofshotError::encode(format!(
            "failed to initialize GStreamer: {e}"
        ))),
    }
}

fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "requires GStreamer vp8enc/webmmux plugins"]
    fn encodes_a_short_stream() {
        let dir = std::env::temp_dir();
        let path = dir.join("proofshot-encoder-test.webm");
        let frame = Frame {
            data: vec![0x40; 64 * 48 * 3],
            width: 64,
            height: 48,
        };

        let mut encoder = WebmEncoder::open(&path, 64, 48, 10).unwrap();
        for _ in 0..5 {
            encoder.append(&frame).unwrap();
        }
        encoder.close().unwrap();

        assert_eq!(encoder.frames_written(), 5);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    #[ignore = "requires GStreamer vp8enc/webmmux plugins"]
    fn rejects_frames_of_a_different_size() {
        let path = std::env::temp_dir().join("proofshot-encoder-mismatch.webm");
        let mut encoder = WebmEncoder::open(&path, 64, 48, 10).unwrap();
        let wrong = Frame {
            data: vec![0; 32 * 48 * 3],
            width: 32,
            height: 48,
        };
        let err = encoder.append(&wrong).unwrap_err();
        assert!(matches!(err, ProofshotError::Encode { .. }));
        encoder.close().unwrap();
        std::fs::remove_file(&path).ok();
    }
}
