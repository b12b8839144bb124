//! Native frame source built on `scrap`.
//!
//! `scrap` captures one whole display at a time through the platform's
//! shared-memory path, returning BGRA buffers whose rows may be padded out
//! to a wider stride. scrap exposes no display positions, so `monitors()`
//! lays displays out at synthetic side-by-side offsets; resolved bounds
//! then identify exactly one display, and bounds smaller than it are cut
//! out of the full grab via [`RawFrame::subregion`] rather than
//! re-captured. A rectangle spanning several displays is not grabbable
//! with this backend.

use std::io::ErrorKind;
use std::thread;
use std::time::{Duration, Instant};

use proofshot_common::error::{ProofshotError, ProofshotResult};
use proofshot_platform_core::{Bounds, MonitorInfo};

use crate::frame::{ChannelOrder, RawFrame};

use super::FrameSource;

/// How long to keep retrying a grab that reports `WouldBlock` before giving
/// up on the display.
const GRAB_DEADLINE: Duration = Duration::from_millis(500);

pub struct NativeSource {
    /// Capturer for the display currently being grabbed, lazily opened and
    /// kept across iterations so the shared-memory segment is reused.
    capturer: Option<(usize, scrap::Capturer)>,
}

impl NativeSource {
    pub fn new() -> ProofshotResult<Self> {
        let displays = scrap::Display::all().map_err(|e| {
            ProofshotError::no_window(format!("cannot open native displays: {e}"))
        })?;
        if displays.is_empty() {
            return Err(ProofshotError::no_window("no native displays reported"));
        }
        Ok(Self { capturer: None })
    }

    fn open_capturer(&mut self, index: usize) -> ProofshotResult<&mut scrap::Capturer> {
        let stale = matches!(&self.capturer, Some((current, _)) if *current != index);
        if stale {
            self.capturer = None;
        }
        if self.capturer.is_none() {
            let display = scrap::Display::all()
                .map_err(|e| ProofshotError::no_window(format!("cannot open displays: {e}")))?
                .into_iter()
                .nth(index)
                .ok_or_else(|| {
                    ProofshotError::monitor_unavailable(format!("display {index} disappeared"))
                })?;
            let capturer = scrap::Capturer::new(display).map_err(|e| {
                ProofshotError::capture(format!("cannot begin capture on display {index}: {e}"))
            })?;
            self.capturer = Some((index, capturer));
        }
        let Some((_, capturer)) = self.capturer.as_mut() else {
            return Err(ProofshotError::capture("native capturer unavailable"));
        };
        Ok(capturer)
    }
}

/// Pick the display whose bounds match the request.
///
/// The synthetic side-by-side offsets from `monitors()` make every
/// display's bounds unique, so an exact match pins the display even when
/// two displays share a resolution. A rectangle no single display contains
/// (the virtual-screen union on a multi-display setup) cannot be grabbed
/// through one capturer and is rejected.
fn display_for(monitors: &[MonitorInfo], bounds: &Bounds) -> ProofshotResult<usize> {
    if let Some(index) = monitors.iter().position(|m| m.bounds() == *bounds) {
        return Ok(index);
    }
    monitors
        .iter()
        .position(|m| m.bounds().contains(bounds))
        .ok_or_else(|| {
            ProofshotError::capture(format!(
                "bounds {}x{} at ({}, {}) do not fit a single native display; \
                 the native backend cannot grab across displays",
                bounds.width, bounds.height, bounds.x, bounds.y
            ))
        })
}

impl FrameSource for NativeSource {
    fn name(&self) -> &'static str {
        "native"
    }

    fn monitors(&self) -> ProofshotResult<Vec<MonitorInfo>> {
        let displays = scrap::Display::all().map_err(|e| {
            ProofshotError::no_window(format!("cannot enumerate displays: {e}"))
        })?;
        // scrap reports only sizes. Lay the displays out side by side at
        // synthetic offsets so every display's bounds are unique and
        // resolved bounds identify one display, even for identical
        // resolutions.
        let mut next_x = 0i32;
        Ok(displays
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let info = MonitorInfo {
                    name: format!("display-{i}"),
                    width: d.width() as u32,
                    height: d.height() as u32,
                    x: next_x,
                    y: 0,
                    primary: i == 0,
                };
                next_x += d.width() as i32;
                info
            })
            .collect())
    }

    fn grab(&mut self, bounds: &Bounds) -> ProofshotResult<RawFrame> {
        let monitors = self.monitors()?;
        let index = display_for(&monitors, bounds)?;
        let display_bounds = monitors[index].bounds();
        let capturer = self.open_capturer(index)?;
        let width = capturer.width() as u32;
        let height = capturer.height() as u32;

        // The shared-memory source reports WouldBlock until the compositor
        // publishes the next frame.
        let deadline = Instant::now() + GRAB_DEADLINE;
        let data = loop {
            match capturer.frame() {
                Ok(frame) => break frame.to_vec(),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(ProofshotError::capture(format!(
                            "display {index} produced no frame within {GRAB_DEADLINE:?}"
                        )));
                    }
                    thread::sleep(Duration::from_millis(1));
                }
                Err(e) => {
                    return Err(ProofshotError::capture(format!(
                        "grab failed on display {index}: {e}"
                    )));
                }
            }
        };

        if data.is_empty() || height == 0 {
            return Err(ProofshotError::capture(format!(
                "display {index} returned an empty frame"
            )));
        }
        // Rows may be padded; derive the real stride from the payload size.
        let stride = data.len() / height as usize;

        let full = RawFrame {
            data,
            width,
            height,
            order: ChannelOrder::Bgra,
            stride,
        };

        if *bounds == display_bounds && bounds.width == width && bounds.height == height {
            return Ok(full);
        }
        // Crop offsets are display-local; bounds carry the synthetic
        // virtual-screen offset.
        full.subregion(
            (bounds.x - display_bounds.x) as u32,
            (bounds.y - display_bounds.y) as u32,
            bounds.width,
            bounds.height,
        )
    }
}
