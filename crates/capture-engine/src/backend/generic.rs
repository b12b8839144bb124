//! Generic cross-platform frame source built on `xcap`.
//!
//! Grabs are per-monitor RGBA images with true virtual-screen geometry.
//! Bounds that span several monitors (the whole-virtual-screen case on a
//! multi-head layout) are composited monitor by monitor into one buffer.

use proofshot_common::error::{ProofshotError, ProofshotResult};
use proofshot_platform_core::{Bounds, MonitorInfo};

use crate::frame::{ChannelOrder, RawFrame};

use super::FrameSource;

pub struct GenericSource {
    monitors: Vec<xcap::Monitor>,
}

impl GenericSource {
    pub fn new() -> ProofshotResult<Self> {
        let monitors = xcap::Monitor::all().map_err(|e| {
            ProofshotError::no_window(format!("cannot enumerate monitors: {e}"))
        })?;
        if monitors.is_empty() {
            return Err(ProofshotError::no_window("no monitors reported"));
        }
        Ok(Self { monitors })
    }
}

impl FrameSource for GenericSource {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn monitors(&self) -> ProofshotResult<Vec<MonitorInfo>> {
        Ok(self
            .monitors
            .iter()
            .map(|m| MonitorInfo {
                name: m.name().to_string(),
                width: m.width(),
                height: m.height(),
                x: m.x(),
                y: m.y(),
                primary: m.is_primary(),
            })
            .collect())
    }

    fn grab(&mut self, bounds: &Bounds) -> ProofshotResult<RawFrame> {
        let stride = bounds.width as usize * 4;
        let mut data = vec![0u8; bounds.height as usize * stride];
        let mut covered = false;

        for monitor in &self.monitors {
            let Some((dst_x, dst_y, src_x, src_y, w, h)) = intersect(bounds, monitor) else {
                continue;
            };

            let img = monitor.capture_image().map_err(|e| {
                ProofshotError::capture(format!(
                    "grab failed on monitor '{}': {e}",
                    monitor.name()
                ))
            })?;
            if img.width() == 0 || img.height() == 0 {
                return Err(ProofshotError::capture(format!(
                    "monitor '{}' returned an empty frame",
                    monitor.name()
                )));
            }

            // On scaled displays the captured image's pixel dimensions can
            // differ from the monitor's reported logical size; clamp the
            // copy so the row slices stay inside the image.
            let Some((w, h)) = clamp_copy(src_x, src_y, w, h, img.width(), img.height()) else {
                continue;
            };

            let src = img.as_raw();
            let src_stride = img.width() as usize * 4;
            for row in 0..h as usize {
                let src_start = (src_y as usize + row) * src_stride + src_x as usize * 4;
                let dst_start = (dst_y as usize + row) * stride + dst_x as usize * 4;
                let len = w as usize * 4;
                data[dst_start..dst_start + len]
                    .copy_from_slice(&src[src_start..src_start + len]);
            }
            covered = true;
        }

        if !covered {
            return Err(ProofshotError::capture(format!(
                "bounds {}x{} at ({}, {}) intersect no monitor",
                bounds.width, bounds.height, bounds.x, bounds.y
            )));
        }

        Ok(RawFrame::packed(
            data,
            bounds.width,
            bounds.height,
            ChannelOrder::Rgba,
        ))
    }
}

/// Intersect requested bounds with a monitor.
///
/// Returns `(dst_x, dst_y, src_x, src_y, width, height)`: the destination
/// offset within the requested bounds and the source offset within the
/// monitor's own image.
fn intersect(bounds: &Bounds, monitor: &xcap::Monitor) -> Option<(u32, u32, u32, u32, u32, u32)> {
    let left = bounds.x.max(monitor.x());
    let top = bounds.y.max(monitor.y());
    let right = (bounds.x + bounds.width as i32).min(monitor.x() + monitor.width() as i32);
    let bottom = (bounds.y + bounds.height as i32).min(monitor.y() + monitor.height() as i32);
    if left >= right || top >= bottom {
        return None;
    }
    Some((
        (left - bounds.x) as u32,
        (top - bounds.y) as u32,
        (left - monitor.x()) as u32,
        (top - monitor.y()) as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Clamp a copy rectangle to what the captured image actually contains.
fn clamp_copy(
    src_x: u32,
    src_y: u32,
    width: u32,
    height: u32,
    img_width: u32,
    img_height: u32,
) -> Option<(u32, u32)> {
    let width = width.min(img_width.saturating_sub(src_x));
    let height = height.min(img_height.saturating_sub(src_y));
    (width > 0 && height > 0).then_some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_rectangle_never_exceeds_the_captured_image() {
        // Monitor reports 1920x1080 but the grab came back 1600x900.
        assert_eq!(clamp_copy(0, 0, 1920, 1080, 1600, 900), Some((1600, 900)));
        // Offset copy that would run past the right edge.
        assert_eq!(clamp_copy(1500, 0, 500, 900, 1600, 900), Some((100, 900)));
        // Rectangle fully inside the image is untouched.
        assert_eq!(clamp_copy(100, 50, 500, 400, 1920, 1080), Some((500, 400)));
        // Offset beyond the image leaves nothing to copy.
        assert_eq!(clamp_copy(1920, 0, 100, 100, 1920, 1080), None);
    }

    #[test]
    #[ignore = "requires graphical display"]
    fn live_grab_matches_requested_bounds() {
        let mut source = GenericSource::new().unwrap();
        let monitors = source.monitors().unwrap();
        let bounds = monitors[0].bounds();
        let frame = source.grab(&bounds).unwrap();
        assert_eq!((frame.width, frame.height), (bounds.width, bounds.height));
        assert_eq!(frame.data.len(), bounds.height as usize * frame.stride);
    }
}
