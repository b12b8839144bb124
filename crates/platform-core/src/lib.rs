//! Proofshot platform core contracts.
//!
//! Cross-platform monitor and capture-geometry data structures shared by the
//! capture engine and the CLI, without coupling to a concrete grab backend.
//!
//! Monitor indexing follows the evidence-capture convention: index `0` means
//! the entire virtual screen (union of all monitors), index `n >= 1` means
//! the nth physical monitor in platform-reported order.

use serde::{Deserialize, Serialize};

use proofshot_common::error::{ProofshotError, ProofshotResult};

/// Information about a connected monitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorInfo {
    /// Monitor name/identifier.
    pub name: String,
    /// Resolution in physical pixels.
    pub width: u32,
    pub height: u32,
    /// Position in the virtual screen (pixels).
    pub x: i32,
    pub y: i32,
    /// Whether this monitor is primary.
    pub primary: bool,
}

impl MonitorInfo {
    /// Bounds of this monitor within the virtual screen.
    pub fn bounds(&self) -> Bounds {
        Bounds {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// An absolute pixel rectangle within the virtual screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    /// Whether `other` lies entirely inside these bounds.
    pub fn contains(&self, other: &Bounds) -> bool {
        let self_right = self.x as i64 + self.width as i64;
        let self_bottom = self.y as i64 + self.height as i64;
        let other_right = other.x as i64 + other.width as i64;
        let other_bottom = other.y as i64 + other.height as i64;
        other.x as i64 >= self.x as i64
            && other.y as i64 >= self.y as i64
            && other_right <= self_right
            && other_bottom <= self_bottom
    }
}

/// A caller-supplied sub-rectangle, absolute within the virtual screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            x: self.left,
            y: self.top,
            width: self.width,
            height: self.height,
        }
    }
}

/// What to capture: a monitor (0 = whole virtual screen, 1..N = physical
/// monitor) and an optional absolute sub-rectangle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureTarget {
    pub monitor_index: usize,
    pub region: Option<Region>,
}

impl CaptureTarget {
    pub fn whole_screen() -> Self {
        Self {
            monitor_index: 0,
            region: None,
        }
    }

    pub fn monitor(index: usize) -> Self {
        Self {
            monitor_index: index,
            region: None,
        }
    }
}

/// Compute virtual screen bounds that include all connected monitors.
pub fn virtual_screen_bounds(monitors: &[MonitorInfo]) -> ProofshotResult<Bounds> {
    if monitors.is_empty() {
        return Err(ProofshotError::no_window(
            "no monitors reported; is a display server running?",
        ));
    }

    let min_x = monitors.iter().map(|m| m.x).min().unwrap_or(0);
    let min_y = monitors.iter().map(|m| m.y).min().unwrap_or(0);
    let max_x = monitors
        .iter()
        .map(|m| m.x + m.width as i32)
        .max()
        .unwrap_or(0);
    let max_y = monitors
        .iter()
        .map(|m| m.y + m.height as i32)
        .max()
        .unwrap_or(0);

    Ok(Bounds {
        x: min_x,
        y: min_y,
        width: (max_x - min_x).max(1) as u32,
        height: (max_y - min_y).max(1) as u32,
    })
}

/// Resolve a capture target to absolute pixel bounds.
///
/// `monitor_index` 0 resolves to the virtual screen union; `n >= 1` resolves
/// to `monitors[n - 1]` in platform-reported order. A supplied region is
/// interpreted as absolute within the virtual screen (not relative to the
/// chosen monitor) and must lie inside it.
pub fn resolve_bounds(
    monitors: &[MonitorInfo],
    target: &CaptureTarget,
) -> ProofshotResult<Bounds> {
    let virtual_bounds = virtual_screen_bounds(monitors)?;

    let base = if target.monitor_index == 0 {
        virtual_bounds
    } else {
        monitors
            .get(target.monitor_index - 1)
            .map(MonitorInfo::bounds)
            .ok_or_else(|| {
                ProofshotError::monitor_unavailable(format!(
                    "monitor {} requested but only {} reported",
                    target.monitor_index,
                    monitors.len()
                ))
            })?
    };

    match target.region {
        None => Ok(base),
        Some(region) => {
            let region_bounds = region.bounds();
            if region.width == 0 || region.height == 0 {
                return Err(ProofshotError::crop(format!(
                    "empty region {}x{} at ({}, {})",
                    region.width, region.height, region.left, region.top
                )));
            }
            if !virtual_bounds.contains(&region_bounds) {
                return Err(ProofshotError::crop(format!(
                    "region ({}, {}, {}, {}) exceeds virtual screen {}x{} at ({}, {})",
                    region.left,
                    region.top,
                    region.width,
                    region.height,
                    virtual_bounds.width,
                    virtual_bounds.height,
                    virtual_bounds.x,
                    virtual_bounds.y
                )));
            }
            Ok(region_bounds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(name: &str, x: i32, y: i32, width: u32, height: u32, primary: bool) -> MonitorInfo {
        MonitorInfo {
            name: name.to_string(),
            width,
            height,
            x,
            y,
            primary,
        }
    }

    fn dual_layout() -> Vec<MonitorInfo> {
        vec![
            monitor("DP-1", 0, 0, 1920, 1080, true),
            monitor("HDMI-1", 1920, 0, 2560, 1440, false),
        ]
    }

    #[test]
    fn index_zero_resolves_to_virtual_union() {
        let bounds = resolve_bounds(&dual_layout(), &CaptureTarget::whole_screen()).unwrap();
        assert_eq!(
            bounds,
            Bounds {
                x: 0,
                y: 0,
                width: 4480,
                height: 1440
            }
        );
    }

    #[test]
    fn physical_monitors_are_one_based() {
        let monitors = dual_layout();
        let first = resolve_bounds(&monitors, &CaptureTarget::monitor(1)).unwrap();
        assert_eq!(first, monitors[0].bounds());

        let second = resolve_bounds(&monitors, &CaptureTarget::monitor(2)).unwrap();
        assert_eq!(second, monitors[1].bounds());
    }

    #[test]
    fn out_of_range_monitor_index_fails() {
        let err = resolve_bounds(&dual_layout(), &CaptureTarget::monitor(3)).unwrap_err();
        assert!(matches!(
            err,
            ProofshotError::MonitorUnavailable { .. }
        ));
    }

    #[test]
    fn empty_monitor_list_is_no_window() {
        let err = resolve_bounds(&[], &CaptureTarget::whole_screen()).unwrap_err();
        assert!(matches!(err, ProofshotError::NoWindow { .. }));
    }

    #[test]
    fn virtual_union_covers_negative_origin_layout() {
        let monitors = vec![
            monitor("left", -1920, 0, 1920, 1080, false),
            monitor("main", 0, -200, 2560, 1440, true),
        ];
        let bounds = virtual_screen_bounds(&monitors).unwrap();
        assert_eq!(bounds.x, -1920);
        assert_eq!(bounds.y, -200);
        assert_eq!(bounds.width, 4480);
        assert_eq!(bounds.height, 1440);
    }

    #[test]
    fn region_is_absolute_within_virtual_screen() {
        let target = CaptureTarget {
            monitor_index: 0,
            region: Some(Region {
                left: 10,
                top: 10,
                width: 100,
                height: 50,
            }),
        };
        let bounds = resolve_bounds(&dual_layout(), &target).unwrap();
        assert_eq!(
            bounds,
            Bounds {
                x: 10,
                y: 10,
                width: 100,
                height: 50
            }
        );
    }

    #[test]
    fn region_outside_virtual_screen_is_crop_error() {
        let target = CaptureTarget {
            monitor_index: 0,
            region: Some(Region {
                left: 4000,
                top: 1000,
                width: 1000,
                height: 1000,
            }),
        };
        let err = resolve_bounds(&dual_layout(), &target).unwrap_err();
        assert!(matches!(err, ProofshotError::Crop { .. }));
    }

    #[test]
    fn zero_sized_region_is_rejected() {
        let target = CaptureTarget {
            monitor_index: 0,
            region: Some(Region {
                left: 0,
                top: 0,
                width: 0,
                height: 10,
            }),
        };
        let err = resolve_bounds(&dual_layout(), &target).unwrap_err();
        assert!(matches!(err, ProofshotError::Crop { .. }));
    }
}
