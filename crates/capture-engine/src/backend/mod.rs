//! Frame source backends.
//!
//! Two interchangeable implementations of "enumerate monitors, grab pixels
//! for a bounds rectangle": a generic cross-platform backend and a native
//! display backend. Availability is probed once at construction through
//! [`BackendRegistry`] rather than checked ad hoc at call sites, so the
//! engine degrades gracefully when one backend's native libraries are not
//! usable on the running platform.

mod generic;
mod native;

use std::fmt;
use std::str::FromStr;

use proofshot_common::error::{ProofshotError, ProofshotResult};
use proofshot_platform_core::{Bounds, MonitorInfo};

use crate::frame::RawFrame;

pub use generic::GenericSource;
pub use native::NativeSource;

/// A screen-pixel source: one of the two capture backends, after
/// construction.
pub trait FrameSource {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Enumerate monitors with their bounds, in stable platform order.
    fn monitors(&self) -> ProofshotResult<Vec<MonitorInfo>>;

    /// Grab one raw pixel frame for an absolute bounds rectangle.
    fn grab(&mut self, bounds: &Bounds) -> ProofshotResult<RawFrame>;
}

/// Which backend implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Native display capture (shared-memory grabs of the root display).
    Native,
    /// Generic cross-platform capture (per-monitor RGBA grabs).
    #[default]
    Generic,
}

impl BackendKind {
    /// Construct the frame source for this backend.
    pub fn create(&self) -> ProofshotResult<Box<dyn FrameSource>> {
        match self {
            BackendKind::Native => Ok(Box::new(NativeSource::new()?)),
            BackendKind::Generic => Ok(Box::new(GenericSource::new()?)),
        }
    }

    fn probe(&self) -> bool {
        match self.create() {
            Ok(source) => match source.monitors() {
                Ok(monitors) => !monitors.is_empty(),
                Err(e) => {
                    tracing::debug!(backend = %self, error = %e, "Backend probe failed");
                    false
                }
            },
            Err(e) => {
                tracing::debug!(backend = %self, error = %e, "Backend unavailable");
                false
            }
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => write!(f, "native"),
            BackendKind::Generic => write!(f, "generic"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ProofshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(BackendKind::Native),
            "generic" => Ok(BackendKind::Generic),
            other => Err(ProofshotError::config(format!(
                "unknown backend '{other}' (expected 'native' or 'generic')"
            ))),
        }
    }
}

/// Which backends are usable on this platform, probed once at process start
/// and passed by reference into whoever needs a frame source.
#[derive(Debug, Clone)]
pub struct BackendRegistry {
    available: Vec<BackendKind>,
}

impl BackendRegistry {
    /// Probe both backends by attempting construction and a monitor
    /// enumeration.
    pub fn probe() -> Self {
        let available: Vec<BackendKind> = [BackendKind::Generic, BackendKind::Native]
            .into_iter()
            .filter(BackendKind::probe)
            .collect();
        tracing::info!(?available, "Capture backends probed");
        Self { available }
    }

    /// Registry with a fixed availability set (tests, forced configs).
    pub fn with_available(available: Vec<BackendKind>) -> Self {
        Self { available }
    }

    pub fn is_available(&self, kind: BackendKind) -> bool {
        self.available.contains(&kind)
    }

    pub fn available(&self) -> &[BackendKind] {
        &self.available
    }

    /// Pick a backend. An explicit request must be available; with no
    /// request the generic backend is preferred, falling back to native.
    pub fn select(&self, requested: Option<BackendKind>) -> ProofshotResult<BackendKind> {
        match requested {
            Some(kind) if self.is_available(kind) => Ok(kind),
            Some(kind) => Err(ProofshotError::unsupported_backend(format!(
                "{kind} backend is not usable on this platform"
            ))),
            None => self
                .available
                .iter()
                .copied()
                .find(|k| *k == BackendKind::Generic)
                .or_else(|| self.available.first().copied())
                .ok_or_else(|| {
                    ProofshotError::unsupported_backend(
                        "no capture backend is usable on this platform",
                    )
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_parse_case_insensitively() {
        assert_eq!("Native".parse::<BackendKind>().unwrap(), BackendKind::Native);
        assert_eq!(
            "GENERIC".parse::<BackendKind>().unwrap(),
            BackendKind::Generic
        );
        assert_eq!(
            " generic ".parse::<BackendKind>().unwrap(),
            BackendKind::Generic
        );
        assert!("pygtk".parse::<BackendKind>().is_err());
    }

    #[test]
    fn default_selection_prefers_generic() {
        let registry =
            BackendRegistry::with_available(vec![BackendKind::Native, BackendKind::Generic]);
        assert_eq!(registry.select(None).unwrap(), BackendKind::Generic);
    }

    #[test]
    fn selection_falls_back_to_whatever_is_left() {
        let registry = BackendRegistry::with_available(vec![BackendKind::Native]);
        assert_eq!(registry.select(None).unwrap(), BackendKind::Native);
    }

    #[test]
    fn explicit_request_for_missing_backend_fails() {
        let registry = BackendRegistry::with_available(vec![BackendKind::Generic]);
        let err = registry.select(Some(BackendKind::Native)).unwrap_err();
        assert!(matches!(err, ProofshotError::UnsupportedBackend { .. }));
    }

    #[test]
    fn empty_registry_fails_selection() {
        let registry = BackendRegistry::with_available(vec![]);
        let err = registry.select(None).unwrap_err();
        assert!(matches!(err, ProofshotError::UnsupportedBackend { .. }));
    }
}
