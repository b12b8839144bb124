//! Proofshot Capture Engine
//!
//! Captures screenshots and screen recordings of a desktop environment as
//! evidence artifacts for automated test runs: whole virtual screen, a
//! single monitor, or an arbitrary rectangular region.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │               RecordingSession                   │
//! │  ┌─────────────┐  ┌───────────┐  ┌────────────┐  │
//! │  │ FrameSource │─▶│ normalize │─▶│ WebmEncoder│  │
//! │  │ (native /   │  │ (RGB,     │  │ (vp8/webm) │  │
//! │  │  generic)   │  │  scale)   │  │            │  │
//! │  └─────────────┘  └───────────┘  └─────┬──────┘  │
//! │        ▲ stop flag checked per loop    ▼         │
//! │        │                        evidence.webm    │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Single-shot capture runs the same source + normalizer pipeline once and
//! writes an image file instead of muxing into a video stream.

pub mod backend;
pub mod encoder;
pub mod frame;
pub mod report;
pub mod screenshot;
pub mod session;

pub use backend::{BackendKind, BackendRegistry, FrameSource};
pub use encoder::{FrameSink, WebmEncoder};
pub use frame::{normalize, ChannelOrder, Frame, RawFrame};
pub use screenshot::{capture_screenshot, QualitySetting, ScreenshotFormat};
pub use session::{RecordingConfig, RecordingSession, SessionState};
