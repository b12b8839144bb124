//! Single-shot screenshot capture.
//!
//! Same geometry + grab + normalize pipeline as the recording loop, but one
//! invocation, written straight to an image file. The output format comes
//! from the file extension; the caller's 0-100 quality integer maps to a
//! compression level for lossless formats and a quality percentage for
//! lossy ones.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use proofshot_common::error::{ProofshotError, ProofshotResult};
use proofshot_platform_core::{resolve_bounds, virtual_screen_bounds, CaptureTarget};

use crate::backend::{BackendKind, BackendRegistry, FrameSource};
use crate::frame::{normalize, Frame};

/// Supported screenshot formats, selected by output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotFormat {
    Png,
    Jpeg,
}

impl ScreenshotFormat {
    pub fn from_path(path: &Path) -> ProofshotResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(ProofshotError::config(format!(
                "unsupported screenshot extension '{other}' (expected png, jpg, or jpeg)"
            ))),
        }
    }

    /// Whether the format is lossless (quality means compression effort)
    /// or lossy (quality means quality percentage).
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Png)
    }
}

/// Format-dependent interpretation of the caller's quality integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualitySetting {
    /// Lossless: how hard to compress.
    Compression(CompressionLevel),
    /// Lossy: quality percentage, 1-100.
    Percent(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    Fast,
    Default,
    Best,
}

impl QualitySetting {
    /// Derive the setting for a format from one 0-100 quality integer.
    pub fn for_format(format: ScreenshotFormat, quality: u8) -> Self {
        let quality = quality.min(100);
        match format {
            ScreenshotFormat::Png => QualitySetting::Compression(match quality {
                0..=25 => CompressionLevel::Fast,
                26..=75 => CompressionLevel::Default,
                _ => CompressionLevel::Best,
            }),
            ScreenshotFormat::Jpeg => QualitySetting::Percent(quality.max(1)),
        }
    }
}

impl From<CompressionLevel> for CompressionType {
    fn from(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Fast => CompressionType::Fast,
            CompressionLevel::Default => CompressionType::Default,
            CompressionLevel::Best => CompressionType::Best,
        }
    }
}

/// Capture one screenshot of `target` and write it to `path`.
///
/// Partial capture grabs the full virtual screen once and cuts the region
/// out of that frame; nothing is re-captured.
pub fn capture_screenshot(
    registry: &BackendRegistry,
    backend: Option<BackendKind>,
    target: &CaptureTarget,
    path: &Path,
    quality: u8,
) -> ProofshotResult<PathBuf> {
    let format = ScreenshotFormat::from_path(path)?;
    let kind = registry.select(backend)?;
    let mut source = kind.create()?;

    let frame = grab_screenshot_frame(source.as_mut(), target)?;
    write_frame(&frame, path, format, quality)?;

    tracing::info!(
        backend = %kind,
        width = frame.width,
        height = frame.height,
        path = %path.display(),
        "Screenshot saved"
    );
    Ok(path.to_path_buf())
}

/// Resolve, grab, crop, normalize: everything up to encoding.
fn grab_screenshot_frame(
    source: &mut dyn FrameSource,
    target: &CaptureTarget,
) -> ProofshotResult<Frame> {
    let monitors = source.monitors()?;
    let bounds = resolve_bounds(&monitors, target)?;

    let raw = match target.region {
        None => source.grab(&bounds)?,
        Some(_) => {
            // Full-screen grab once, then the crop contract; region bounds
            // are absolute within the virtual screen.
            let virtual_bounds = virtual_screen_bounds(&monitors)?;
            let full = source.grab(&virtual_bounds)?;
            full.subregion(
                (bounds.x - virtual_bounds.x) as u32,
                (bounds.y - virtual_bounds.y) as u32,
                bounds.width,
                bounds.height,
            )?
        }
    };

    normalize(&raw, 1.0)
}

/// Encode a normalized frame to `path` with the format's quality setting.
fn write_frame(
    frame: &Frame,
    path: &Path,
    format: ScreenshotFormat,
    quality: u8,
) -> ProofshotResult<()> {
    if frame.width == 0 || frame.height == 0 || frame.data.is_empty() {
        return Err(ProofshotError::capture("captured frame is empty"));
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    match QualitySetting::for_format(format, quality) {
        QualitySetting::Compression(level) => {
            let encoder = PngEncoder::new_with_quality(
                writer,
                level.into(),
                image::codecs::png::FilterType::Adaptive,
            );
            encoder
                .write_image(
                    &frame.data,
                    frame.width,
                    frame.height,
                    ExtendedColorType::Rgb8,
                )
                .map_err(|e| ProofshotError::encode(format!("png encode failed: {e}")))?;
        }
        QualitySetting::Percent(percent) => {
            let encoder = JpegEncoder::new_with_quality(writer, percent);
            encoder
                .write_image(
                    &frame.data,
                    frame.width,
                    frame.height,
                    ExtendedColorType::Rgb8,
                )
                .map_err(|e| ProofshotError::encode(format!("jpeg encode failed: {e}")))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofshot_platform_core::{Bounds, MonitorInfo, Region};

    use crate::frame::{ChannelOrder, RawFrame};

    struct FlatSource {
        width: u32,
        height: u32,
    }

    impl FrameSource for FlatSource {
        fn name(&self) -> &'static str {
            "flat"
        }

        fn monitors(&self) -> ProofshotResult<Vec<MonitorInfo>> {
            Ok(vec![MonitorInfo {
                name: "flat".to_string(),
                width: self.width,
                height: self.height,
                x: 0,
                y: 0,
                primary: true,
            }])
        }

        fn grab(&mut self, bounds: &Bounds) -> ProofshotResult<RawFrame> {
            Ok(RawFrame::packed(
                vec![0x55; (bounds.width * bounds.height) as usize * 4],
                bounds.width,
                bounds.height,
                ChannelOrder::Rgba,
            ))
        }
    }

    #[test]
    fn format_comes_from_extension_case_insensitively() {
        assert_eq!(
            ScreenshotFormat::from_path(Path::new("shot.PNG")).unwrap(),
            ScreenshotFormat::Png
        );
        assert_eq!(
            ScreenshotFormat::from_path(Path::new("shot.jpeg")).unwrap(),
            ScreenshotFormat::Jpeg
        );
        assert!(ScreenshotFormat::from_path(Path::new("shot.gif")).is_err());
        assert!(ScreenshotFormat::from_path(Path::new("shot")).is_err());
    }

    #[test]
    fn quality_maps_to_compression_for_png_and_percent_for_jpeg() {
        assert_eq!(
            QualitySetting::for_format(ScreenshotFormat::Png, 10),
            QualitySetting::Compression(CompressionLevel::Fast)
        );
        assert_eq!(
            QualitySetting::for_format(ScreenshotFormat::Png, 50),
            QualitySetting::Compression(CompressionLevel::Default)
        );
        assert_eq!(
            QualitySetting::for_format(ScreenshotFormat::Png, 90),
            QualitySetting::Compression(CompressionLevel::Best)
        );
        assert_eq!(
            QualitySetting::for_format(ScreenshotFormat::Jpeg, 70),
            QualitySetting::Percent(70)
        );
        // 0 is not a legal jpeg quality; it clamps up.
        assert_eq!(
            QualitySetting::for_format(ScreenshotFormat::Jpeg, 0),
            QualitySetting::Percent(1)
        );
    }

    #[test]
    fn region_capture_produces_exact_dimensions() {
        let mut source = FlatSource {
            width: 1920,
            height: 1080,
        };
        let target = CaptureTarget {
            monitor_index: 0,
            region: Some(Region {
                left: 10,
                top: 10,
                width: 100,
                height: 50,
            }),
        };
        let frame = grab_screenshot_frame(&mut source, &target).unwrap();
        assert_eq!((frame.width, frame.height), (100, 50));
        assert_eq!(frame.data.len(), 100 * 50 * 3);
    }

    #[test]
    fn whole_monitor_capture_matches_monitor_bounds() {
        let mut source = FlatSource {
            width: 800,
            height: 600,
        };
        let frame = grab_screenshot_frame(&mut source, &CaptureTarget::monitor(1)).unwrap();
        assert_eq!((frame.width, frame.height), (800, 600));
    }

    #[test]
    fn written_png_reloads_with_same_dimensions() {
        let frame = Frame {
            data: vec![0x33; 20 * 12 * 3],
            width: 20,
            height: 12,
        };
        let path = std::env::temp_dir().join("proofshot-write-frame-test.png");
        write_frame(&frame, &path, ScreenshotFormat::Png, 50).unwrap();

        let reloaded = image::open(&path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (20, 12));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_frame_is_a_capture_error() {
        let frame = Frame {
            data: vec![],
            width: 0,
            height: 0,
        };
        let path = std::env::temp_dir().join("proofshot-empty-frame.png");
        let err = write_frame(&frame, &path, ScreenshotFormat::Png, 50).unwrap_err();
        assert!(matches!(err, ProofshotError::Capture { .. }));
    }
}
