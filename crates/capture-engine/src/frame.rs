//! Raw frame model and normalization.
//!
//! Backends hand over frames in whatever layout their grab API produces:
//! 4-channel with alpha, blue-first channel order, or rows padded out to a
//! stride wider than `width * channels`. The normalizer turns all of that
//! into the one layout the encoders accept: a dense, row-major RGB buffer.

use proofshot_common::error::{ProofshotError, ProofshotResult};

/// Channel layout of a raw captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Rgba,
    Bgra,
}

impl ChannelOrder {
    /// Bytes per pixel.
    pub fn channels(&self) -> usize {
        match self {
            ChannelOrder::Rgb => 3,
            ChannelOrder::Rgba | ChannelOrder::Bgra => 4,
        }
    }
}

/// A frame as produced by a capture backend, before normalization.
///
/// Invariant: `data.len() == height * stride`, with `stride >=
/// width * order.channels()`. Rows may carry padding bytes beyond the
/// pixel payload.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub order: ChannelOrder,
    /// Bytes per row, including any padding.
    pub stride: usize,
}

impl RawFrame {
    /// Construct a frame with no row padding.
    pub fn packed(data: Vec<u8>, width: u32, height: u32, order: ChannelOrder) -> Self {
        let stride = width as usize * order.channels();
        Self {
            data,
            width,
            height,
            order,
            stride,
        }
    }

    fn validate(&self) -> ProofshotResult<()> {
        if self.width == 0 || self.height == 0 || self.data.is_empty() {
            return Err(ProofshotError::capture(format!(
                "empty frame ({}x{}, {} bytes)",
                self.width,
                self.height,
                self.data.len()
            )));
        }
        let min_stride = self.width as usize * self.order.channels();
        if self.stride < min_stride {
            return Err(ProofshotError::capture(format!(
                "stride {} smaller than row payload {}",
                self.stride, min_stride
            )));
        }
        if self.data.len() != self.height as usize * self.stride {
            return Err(ProofshotError::capture(format!(
                "frame byte length {} does not match height {} x stride {}",
                self.data.len(),
                self.height,
                self.stride
            )));
        }
        Ok(())
    }

    /// Crop to a sub-rectangle without re-capturing.
    ///
    /// `left`/`top` are relative to this frame's origin. Fails with a crop
    /// error when the rectangle exceeds the frame's bounds. The result is
    /// densely packed (no row padding) with the same channel order.
    pub fn subregion(&self, left: u32, top: u32, width: u32, height: u32) -> ProofshotResult<Self> {
        self.validate()?;
        if width == 0 || height == 0 {
            return Err(ProofshotError::crop(format!(
                "empty subregion {width}x{height}"
            )));
        }
        if left as u64 + width as u64 > self.width as u64
            || top as u64 + height as u64 > self.height as u64
        {
            return Err(ProofshotError::crop(format!(
                "subregion ({left}, {top}, {width}, {height}) exceeds source frame {}x{}",
                self.width, self.height
            )));
        }

        let channels = self.order.channels();
        let row_bytes = width as usize * channels;
        let mut data = Vec::with_capacity(height as usize * row_bytes);
        for row in top..top + height {
            let start = row as usize * self.stride + left as usize * channels;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }

        Ok(Self::packed(data, width, height, self.order))
    }

    /// Re-pack into a dense buffer, dropping row padding.
    fn dense_rows(&self) -> Vec<u8> {
        let row_bytes = self.width as usize * self.order.channels();
        if self.stride == row_bytes {
            return self.data.clone();
        }
        let mut dense = Vec::with_capacity(self.height as usize * row_bytes);
        for row in 0..self.height as usize {
            let start = row * self.stride;
            dense.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        dense
    }
}

/// A normalized frame: dense RGB, row-major, `len == width * height * 3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Normalize a raw frame for encoding.
///
/// Repacks padded rows, converts the channel order to RGB (encoders are
/// sensitive to the exact order; a silent swap is a correctness bug, not a
/// cosmetic one), and resizes by `scale_factor` when it is not exactly 1.0.
/// Target dimensions are `round(dim * scale_factor)` per dimension.
pub fn normalize(raw: &RawFrame, scale_factor: f64) -> ProofshotResult<Frame> {
    if !(scale_factor > 0.0 && scale_factor <= 1.0) {
        return Err(ProofshotError::config(format!(
            "scale factor {scale_factor} outside (0, 1]"
        )));
    }
    raw.validate()?;

    let dense = raw.dense_rows();
    let rgb: Vec<u8> = match raw.order {
        ChannelOrder::Rgb => dense,
        ChannelOrder::Rgba => dense
            .chunks_exact(4)
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect(),
        ChannelOrder::Bgra => dense
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0]])
            .collect(),
    };

    // scale 1.0 passes through untouched: no interpolation cost and no
    // off-by-one size drift from repeated resizing.
    if scale_factor == 1.0 {
        return Ok(Frame {
            data: rgb,
            width: raw.width,
            height: raw.height,
        });
    }

    let target_width = ((raw.width as f64 * scale_factor).round() as u32).max(1);
    let target_height = ((raw.height as f64 * scale_factor).round() as u32).max(1);

    let img = image::RgbImage::from_raw(raw.width, raw.height, rgb).ok_or_else(|| {
        ProofshotError::capture("normalized buffer does not match frame dimensions")
    })?;
    let resized = image::imageops::resize(
        &img,
        target_width,
        target_height,
        image::imageops::FilterType::Triangle,
    );

    Ok(Frame {
        data: resized.into_raw(),
        width: target_width,
        height: target_height,
    })
}
