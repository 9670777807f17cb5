//! Canvas geometry for a composition.
//!
//! Every offset and size used when stacking the layers is derived here from a
//! handful of proportions of the canvas side, so the visual contract of the
//! output lives in one place.

use thiserror::Error;

/// Side length of the square output canvas, in pixels.
pub const CANVAS_SIZE: u32 = 1000;

/// Width of the resized source image as a fraction of the canvas side.
pub const BASE_IMAGE_SCALE: f64 = 0.8;

/// Outer padding between the backdrop and the canvas edges.
pub const PADDING_SCALE: f64 = 0.02;

/// Backdrop height as a fraction of the canvas when no scale is requested.
pub const DEFAULT_BACKDROP_SCALE: f64 = 0.2;

/// Side of the QR square relative to the backdrop height.
pub const QR_TO_BACKDROP_RATIO: f64 = 0.75;

/// Byte-mode capacity of a version 40 symbol at error-correction level L.
pub const QR_MAX_DATA_BYTES: usize = 2953;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ScaleError {
    #[error("scale should be a number")]
    NotANumber,

    #[error("scale should be larger than 0, got {0}")]
    NotPositive(f64),

    #[error("scale should be less than 100, got {0}")]
    NotBelowHundred(f64),
}

/// Checks that `scale` is a percentage in the open range (0, 100).
pub fn validate_scale(scale: f64) -> Result<f64, ScaleError> {
    if scale.is_nan() {
        return Err(ScaleError::NotANumber);
    }
    if scale <= 0.0 {
        return Err(ScaleError::NotPositive(scale));
    }
    if scale >= 100.0 {
        return Err(ScaleError::NotBelowHundred(scale));
    }
    Ok(scale)
}

/// Top-left placement of a layer on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub top: i64,
    pub left: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub padding: u32,
    pub base_width: u32,
    pub backdrop_height: u32,
    pub qr_width: u32,
    /// Gap that centers the QR square inside the backdrop band.
    pub qr_backdrop_padding: u32,
}

impl Layout {
    /// Computes the geometry for an optional backdrop scale given as a
    /// percentage of the canvas height.
    pub fn new(scale: Option<f64>) -> Result<Self, ScaleError> {
        let backdrop_scale = match scale {
            Some(percent) => validate_scale(percent)? / 100.0,
            None => DEFAULT_BACKDROP_SCALE,
        };

        let padding = fraction_of(CANVAS_SIZE, PADDING_SCALE);
        let base_width = fraction_of(CANVAS_SIZE, BASE_IMAGE_SCALE);
        let backdrop_height = fraction_of(CANVAS_SIZE, backdrop_scale);
        let qr_width = fraction_of(backdrop_height, QR_TO_BACKDROP_RATIO);
        let qr_backdrop_padding = (backdrop_height - qr_width) / 2;

        Ok(Self {
            padding,
            base_width,
            backdrop_height,
            qr_width,
            qr_backdrop_padding,
        })
    }

    pub fn canvas_size(&self) -> u32 {
        CANVAS_SIZE
    }

    /// The source image is always anchored at the canvas origin.
    pub fn base_origin(&self) -> Origin {
        Origin { top: 0, left: 0 }
    }

    pub fn backdrop_origin(&self) -> Origin {
        Origin {
            top: i64::from(CANVAS_SIZE) - i64::from(self.backdrop_height) - i64::from(self.padding),
            left: i64::from(self.padding),
        }
    }

    pub fn qr_origin(&self) -> Origin {
        Origin {
            top: i64::from(CANVAS_SIZE)
                - i64::from(self.qr_width)
                - i64::from(self.padding)
                - i64::from(self.qr_backdrop_padding),
            left: i64::from(self.padding) + i64::from(self.qr_backdrop_padding),
        }
    }
}

fn fraction_of(length: u32, fraction: f64) -> u32 {
    (f64::from(length) * fraction).floor() as u32
}
