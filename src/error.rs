use qrcode::types::QrError;
use thiserror::Error;

use crate::layout::ScaleError;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("invalid backdrop scale: {0}")]
    Scale(#[from] ScaleError),

    #[error("failed to decode source image")]
    SourceImage(#[source] image::ImageError),

    #[error("failed to decode backdrop asset")]
    Backdrop(#[source] image::ImageError),

    #[error("failed to encode QR code")]
    Qr(#[from] QrError),

    #[error("QR module grid has an inconsistent shape")]
    ModuleGrid(#[from] ndarray::ShapeError),

    #[error("failed to encode output PNG")]
    Encode(#[source] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ComposeError>;
