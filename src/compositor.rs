//! Stacks the source photo, the backdrop and the QR code onto one canvas.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageOutputFormat, Rgba, RgbaImage};

use crate::error::{ComposeError, Result};
use crate::layout::{Layout, Origin};
use crate::qr::{self, DARK_MODULE, LIGHT_MODULE};

/// Backdrop drawn behind the QR code when none is supplied.
const DEFAULT_BACKDROP: &[u8] = include_bytes!("../assets/backdrop.png");

const CANVAS_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A raster positioned on the canvas.
#[derive(Debug, Clone)]
pub struct Layer {
    pub image: RgbaImage,
    pub origin: Origin,
}

impl Layer {
    pub fn new(image: RgbaImage, origin: Origin) -> Self {
        Self { image, origin }
    }

    fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}

#[derive(Debug, Clone)]
pub struct Compositor {
    backdrop: DynamicImage,
}

impl Compositor {
    /// Uses the backdrop bundled with the crate.
    pub fn new() -> Result<Self> {
        Self::with_backdrop(DEFAULT_BACKDROP)
    }

    /// Uses a custom backdrop. Only its height is fitted to the layout, so an
    /// asset that is not square will no longer center the QR code.
    pub fn with_backdrop(bytes: &[u8]) -> Result<Self> {
        let backdrop = image::load_from_memory(bytes).map_err(ComposeError::Backdrop)?;
        Ok(Self { backdrop })
    }

    /// Composes the encoded `photo` with a QR code for `data` and returns the
    /// PNG bytes.
    ///
    /// `scale` is the backdrop height as a percentage of the canvas and must
    /// lie strictly between 0 and 100.
    pub fn compose(&self, photo: &[u8], data: &str, scale: Option<f64>) -> Result<Vec<u8>> {
        let layout = Layout::new(scale)?;
        tracing::debug!(?layout, "computed layout");

        let source = image::load_from_memory(photo).map_err(ComposeError::SourceImage)?;
        let base = resize_to_width(&source, layout.base_width);
        let backdrop = resize_to_height(&self.backdrop, layout.backdrop_height);

        let modules = qr::encode_modules(data)?;
        let code = qr::render_modules(&modules, layout.qr_width, DARK_MODULE, LIGHT_MODULE);
        if code.width() > layout.qr_width {
            tracing::warn!(
                modules = modules.nrows(),
                qr_width = layout.qr_width,
                "QR code needs more pixels than the backdrop allows, drawing one pixel per module"
            );
        }
        let qr_origin = keep_on_canvas(layout.qr_origin(), code.width(), layout.canvas_size());

        let layers = [
            Layer::new(base, layout.base_origin()),
            Layer::new(backdrop, layout.backdrop_origin()),
            Layer::new(code, qr_origin),
        ];
        let canvas = flatten(layout.canvas_size(), &layers);

        encode_png(canvas)
    }
}

/// Draws `layers` in order onto a blank white canvas, clipping at its edges.
pub fn flatten(size: u32, layers: &[Layer]) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(size, size, CANVAS_BACKGROUND);

    for layer in layers.iter().filter(|layer| !layer.is_empty()) {
        tracing::debug!(
            width = layer.image.width(),
            height = layer.image.height(),
            top = layer.origin.top,
            left = layer.origin.left,
            "placing layer"
        );
        imageops::overlay(&mut canvas, &layer.image, layer.origin.left, layer.origin.top);
    }

    canvas
}

/// Pulls a square of `side` pixels back inside the canvas so no part of it is
/// clipped.
fn keep_on_canvas(origin: Origin, side: u32, canvas: u32) -> Origin {
    let limit = i64::from(canvas) - i64::from(side);
    Origin {
        top: origin.top.min(limit).max(0),
        left: origin.left.min(limit).max(0),
    }
}

fn resize_to_width(img: &DynamicImage, width: u32) -> RgbaImage {
    let height = scaled_side(img.height(), width, img.width());
    resize(img, width, height)
}

fn resize_to_height(img: &DynamicImage, height: u32) -> RgbaImage {
    let width = scaled_side(img.width(), height, img.height());
    resize(img, width, height)
}

fn resize(img: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    if width == 0 || height == 0 {
        return RgbaImage::new(0, 0);
    }
    img.resize_exact(width, height, FilterType::Lanczos3).to_rgba8()
}

/// Length of the free side when `fixed` is scaled to `target`, keeping the
/// aspect ratio.
fn scaled_side(free: u32, target: u32, fixed: u32) -> u32 {
    if target == 0 || fixed == 0 {
        return 0;
    }
    let side = (f64::from(free) * f64::from(target) / f64::from(fixed)).round() as u32;
    side.max(1)
}

fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut out, ImageOutputFormat::Png)
        .map_err(ComposeError::Encode)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_side_keeps_aspect_ratio() {
        assert_eq!(scaled_side(300, 800, 400), 600);
        assert_eq!(scaled_side(256, 200, 256), 200);
        assert_eq!(scaled_side(1, 800, 4000), 1);
        assert_eq!(scaled_side(256, 0, 256), 0);
    }

    #[test]
    fn oversized_square_is_pulled_onto_the_canvas() {
        let origin = Origin { top: 972, left: 21 };
        assert_eq!(keep_on_canvas(origin, 177, 1000), Origin { top: 823, left: 21 });
        assert_eq!(keep_on_canvas(origin, 7, 1000), origin);
    }

    #[test]
    fn default_backdrop_decodes() {
        let compositor = Compositor::new().unwrap();
        assert_eq!(compositor.backdrop.width(), compositor.backdrop.height());
    }

    #[test]
    fn bad_backdrop_is_rejected() {
        let err = Compositor::with_backdrop(b"not an image").unwrap_err();
        assert!(matches!(err, ComposeError::Backdrop(_)));
    }

    #[test]
    fn flatten_stacks_in_order_and_clips() {
        let red = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));
        let layers = [
            Layer::new(red, Origin { top: 0, left: 0 }),
            Layer::new(blue, Origin { top: 5, left: 5 }),
            Layer::new(RgbaImage::new(0, 0), Origin { top: 0, left: 0 }),
        ];
        let canvas = flatten(12, &layers);

        assert_eq!(*canvas.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(6, 6), Rgba([0, 0, 255, 255]));
        assert_eq!(*canvas.get_pixel(11, 11), Rgba([0, 0, 255, 255]));
        assert_eq!(*canvas.get_pixel(11, 0), CANVAS_BACKGROUND);
    }

    #[test]
    fn transparent_pixels_keep_what_is_below() {
        let clear = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let canvas = flatten(4, &[Layer::new(clear, Origin { top: 0, left: 0 })]);
        assert_eq!(*canvas.get_pixel(2, 2), CANVAS_BACKGROUND);
    }

    #[test]
    fn invalid_scale_is_reported_before_decoding() {
        let compositor = Compositor::new().unwrap();
        let err = compositor.compose(b"garbage", "data", Some(100.0)).unwrap_err();
        assert!(matches!(err, ComposeError::Scale(_)));
    }

    #[test]
    fn corrupt_source_is_reported() {
        let compositor = Compositor::new().unwrap();
        let err = compositor.compose(b"garbage", "data", None).unwrap_err();
        assert!(matches!(err, ComposeError::SourceImage(_)));
    }
}
