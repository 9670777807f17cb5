use image::{ImageBuffer, Rgba, RgbaImage};
use ndarray::Array2;
use qrcode::{EcLevel, QrCode};

use crate::error::Result;

/// Module color used for dark QR modules. Inverted so the code reads as light
/// modules on the dark backdrop.
pub const DARK_MODULE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Fill color behind the dark modules.
pub const LIGHT_MODULE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Encodes `data` at error-correction level L and returns the module grid,
/// indexed `[row, col]`, with `true` for dark modules.
pub fn encode_modules(data: &str) -> Result<Array2<bool>> {
    let code = QrCode::with_error_correction_level(data, EcLevel::L)?;

    let width = code.width();
    let dark: Vec<bool> = code
        .to_colors()
        .into_iter()
        .map(|color| matches!(color, qrcode::Color::Dark))
        .collect();

    let modules = Array2::from_shape_vec((width, width), dark)?;
    tracing::debug!(width, "encoded QR modules");

    Ok(modules)
}

/// Rasterizes a module grid into a square with no quiet zone. Each pixel
/// samples the module it falls into.
///
/// The square is `width` pixels wide unless that is narrower than the grid,
/// in which case every module gets exactly one pixel. A `width` of zero
/// yields an empty image.
pub fn render_modules(
    modules: &Array2<bool>,
    width: u32,
    dark: Rgba<u8>,
    light: Rgba<u8>,
) -> RgbaImage {
    let count = modules.nrows() as u32;
    let side = if width == 0 { 0 } else { width.max(count) };

    ImageBuffer::from_fn(side, side, |x, y| {
        let col = (u64::from(x) * u64::from(count) / u64::from(side)) as usize;
        let row = (u64::from(y) * u64::from(count) / u64::from(side)) as usize;
        if modules[[row, col]] {
            dark
        } else {
            light
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::QR_MAX_DATA_BYTES;
    use crate::ComposeError;

    #[test]
    fn grid_is_square() {
        let modules = encode_modules("https://example.com").unwrap();
        assert_eq!(modules.nrows(), modules.ncols());
        assert_eq!((modules.nrows() - 17) % 4, 0);
    }

    #[test]
    fn finder_corner_is_dark() {
        let modules = encode_modules("hello").unwrap();
        assert!(modules[[0, 0]]);
        assert!(!modules[[1, 1]]);
        let last = modules.ncols() - 1;
        assert!(modules[[0, last]]);
    }

    #[test]
    fn max_byte_payload_fits() {
        let data = "a".repeat(QR_MAX_DATA_BYTES);
        let modules = encode_modules(&data).unwrap();
        assert_eq!(modules.nrows(), 177);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let data = "a".repeat(QR_MAX_DATA_BYTES + 1);
        let err = encode_modules(&data).unwrap_err();
        assert!(matches!(err, ComposeError::Qr(_)));
    }

    #[test]
    fn render_has_exact_width_and_inverted_colors() {
        let modules = encode_modules("https://example.com").unwrap();
        let img = render_modules(&modules, 150, DARK_MODULE, LIGHT_MODULE);
        assert_eq!(img.dimensions(), (150, 150));
        assert_eq!(*img.get_pixel(0, 0), DARK_MODULE);
        assert_eq!(*img.get_pixel(149, 0), DARK_MODULE);

        // Second finder ring row is light.
        let module_px = 150 / modules.nrows() as u32;
        assert_eq!(*img.get_pixel(module_px + 1, module_px + 1), LIGHT_MODULE);
    }

    /// Every module must own at least one pixel, and every pixel must match
    /// the module it was sampled from.
    fn assert_all_modules_drawn(modules: &Array2<bool>, img: &RgbaImage) {
        let count = modules.nrows() as u32;
        let side = img.width();
        assert!(side >= count, "{side}px cannot hold {count} modules");

        let mut seen = Array2::from_elem(modules.raw_dim(), false);
        for (x, y, px) in img.enumerate_pixels() {
            let col = (x * count / side) as usize;
            let row = (y * count / side) as usize;
            let expected = if modules[[row, col]] { DARK_MODULE } else { LIGHT_MODULE };
            assert_eq!(*px, expected, "pixel ({x}, {y})");
            seen[[row, col]] = true;
        }
        assert!(seen.iter().all(|&hit| hit));
    }

    #[test]
    fn narrow_render_keeps_every_module() {
        let modules = encode_modules("hello").unwrap();
        let img = render_modules(&modules, 7, DARK_MODULE, LIGHT_MODULE);
        assert_eq!(img.dimensions(), (21, 21));
        assert_all_modules_drawn(&modules, &img);
    }

    #[test]
    fn max_payload_at_default_width_keeps_every_module() {
        let modules = encode_modules(&"a".repeat(QR_MAX_DATA_BYTES)).unwrap();
        let img = render_modules(&modules, 150, DARK_MODULE, LIGHT_MODULE);
        assert_eq!(img.dimensions(), (177, 177));
        assert_all_modules_drawn(&modules, &img);
    }

    #[test]
    fn wide_render_keeps_every_module() {
        let modules = encode_modules("https://example.com").unwrap();
        let img = render_modules(&modules, 187, DARK_MODULE, LIGHT_MODULE);
        assert_eq!(img.dimensions(), (187, 187));
        assert_all_modules_drawn(&modules, &img);
    }

    #[test]
    fn render_zero_width_is_empty() {
        let modules = encode_modules("hello").unwrap();
        let img = render_modules(&modules, 0, DARK_MODULE, LIGHT_MODULE);
        assert_eq!(img.dimensions(), (0, 0));
    }
}
