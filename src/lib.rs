//! Composites a photo, a decorative backdrop and a QR code into a single
//! 1000x1000 PNG.
//!
//! ```no_run
//! use qr_overlay::Compositor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = std::fs::read("photo.jpg")?;
//! let png = Compositor::new()?.compose(&photo, "https://example.com", Some(25.0))?;
//! std::fs::write("stamped.png", png)?;
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod compositor;
pub mod error;
pub mod layout;
pub mod qr;

pub use compositor::{Compositor, Layer};
pub use error::ComposeError;
pub use layout::{Layout, Origin, ScaleError};
