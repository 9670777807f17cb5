use std::fs::{self, File};
use std::path::{Path, PathBuf};

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use thiserror::Error;

use crate::layout::{validate_scale, QR_MAX_DATA_BYTES};

pub const USAGE: &str = "
Example usages:
    qr-overlay -s ./your-path -d \"your qr data\"
    qr-overlay --src=./your-path --data=\"your qr data\"
    qr-overlay -s ./your-path -d \"your qr data\" --scale 25
";

#[derive(Parser, Debug)]
#[command(name = "qr-overlay", version)]
#[command(about = "Stamp a QR code on a backdrop over a resized photo")]
pub struct Args {
    /// Source image path
    #[arg(short, long)]
    pub src: Option<PathBuf>,

    /// Text to encode in the QR code
    #[arg(short, long, allow_hyphen_values = true)]
    pub data: Option<String>,

    /// Backdrop height as a percentage of the canvas height (default: 20)
    #[arg(long, allow_hyphen_values = true)]
    pub scale: Option<String>,

    /// Output image path (default: timestamped file next to the executable)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log layout and layer details to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("both --src and --data are required")]
    MissingArguments,

    #[error("malformed arguments")]
    Malformed,

    #[error("No such file: {}", .0.display())]
    NoSuchFile(PathBuf),

    #[error("Data should not exceed {} bytes", QR_MAX_DATA_BYTES)]
    DataTooLarge(usize),

    #[error("Scale should be a valid percentage value")]
    InvalidScale(String),
}

/// Validated input for a single composition.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionRequest {
    pub src: PathBuf,
    pub data: String,
    pub scale: Option<f64>,
    pub output: Option<PathBuf>,
}

impl Args {
    pub fn validate(self) -> Result<CompositionRequest, ValidationError> {
        let (src, data) = match (self.src, self.data) {
            (Some(src), Some(data)) if !src.as_os_str().is_empty() && !data.is_empty() => {
                (src, data)
            }
            _ => return Err(ValidationError::MissingArguments),
        };

        if !is_readable(&src) {
            return Err(ValidationError::NoSuchFile(src));
        }

        if data.len() > QR_MAX_DATA_BYTES {
            return Err(ValidationError::DataTooLarge(data.len()));
        }

        let scale = self.scale.map(|raw| parse_scale(&raw)).transpose()?;

        Ok(CompositionRequest {
            src,
            data,
            scale,
            output: self.output,
        })
    }
}

/// Folds a clap parse failure into the validation taxonomy. Help and version
/// requests are handed back so clap can print them.
pub fn classify_parse_error(err: clap::Error) -> Result<ValidationError, clap::Error> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Err(err),
        _ if names_scale(&err) => Ok(ValidationError::InvalidScale(String::new())),
        _ => Ok(ValidationError::Malformed),
    }
}

fn names_scale(err: &clap::Error) -> bool {
    matches!(
        err.get(ContextKind::InvalidArg),
        Some(ContextValue::String(arg)) if arg.starts_with("--scale")
    )
}

fn is_readable(path: &Path) -> bool {
    let is_file = fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false);
    is_file && File::open(path).is_ok()
}

fn parse_scale(raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(|scale| validate_scale(scale).ok())
        .ok_or_else(|| ValidationError::InvalidScale(raw.to_string()))
}
