use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use qr_overlay::args::{classify_parse_error, Args, ValidationError, USAGE};
use qr_overlay::Compositor;
use tracing::Level;

fn main() -> Result<()> {
    let started = SystemTime::now();

    let parsed = match Args::try_parse() {
        Ok(args) => Ok(args),
        Err(err) => match classify_parse_error(err) {
            Ok(invalid) => Err(invalid),
            Err(err) => err.exit(),
        },
    };

    init_tracing(parsed.as_ref().map_or(false, |args| args.verbose));

    let request = match parsed.and_then(Args::validate) {
        Ok(request) => request,
        Err(ValidationError::MissingArguments | ValidationError::Malformed) => {
            print!("{USAGE}");
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            return Ok(());
        }
    };

    println!("Processing...");

    let source = fs::read(&request.src)
        .with_context(|| format!("Failed to read source image {}", request.src.display()))?;
    tracing::info!(path = %request.src.display(), bytes = source.len(), "loaded source image");

    let png = Compositor::new()?
        .compose(&source, &request.data, request.scale)
        .context("Failed to compose image")?;

    let output = match request.output {
        Some(path) => path,
        None => default_output_path(started)?,
    };
    fs::write(&output, png).with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Result saved to {}", output.display());
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `image_<unix millis>.png` in the directory holding the executable.
fn default_output_path(started: SystemTime) -> Result<PathBuf> {
    let millis = started
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the Unix epoch")?
        .as_millis();

    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let dir = exe
        .parent()
        .context("Executable path has no parent directory")?;

    Ok(dir.join(format!("image_{millis}.png")))
}
