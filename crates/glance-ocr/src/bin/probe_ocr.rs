//! Capture a region and run the OCR fallback chain on it:
//! cargo run -p glance-ocr --bin probe_ocr -- 0 0 400 120

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use glance_config::Config;
use glance_ocr::{OcrEngineAdapter, ScreenCapture, TesseractBackend, XcapCapture};
use glance_types::SelectionRegion;
use tokio_util::sync::CancellationToken;

fn parse_region(args: &[String]) -> Result<SelectionRegion> {
    if args.is_empty() {
        return Ok(SelectionRegion::new(0, 0, 800, 600));
    }

    let values = args
        .iter()
        .map(|a| a.parse::<i64>().with_context(|| format!("Not a number: {}", a)))
        .collect::<Result<Vec<_>>>()?;

    match values.as_slice() {
        [x, y, w, h] => Ok(SelectionRegion::new(
            i32::try_from(*x)?,
            i32::try_from(*y)?,
            u32::try_from(*w)?,
            u32::try_from(*h)?,
        )),
        _ => anyhow::bail!("usage: probe_ocr [x y width height]"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let region = parse_region(&args)?;
    let config = Config::new();

    let backend = Arc::new(TesseractBackend::from_config(&config.ocr));
    match backend.version() {
        Some(version) => tracing::info!("Tesseract: {}", version.lines().next().unwrap_or_default()),
        None => tracing::warn!("Tesseract not found on PATH"),
    }

    tracing::info!("Capturing {}", region);
    let start = Instant::now();
    let image = XcapCapture.capture(region)?;
    tracing::info!(
        "Captured {}x{} in {:?}",
        image.width(),
        image.height(),
        start.elapsed()
    );

    let adapter = OcrEngineAdapter::new(backend, config.ocr.modes.clone());
    let start = Instant::now();
    let result = adapter.extract(&image, &CancellationToken::new())?;
    tracing::info!("OCR took {:?}", start.elapsed());

    match result.mode_used {
        Some(mode) if result.success => {
            tracing::info!("psm {} -> {} chars", mode.psm(), result.text.chars().count());
            for line in result.text.lines().take(10) {
                tracing::info!("  > {}", line);
            }
        }
        _ => tracing::info!("No text found"),
    }

    Ok(())
}
