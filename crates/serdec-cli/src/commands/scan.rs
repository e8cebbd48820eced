use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serdec_core::config::DecoderConfig;
use serdec_core::io::ser::SerReader;
use tracing::info;

use crate::styles::Styles;

#[derive(Args)]
pub struct ScanArgs {
    /// Input SER file
    pub file: PathBuf,
}

pub fn run(args: &ScanArgs, config: &DecoderConfig) -> Result<()> {
    let mut reader = SerReader::open_with(&args.file, config)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let total = reader.frame_count();
    let wide = reader.layout().bytes_per_sample == 2;

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Decoding frames");

    let mut buf = vec![0u8; reader.buffer_size()];
    let mut min = u16::MAX;
    let mut max = u16::MIN;
    let start = Instant::now();

    for i in 0..total {
        reader
            .get_frame(Some(&mut buf))
            .with_context(|| format!("Frame {} of {}", i + 1, total))?;
        let (lo, hi) = sample_range(&buf, wide);
        min = min.min(lo);
        max = max.max(hi);
        pb.set_position(i as u64 + 1);
    }

    let elapsed = start.elapsed().as_secs_f64();
    pb.finish_with_message("Decoded");
    info!(frames = total, elapsed, "Scan complete");

    let bytes = reader.buffer_size() as f64 * total as f64;
    let s = Styles::new();
    s.banner("Scan");
    s.row("Frames", total);
    s.row("Bit depth", reader.pixel_depth());
    s.row("Min sample", min);
    s.row("Max sample", max);
    if elapsed > 0.0 {
        s.row(
            "Throughput",
            format!(
                "{:.1} frames/s, {:.1} MB/s",
                total as f64 / elapsed,
                bytes / elapsed / (1024.0 * 1024.0)
            ),
        );
    }
    println!();

    Ok(())
}

/// Smallest and largest sample in a canonical frame buffer.
fn sample_range(buf: &[u8], wide: bool) -> (u16, u16) {
    if wide {
        buf.chunks_exact(2)
            .map(|p| u16::from_ne_bytes([p[0], p[1]]))
            .fold((u16::MAX, u16::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
    } else {
        buf.iter()
            .fold((u16::MAX, u16::MIN), |(lo, hi), &v| {
                (lo.min(v as u16), hi.max(v as u16))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_range() {
        assert_eq!(sample_range(&[7, 3, 250], false), (3, 250));
    }

    #[test]
    fn wide_range() {
        let mut buf = Vec::new();
        for v in [0x0100u16, 0x0FFF, 0x0002] {
            buf.extend_from_slice(&v.to_ne_bytes());
        }
        assert_eq!(sample_range(&buf, true), (2, 0x0FFF));
    }
}
