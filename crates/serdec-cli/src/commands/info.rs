use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use clap::Args;
use serdec_core::config::DecoderConfig;
use serdec_core::consts::TICKS_PER_SECOND;
use serdec_core::frame::SourceInfo;
use serdec_core::io::ser::SerReader;
use serdec_core::timestamp::ticks_to_system_time;

use crate::styles::Styles;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file
    pub file: PathBuf,

    /// Print metadata as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &InfoArgs, config: &DecoderConfig) -> Result<()> {
    let reader = SerReader::open_with(&args.file, config)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let info = reader.source_info();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    print_info(&info, reader.timestamp_correction());
    Ok(())
}

fn print_info(info: &SourceInfo, correction: i64) {
    let s = Styles::new();
    s.banner("SER File");

    println!(
        "  {:<14}{}",
        s.label.apply_to("File"),
        s.path.apply_to(info.filename.display())
    );
    s.row("Frames", info.total_frames);
    s.row("Dimensions", format!("{}x{}", info.width, info.height));
    s.row("Color mode", format!("{:?}", info.color_mode));
    if info.pixel_depth == info.declared_pixel_depth {
        s.row("Bit depth", info.pixel_depth);
    } else {
        println!(
            "  {:<14}{} {}",
            s.label.apply_to("Bit depth"),
            s.value.apply_to(info.pixel_depth),
            s.warn
                .apply_to(format!("(header says {})", info.declared_pixel_depth))
        );
    }
    s.row(
        "Byte order",
        if info.high_byte_first {
            "high byte first"
        } else {
            "low byte first"
        },
    );

    let total_mb = (info.frame_bytes * info.total_frames as u64) as f64 / (1024.0 * 1024.0);
    s.row("Frame size", format!("{} bytes", info.frame_bytes));
    s.row("Data size", format!("{:.1} MB", total_mb));

    for (label, value) in [
        ("Observer", &info.observer),
        ("Instrument", &info.instrument),
        ("Telescope", &info.telescope),
    ] {
        if let Some(v) = value {
            s.row(label, v);
        }
    }

    println!();
    println!("  {}", s.header.apply_to("Timing"));
    if info.frame_rate.is_available() {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Frame rate"),
            s.good.apply_to(info.frame_rate)
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Frame rate"),
            s.warn.apply_to(info.frame_rate)
        );
    }

    if let (Some(first), Some(last)) = (info.first_timestamp, info.last_timestamp) {
        println!(
            "    {:<12}{}",
            s.label.apply_to("First"),
            s.value.apply_to(unix_seconds(first))
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Last"),
            s.value.apply_to(unix_seconds(last))
        );
        let span = last.saturating_sub(first) as f64 / TICKS_PER_SECOND as f64;
        println!(
            "    {:<12}{}",
            s.label.apply_to("Duration"),
            s.value.apply_to(format!("{span:.3} s"))
        );
        if correction != 0 {
            let hours = correction as f64 / TICKS_PER_SECOND as f64 / 3600.0;
            println!(
                "    {:<12}{}",
                s.label.apply_to("UTC shift"),
                s.warn.apply_to(format!("{hours:+.2} h (trailer is local time)"))
            );
        }
    }
    println!();
}

/// Render ticks as Unix seconds, or the raw value when before 1970.
fn unix_seconds(ticks: u64) -> String {
    ticks_to_system_time(ticks)
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| format!("{:.3} (unix)", d.as_secs_f64()))
        .unwrap_or_else(|| format!("{ticks} ticks"))
}
