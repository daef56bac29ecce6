use std::path::PathBuf;

use clap::Parser;
use engine::ExecutionBackend;
use kernels::{Resolution, BLUR_3X3, OUTLINE_3X3};

#[derive(Parser, Debug)]
#[command(
    name = "lumacam",
    author,
    version,
    about = "Headless lit-object highlight pipeline demo",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Execution backend: `accelerated` (worker pool) or `scalar`.
    #[arg(
        long,
        value_name = "BACKEND",
        value_parser = parse_backend,
        default_value = "accelerated"
    )]
    pub backend: ExecutionBackend,

    /// Start with the stage chain bypassed; frames pass through unmodified.
    #[arg(long)]
    pub no_filter: bool,

    /// Brightness cutoff for the lit-object stage (0.0-1.0).
    #[arg(long, value_name = "LEVEL", default_value_t = 0.1)]
    pub light_level: f32,

    /// Colour painted over lit regions, as `R,G,B` channels in 0.0-1.0.
    #[arg(
        long,
        value_name = "R,G,B",
        value_parser = parse_color,
        default_value = "1,0,0"
    )]
    pub highlight: [f32; 3],

    /// Convolution preset for the middle stage: `blur` or `outline`.
    #[arg(
        long,
        value_name = "PRESET",
        value_parser = parse_matrix,
        default_value = "blur"
    )]
    pub matrix: [f32; 9],

    /// Frame size (e.g. `640x480`).
    #[arg(
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = parse_size,
        default_value = "1024x768"
    )]
    pub size: Resolution,

    /// Refresh cadence the frame clock paces the loop to.
    #[arg(long, value_name = "HZ", default_value_t = 60.0)]
    pub refresh_hz: f32,

    /// Stop after presenting this many frames.
    #[arg(long, value_name = "COUNT", default_value_t = 300)]
    pub frames: u64,

    /// Switch to the other backend after this many presented frames.
    #[arg(long, value_name = "COUNT")]
    pub flip_backend_after: Option<u64>,

    /// Ticks the synthetic camera spends warming up before its first frame.
    #[arg(long, value_name = "TICKS", default_value_t = 0)]
    pub warmup_frames: u64,

    /// Seed for the synthetic camera noise floor.
    #[arg(long, value_name = "SEED", default_value_t = 7)]
    pub seed: u64,

    /// Write the last presented frame to this PNG path before exiting.
    #[arg(long, value_name = "PATH")]
    pub export_last: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_backend(value: &str) -> Result<ExecutionBackend, String> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "accelerated" | "parallel" => Ok(ExecutionBackend::Accelerated),
        "scalar" | "sequential" | "serial" => Ok(ExecutionBackend::Scalar),
        other => Err(format!(
            "unknown backend '{other}'; expected accelerated or scalar"
        )),
    }
}

pub fn parse_size(value: &str) -> Result<Resolution, String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width in frame size".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height in frame size".to_string())?;
    if width == 0 || height == 0 {
        return Err("frame size must be greater than zero".into());
    }
    Ok(Resolution::new(width, height))
}

pub fn parse_color(value: &str) -> Result<[f32; 3], String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("highlight colour must not be empty".into());
    }

    let mut channels = [0.0f32; 3];
    let mut parts = trimmed.split(',');
    for (index, slot) in channels.iter_mut().enumerate() {
        let part = parts
            .next()
            .ok_or_else(|| "expected three comma-separated channels".to_string())?
            .trim();
        let channel: f32 = part
            .parse()
            .map_err(|_| format!("invalid channel value '{part}'"))?;
        if !(0.0..=1.0).contains(&channel) {
            return Err(format!("channel {index} is outside 0.0-1.0"));
        }
        *slot = channel;
    }
    if parts.next().is_some() {
        return Err("expected exactly three comma-separated channels".into());
    }
    Ok(channels)
}

pub fn parse_matrix(value: &str) -> Result<[f32; 9], String> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "blur" | "gaussian" => Ok(BLUR_3X3),
        "outline" | "edges" => Ok(OUTLINE_3X3),
        other => Err(format!(
            "unknown convolution preset '{other}'; expected blur or outline"
        )),
    }
}
