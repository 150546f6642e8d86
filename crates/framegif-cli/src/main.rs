//! framegif: turn PNG files into an animated GIF.
//!
//! Every file is treated as a selected frame of a design document. The
//! frames go through the same host and UI controllers as the plugin:
//! the host exports them at the export scale, the UI (or, with
//! `--host-encode`, the host) assembles the GIF.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin framegif -- [OPTIONS] <FRAMES>...
//! ```
//!
//! Set `RUST_LOG=debug` to follow the message exchange.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use framegif_cli::{Session, load_document};
use framegif_core::{GifSettings, HostConfig, PartialFailurePolicy, PipelineVariant, UiConfig};

/// Turn PNG files into an animated GIF.
///
/// The files are frames in the order given; `--order` can rearrange
/// them before conversion.
#[derive(Parser)]
#[command(name = "framegif", version)]
struct Cli {
    /// PNG files, one per frame.
    #[arg(required = true)]
    frames: Vec<PathBuf>,

    /// Where to write the animation.
    #[arg(short, long, default_value = "animation.gif")]
    output: PathBuf,

    /// Milliseconds each frame is shown.
    #[arg(long, default_value_t = UiConfig::DEFAULT_FRAME_DELAY_MS)]
    delay: u32,

    /// Comma-separated frame names or paths to move to the front, in
    /// this order.
    #[arg(long, value_delimiter = ',')]
    order: Vec<String>,

    /// Export scale applied to every frame.
    #[arg(long, default_value_t = HostConfig::DEFAULT_EXPORT_SCALE)]
    scale: f32,

    /// Assemble the GIF on the host side instead of the UI side.
    #[arg(long)]
    host_encode: bool,

    /// Fail the whole conversion when a frame cannot be exported,
    /// instead of skipping it.
    #[arg(long)]
    abort_on_missing: bool,

    /// GIF color quantization speed (1 = best quality, 30 = fastest).
    #[arg(
        long,
        default_value_t = GifSettings::DEFAULT_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=30),
    )]
    quality: u8,

    /// Full host config as a JSON string.
    ///
    /// When provided, `--scale`, `--host-encode`, `--abort-on-missing`
    /// and `--quality` are ignored.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build the host config from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual host flags are ignored.
fn host_config_from_cli(cli: &Cli) -> Result<HostConfig, String> {
    if let Some(ref json) = cli.config_json {
        return HostConfig::from_json(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let config = HostConfig {
        export_scale: cli.scale,
        pipeline: if cli.host_encode {
            PipelineVariant::HostEncode
        } else {
            PipelineVariant::UiEncode
        },
        partial_failure: if cli.abort_on_missing {
            PartialFailurePolicy::AbortBatch
        } else {
            PartialFailurePolicy::SkipInvalid
        },
        gif: GifSettings {
            quality: cli.quality,
            ..GifSettings::default()
        },
        ..HostConfig::default()
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn ui_config_from_cli(cli: &Cli) -> Result<UiConfig, String> {
    let config = UiConfig {
        frame_delay_ms: cli.delay,
        ..UiConfig::default()
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let configs = host_config_from_cli(&cli).and_then(|host| Ok((host, ui_config_from_cli(&cli)?)));
    let (host_config, ui_config) = match configs {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let document = match load_document(&cli.frames) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut session = Session::new(document, host_config, ui_config);
    let animation = session
        .connect()
        .and_then(|()| session.apply_order(&cli.order))
        .and_then(|()| session.convert());

    let animation = match animation {
        Ok(animation) => animation,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match std::fs::write(&cli.output, &animation.bytes) {
        Ok(()) => {
            println!(
                "{} frame(s) written to {} ({} bytes)",
                session.frames().len(),
                cli.output.display(),
                animation.bytes.len(),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error writing {}: {e}", cli.output.display());
            ExitCode::FAILURE
        }
    }
}
