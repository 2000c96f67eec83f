use anyhow::{Context, Result, bail};
use clap::{Arg, ArgMatches, Command, value_parser};
use image::{GenericImageView, RgbImage};
use std::path::Path;

use cursor_metrics::calibrate::run_calibration;
use cursor_metrics::capture::{debug_enabled, dump_bitmaps};
use cursor_metrics::config::{self, DEFAULT_CONFIG_PATH, DEFAULT_METRICS_PATH};
use cursor_metrics::{Detector, Metrics};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let count_arg = Arg::new("count")
        .long("count")
        .value_name("N")
        .help("Number of characters typed between the two screenshots (>= 2)")
        .value_parser(value_parser!(usize));
    let output_arg = Arg::new("output")
        .long("output")
        .short('o')
        .value_name("FILE")
        .help("Write metrics JSON to this file");

    // Parse CLI arguments
    let matches = Command::new("cursor-metrics")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Calibrates text cursor geometry from before/after screenshots")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("detect")
                .about("Detect metrics from two saved screenshots")
                .arg(Arg::new("before").long("before").value_name("PNG").required(true))
                .arg(Arg::new("after").long("after").value_name("PNG").required(true))
                .arg(count_arg.clone().required(true))
                .arg(output_arg.clone())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_name("FILE")
                        .help("Calibration config providing detector parameters"),
                ),
        )
        .subcommand(
            Command::new("calibrate")
                .about("Capture the screen, wait for typing, capture again and detect")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_name("FILE")
                        .default_value(DEFAULT_CONFIG_PATH),
                )
                .arg(count_arg)
                .arg(output_arg.default_value(DEFAULT_METRICS_PATH)),
        )
        .subcommand(
            Command::new("show")
                .about("Print a saved metrics file")
                .arg(
                    Arg::new("metrics")
                        .long("metrics")
                        .value_name("FILE")
                        .default_value(DEFAULT_METRICS_PATH),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("detect", sub)) => detect_command(sub),
        Some(("calibrate", sub)) => calibrate_command(sub),
        Some(("show", sub)) => show_command(sub),
        _ => bail!("Unknown subcommand"),
    }
}

fn detect_command(matches: &ArgMatches) -> Result<()> {
    let before = load_rgb(required(matches, "before")?)?;
    let after = load_rgb(required(matches, "after")?)?;
    let count = *matches
        .get_one::<usize>("count")
        .context("--count is required")?;

    let params = match matches.get_one::<String>("config") {
        Some(path) => config::load_config(path)?.detector,
        None => Default::default(),
    };

    let mut detector = Detector::new(params);
    if debug_enabled() {
        dump_bitmaps(&before, "before", detector.params())?;
        dump_bitmaps(&after, "after", detector.params())?;
    }

    let metrics = detector
        .detect(&before, &after, count)?
        .with_context(|| format!("No sequence of {} new characters found", count))?;

    report(&metrics, matches.get_one::<String>("output"))
}

fn calibrate_command(matches: &ArgMatches) -> Result<()> {
    let config_path = required(matches, "config")?;
    let mut config = config::load_config(config_path)?;
    if !Path::new(config_path).exists() {
        config::save_config(config_path, &config)?;
        log::info!("Wrote default config to {}; adjust its region if needed", config_path);
    }
    if let Some(&count) = matches.get_one::<usize>("count") {
        config.count = count;
    }

    let metrics = run_calibration(&config)?;
    report(&metrics, matches.get_one::<String>("output"))
}

fn show_command(matches: &ArgMatches) -> Result<()> {
    let metrics = config::load_metrics(required(matches, "metrics")?)?;
    let [r, g, b] = metrics.background.0;
    println!("anchor:       ({}, {})", metrics.anchor.x, metrics.anchor.y);
    println!("pitch:        {:.3} px", metrics.pitch);
    println!("line length:  {} cells", metrics.line_length);
    println!("background:   #{:02x}{:02x}{:02x}", r, g, b);
    println!("block cursor: {}", metrics.block_cursor);
    Ok(())
}

fn report(metrics: &Metrics, output: Option<&String>) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(metrics).context("Failed to serialize metrics")?
    );
    if let Some(path) = output {
        config::save_metrics(path, metrics)?;
        log::info!("Metrics saved to {}", path);
    }
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .with_context(|| format!("--{} is required", name))
}

fn load_rgb(path: &str) -> Result<RgbImage> {
    let image = image::open(path).with_context(|| format!("Failed to open image {}", path))?;
    if image.width() == 0 || image.height() == 0 {
        bail!("Image {} is empty", path);
    }
    Ok(image.to_rgb8())
}
