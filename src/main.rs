//! pwmled host simulator.
//!
//! Starts the driver on the simulated GPIO bank and interrupt controller,
//! then turns stdin commands into button presses:
//!
//! ```text
//! u  press the increase button      s  print level / state / duty
//! d  press the decrease button      q  stop and exit
//! ```
//!
//! Parameters are given as `name=value` arguments or loaded from a JSON
//! file with `--config <path>`; `--help` lists them.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use env_logger::Env;
use log::{LevelFilter, info, warn};

use pwmled::adapters::gpio::SimGpio;
use pwmled::adapters::irq::SimIrqController;
use pwmled::adapters::log_sink::LogEventSink;
use pwmled::adapters::time::MonotonicClock;
use pwmled::app::service::PwmLedService;
use pwmled::config::{LedConfig, PARAMS};

struct Args {
    config: LedConfig,
    /// `--log` override; otherwise `RUST_LOG`, defaulting to `info`.
    log_level: Option<LevelFilter>,
}

fn print_help() {
    println!("Usage: pwmled [--config <file.json>] [--log <level>] [name=value ...]\n");
    println!("Parameters:");
    for (name, description) in PARAMS {
        println!("  {:<14} {}", name, description);
    }
    println!("\nCommands on stdin: u (up), d (down), s (status), q (quit)");
}

/// `None` when `--help` was requested.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let mut config_path = None;
    let mut log_level = None;
    let mut params = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--config" => {
                config_path = Some(args.next().context("--config needs a path")?);
            }
            "--log" => {
                let name = args.next().context("--log needs a level")?;
                let level = name
                    .parse::<LevelFilter>()
                    .with_context(|| format!("unknown log level '{name}'"))?;
                log_level = Some(level);
            }
            other if other.starts_with('-') => bail!("unknown option '{other}'"),
            _ => params.push(arg),
        }
    }

    let mut config = match config_path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {path}"))?;
            LedConfig::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => LedConfig::default(),
    };
    if !params.is_empty() {
        config = config.with_params(params.iter().map(String::as_str))?;
    }

    Ok(Some(Args { config, log_level }))
}

fn init_logger(level: Option<LevelFilter>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.try_init().context("installing logger")
}

fn main() -> Result<()> {
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        print_help();
        return Ok(());
    };
    init_logger(args.log_level)?;

    info!("pwmled v{}", env!("CARGO_PKG_VERSION"));

    let gpio = Arc::new(SimGpio::new());
    let irq = Arc::new(SimIrqController::new());
    let service = PwmLedService::start(
        args.config,
        gpio.clone(),
        irq.clone(),
        Arc::new(MonotonicClock::new()),
        Arc::new(LogEventSink::new()),
    )?;
    let config = *service.config();

    for line in std::io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        match line.trim() {
            "u" => {
                irq.fire(config.up_pin);
            }
            "d" => {
                irq.fire(config.down_pin);
            }
            "s" => {
                let r = service.report();
                println!(
                    "level {}/{} ({}%) state {:?}, {} LED edges",
                    r.level,
                    r.max_level,
                    r.percent,
                    r.state,
                    gpio.edges()
                );
            }
            "q" => break,
            "" => {}
            other => warn!("unknown command '{}'", other),
        }
    }

    service.stop();
    Ok(())
}
