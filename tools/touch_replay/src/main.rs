mod logging;
mod replay;
mod trace;

use std::{path::PathBuf, process, time::Duration};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use remote_touchpad::{Dispatcher, HttpSink, RemoteConfig};

use replay::ReplayedAction;

#[derive(Debug, Parser)]
#[command(name = "touch_replay")]
#[command(about = "Replay recorded input traces through the remote touchpad interpreter")]
struct Cli {
    /// Trace file (`ms,kind,args...` lines).
    trace: PathBuf,
    /// Expected `action,...` lines; exit non-zero on mismatch.
    #[arg(long)]
    expect: Option<PathBuf>,
    /// TOML file with `[gesture]` and `[sticky]` overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of a live command sink, e.g. http://192.168.1.20:5000.
    #[arg(long)]
    send: Option<String>,
    #[arg(long, default_value_t = 4.0)]
    timeout: f64,
    #[arg(long = "log-json")]
    log_json: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    logging::init(level, cli.log_json.clone())?;

    let config = match &cli.config {
        Some(path) => RemoteConfig::load(path)?,
        None => RemoteConfig::default(),
    };
    let events = trace::load(&cli.trace)?;
    log::info!(
        "replay: loaded events={} trace={}",
        events.len(),
        cli.trace.display()
    );

    let replayed = match &cli.send {
        Some(base_url) => {
            let sink = HttpSink::new(base_url, Duration::from_secs_f64(cli.timeout.max(0.1)))
                .with_context(|| format!("failed to set up sink for {base_url}"))?;
            let mut dispatcher = Dispatcher::new(sink);
            let replayed = replay::replay(&config, &events, Some(&mut dispatcher));
            log::info!("replay: final status={}", dispatcher.connection().status);
            replayed
        }
        None => replay::replay(&config, &events, None::<&mut Dispatcher<HttpSink>>),
    };

    let actual: Vec<String> = replayed.iter().map(ReplayedAction::line).collect();
    println!("action,ms,kind,fields");
    for line in &actual {
        println!("{line}");
    }

    if let Some(expect_path) = &cli.expect {
        let expected = replay::load_expected(expect_path)?;
        replay::check_expected(&expected, &actual)?;
    }

    Ok(())
}
