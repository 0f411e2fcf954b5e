//! WPM Meter CLI
//!
//! Background typing-speed meter with a persistent keystroke counter.

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use wpm_meter::{
    collector::{check_permission, Collector, CollectorConfig},
    config::Config,
    core::{create_shared_counter, read_record, Autosaver, CounterError, Meter, SharedCounter},
    format_thousands, DisplaySink, TerminalDisplay, VERSION,
};

#[derive(Parser)]
#[command(name = "wpm-meter")]
#[command(version = VERSION)]
#[command(about = "Background typing-speed meter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start measuring typing speed
    Start {
        /// Rolling window length in seconds (overrides config)
        #[arg(long)]
        window: Option<u64>,

        /// Seconds between counter saves (overrides config)
        #[arg(long)]
        autosave_interval: Option<u64>,
    },

    /// Pause keystroke accounting in a running meter
    Pause,

    /// Resume keystroke accounting
    Resume,

    /// Show the lifetime keystroke count
    Status,

    /// Delete the lifetime keystroke record
    Reset {
        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },

    /// Show configuration
    Config,
}

fn main() {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            window,
            autosave_interval,
        } => cmd_start(window, autosave_interval),
        Commands::Pause => cmd_pause(),
        Commands::Resume => cmd_resume(),
        Commands::Status => cmd_status(),
        Commands::Reset { yes } => cmd_reset(yes),
        Commands::Config => cmd_config(),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {e}");
        Config::default()
    })
}

fn cmd_start(window: Option<u64>, autosave_interval: Option<u64>) {
    println!("WPM Meter v{VERSION}");
    println!();

    if !check_permission() {
        eprintln!("Error: keyboard hook could not be installed.");
        eprintln!();
        eprintln!("On macOS, grant Input Monitoring permission under");
        eprintln!("System Settings > Privacy & Security > Input Monitoring,");
        eprintln!("then restart the application.");
        std::process::exit(1);
    }

    let mut config = load_config();
    if let Some(secs) = window.filter(|s| *s > 0) {
        config.window = Duration::from_secs(secs);
    }
    if let Some(secs) = autosave_interval.filter(|s| *s > 0) {
        config.autosave_interval = Duration::from_secs(secs);
    }

    let counter_path = config.counter_path();
    let counter = create_shared_counter();
    if let Err(e) = load_counter(&counter, &counter_path) {
        eprintln!("Error: {e}");
        eprintln!("Refusing to start so the existing record is not overwritten.");
        std::process::exit(1);
    }

    println!("Starting meter...");
    println!("  Window: {}s", config.window.as_secs());
    println!("  Autosave every: {}s", config.autosave_interval.as_secs());
    println!("  Record: {}", counter_path.display());
    println!("  Lifetime keystrokes: {}", format_thousands(counter.snapshot()));
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let mut autosaver = Autosaver::start(
        counter.clone(),
        counter_path.clone(),
        config.autosave_interval,
    );
    let mut meter = Meter::with_window(config.window, counter.clone());
    let mut display = TerminalDisplay::stdout();
    let mut collector = Collector::new(CollectorConfig::default());

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    // Support pause/resume from another process by polling the config file.
    let mut paused = config.paused;
    let mut last_config_check = Instant::now();

    if paused {
        println!("Metering is currently paused.");
        println!("Run `wpm-meter resume` to start.");
        println!();
    } else if let Err(e) = collector.start() {
        eprintln!("Error starting collector: {e}");
        std::process::exit(1);
    }

    let receiver = collector.receiver().clone();
    let mut failed = false;

    while running.load(Ordering::SeqCst) {
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Config::load() {
                if cfg.paused != paused {
                    paused = cfg.paused;

                    if paused {
                        println!("Pausing...");
                        collector.stop();
                        meter.reset_window();
                        while receiver.try_recv().is_ok() {}
                    } else {
                        println!("Resuming...");
                        if let Err(e) = collector.start() {
                            eprintln!("Error resuming collector: {e}");
                            failed = true;
                            break;
                        }
                    }
                }
            }
            last_config_check = Instant::now();
        }

        if paused {
            thread::sleep(Duration::from_millis(100));
            continue;
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                if let Some(reading) = meter.handle_event(&event) {
                    display.update(&reading);
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                tracing::error!("Collector disconnected unexpectedly");
                failed = true;
                break;
            }
        }

        // A hook that fails after start() returned only clears its flag
        if let Err(e) = collector.ensure_running() {
            tracing::error!("{e}; no keystrokes are being received");
            failed = true;
            break;
        }
    }

    println!();
    println!("Stopping...");
    collector.stop();

    // Keystrokes already queued still count
    if !paused {
        while let Ok(event) = receiver.try_recv() {
            meter.handle_event(&event);
        }
    }

    match autosaver.stop() {
        Ok(()) => println!(
            "Saved {} lifetime keystrokes to {}",
            format_thousands(counter.snapshot()),
            counter_path.display()
        ),
        Err(e) => tracing::error!("Final save failed: {e}"),
    }

    if failed {
        std::process::exit(1);
    }
}

/// Load the persisted count into `counter`.
///
/// A corrupt record is moved aside and the count restarts at zero with a
/// warning. Any other failure is returned.
fn load_counter(counter: &SharedCounter, path: &Path) -> Result<(), CounterError> {
    match counter.load(path) {
        Ok(value) => {
            tracing::info!(keystrokes = value, "Loaded keystroke record");
            Ok(())
        }
        Err(CounterError::Corrupt { path, len }) => {
            let backup = path.with_extension("bin.corrupt");
            tracing::warn!(
                len,
                backup = %backup.display(),
                "Keystroke record is corrupt; starting from zero"
            );
            if let Err(e) = std::fs::rename(&path, &backup) {
                tracing::warn!("Could not move corrupt record aside: {e}");
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_pause() {
    let mut config = load_config();
    config.paused = true;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Metering paused. Use 'wpm-meter resume' to continue.");
}

fn cmd_resume() {
    let mut config = load_config();
    config.paused = false;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Metering resumed.");
}

fn cmd_status() {
    let config = load_config();
    let path = config.counter_path();

    println!("WPM Meter Status");
    println!("================");
    println!();
    println!("Paused: {}", config.paused);
    println!("Record: {}", path.display());

    match read_record(&path) {
        Ok(value) => {
            println!("Lifetime keystrokes: {}", format_thousands(value));
            if let Ok(modified) = std::fs::metadata(&path).and_then(|m| m.modified()) {
                let modified: DateTime<Local> = modified.into();
                println!("Last saved: {}", modified.format("%Y-%m-%d %H:%M:%S"));
            } else {
                println!("No record saved yet.");
            }
        }
        Err(e) => {
            eprintln!("Error reading record: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_reset(yes: bool) {
    let config = load_config();
    let path = config.counter_path();

    if !yes {
        eprintln!(
            "This deletes the lifetime keystroke record at {}.",
            path.display()
        );
        eprintln!("Re-run with --yes to confirm.");
        std::process::exit(1);
    }

    match std::fs::remove_file(&path) {
        Ok(()) => println!("Keystroke record deleted."),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("No keystroke record to delete.")
        }
        Err(e) => {
            eprintln!("Error deleting record: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config() {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        tracing::warn!("Could not install Ctrl+C handler: {e}");
    }
}
