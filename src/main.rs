use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use gesturegift::app::{SessionRuntime, SessionSummary, ShutdownReason};
use gesturegift::clock::MonotonicClock;
use gesturegift::events::{run_handler, EventFilter, EventMetrics, JsonLinesHandler};
use gesturegift::replay::{self, ReplayRecord, Replayer};
use gesturegift::GiftConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "gesturegift")]
#[command(about = "Hand-gesture letter collection game core")]
#[command(version)]
#[command(long_about = "Drives the I-L-O-V-E-U gesture collection game from recorded or \
scripted hand landmarks. Session events are written to stdout as JSON lines for a \
presentation layer to consume; logs go to stderr or a log file.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "gesturegift.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH", help = "Write logs to this file")]
    log_file: Option<PathBuf>,

    /// Keyboard controls: SPACE closes the presentation, i ends the intro, q quits
    #[arg(long, help = "Enable keyboard controls (implies real-time playback)")]
    interactive: bool,

    /// Include per-frame hold progress and rotation events in the output
    #[arg(long, help = "Also print per-frame progress events")]
    progress: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON-lines landmark recording
    Replay {
        /// Recording to replay
        file: PathBuf,

        /// Close each presentation this long after it opens
        #[arg(long, value_name = "MS")]
        auto_close_ms: Option<u64>,

        /// Play at the recorded pace instead of as fast as possible
        #[arg(long)]
        realtime: bool,
    },
    /// Play a scripted session that collects every letter
    Demo {
        /// Synthetic camera frame rate
        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// Close each presentation this long after it opens
        #[arg(long, value_name = "MS", default_value_t = 2000)]
        auto_close_ms: u64,

        /// Also write the script as a recording
        #[arg(long, value_name = "PATH")]
        record: Option<PathBuf>,

        /// Play at the scripted pace instead of as fast as possible
        #[arg(long)]
        realtime: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config();
        return Ok(());
    }

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = init_logging(&args)?;

    info!("Starting gesturegift v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match GiftConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let Some(command) = &args.command else {
        bail!("No command given, use `gesturegift replay <FILE>` or `gesturegift demo`");
    };

    let (records, auto_close_ms, realtime) = match command {
        Command::Replay {
            file,
            auto_close_ms,
            realtime,
        } => {
            let records = replay::load_records(file)
                .with_context(|| format!("Failed to load recording {}", file.display()))?;
            (records, *auto_close_ms, *realtime)
        }
        Command::Demo {
            fps,
            auto_close_ms,
            record,
            realtime,
        } => {
            let records = replay::demo_script(&config, *fps, *auto_close_ms);
            if let Some(path) = record {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                replay::write_records(&records, std::io::BufWriter::new(file))?;
                info!("Demo script written to {}", path.display());
            }
            (records, Some(*auto_close_ms), *realtime)
        }
    };

    let filter = if args.progress {
        EventFilter::All
    } else {
        EventFilter::Milestones
    };

    let summary = if realtime || args.interactive {
        run_realtime(config, records, auto_close_ms, filter, args.interactive).await?
    } else {
        run_fast(&config, &records, auto_close_ms, filter)?
    };

    eprintln!(
        "✓ Session {} ended in {} with {}/6 letters",
        summary.session_id, summary.final_mode, summary.collected
    );
    Ok(())
}

/// Replay on a manual clock and print events as they come out
fn run_fast(
    config: &GiftConfig,
    records: &[ReplayRecord],
    auto_close_ms: Option<u64>,
    filter: EventFilter,
) -> Result<SessionSummary> {
    let started_at = Utc::now();
    let mut replayer = Replayer::new(config, auto_close_ms)?;
    let mut printer = JsonLinesHandler::new(std::io::stdout(), filter);
    let mut metrics = EventMetrics::default();

    for record in records {
        for event in replayer.apply(record) {
            metrics.record_event(&event);
            printer.write_event(&event)?;
        }
    }
    metrics.errors = replayer.rejected() as u64;

    let summary = SessionSummary::new(
        replayer.controller(),
        started_at,
        &metrics,
        ShutdownReason::InputExhausted,
    );
    info!(
        "Replay finished: {} events, {} rejected inputs",
        summary.events_published, summary.rejected_inputs
    );
    Ok(summary)
}

/// Play into a running session at the recorded pace
async fn run_realtime(
    config: GiftConfig,
    records: Vec<ReplayRecord>,
    auto_close_ms: Option<u64>,
    filter: EventFilter,
    interactive: bool,
) -> Result<SessionSummary> {
    let mut runtime = SessionRuntime::new(config, Arc::new(MonotonicClock::new()))?;
    runtime.set_keyboard_enabled(interactive);

    let printer_cancel = CancellationToken::new();
    let printer = {
        let receiver = runtime.event_bus().subscribe();
        let handler = JsonLinesHandler::new(std::io::stdout(), filter);
        tokio::spawn(run_handler(handler, receiver, printer_cancel.clone()))
    };

    runtime.start().await?;

    let handle = runtime.handle()?;
    let playback_cancel = runtime.finished();
    let playback = tokio::spawn(async move {
        let sent = replay::play_realtime(&records, &handle, auto_close_ms, &playback_cancel).await;
        if !interactive {
            // Without keyboard controls nothing else will end the session
            let _ = handle.shutdown().await;
        }
        sent
    });
    runtime.close_inputs();

    let summary = runtime.run().await?;

    match playback.await {
        Ok(Ok(sent)) => info!("Played {} records", sent),
        Ok(Err(e)) => warn!("Playback stopped early: {}", e),
        Err(e) => warn!("Playback task failed: {}", e),
    }

    printer_cancel.cancel();
    if let Ok(printer) = printer.await {
        info!("Printed {} events", printer.written());
    }

    Ok(summary)
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    // Create environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gesturegift={}", log_level)));

    // Stdout carries session events, so logs go to stderr or a file
    let (writer, guard) = match &args.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .context("Log file path has no file name")?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (fmt::writer::BoxMakeWriter::new(writer), Some(guard))
        }
        None => (fmt::writer::BoxMakeWriter::new(std::io::stderr), None),
    };

    // Configure format based on options
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(args.log_file.is_none())
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() {
    println!("# gesturegift configuration file");
    println!("# This is the default configuration with all available options");
    println!("# Any value can be overridden from the environment, e.g. GIFT_SESSION__COOLDOWN_MS=2000");
    println!();

    let default_config = r#"[gesture]
# Hold time for the OK gate on the intro and instruction screens (ms)
ok_hold_ms = 5000
# Hold time to collect a letter (ms)
collect_hold_ms = 3000
# Hold time for the finale thumbs-up (ms)
thumbs_up_hold_ms = 3000
# Thumb/index fingertip distance that counts as touching, in normalized units
touch_threshold = 0.08
# Thumb counts as curled while its tip spread is below this multiple of its base spread
thumb_curl_multiplier = 1.2
# How far the thumb tip must rise above its base joint for a thumbs-up
thumbs_up_offset = 0.05

[session]
# Quiet period after a presentation closes (ms)
cooldown_ms = 1500
# After the sixth letter: "thumbs_up_grid" waits for a thumbs-up, "immediate" ends at once
finale = "thumbs_up_grid"
# Scene rotation per unit of horizontal wrist movement
rotation_gain = 5.0
# Fraction of the remaining rotation applied per smoothing step
rotation_smoothing = 0.1

[surprises]
# One surprise per newly collected letter, in collection order (exactly six).
# "placeholder" shows the letter card instead.
queue = ["photo_slideshow", "voice_clip", "dialogue_game", "image_reveal", "typed_letter", "final_redirect"]

[system]
# Event bus capacity
event_bus_capacity = 256
# Pending session inputs before senders wait
input_queue_capacity = 64
"#;

    println!("{}", default_config);
}
