//! inputtrail CLI
//!
//! Overt local input-activity tracker: records one session's keyboard and
//! mouse activity to a plain-text log with a closing summary.

use clap::{Parser, Subcommand};
use inputtrail::{
    check_permission, Collector, CollectorConfig, Config, SessionController, SessionError,
    SourceConfig, LOG_FILE_NAME, IDLE_TIMEOUT, TRACKING_NOTICE, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inputtrail")]
#[command(version = VERSION)]
#[command(about = "Overt local input-activity tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a tracking session
    Start {
        /// Input sources to capture (keyboard, mouse, or all);
        /// defaults to the saved configuration
        #[arg(long)]
        sources: Option<String>,
    },

    /// Save the default input sources for future sessions
    Sources {
        /// Sources to capture by default (keyboard, mouse, or all)
        sources: String,
    },

    /// Display what this tool records and where the data goes
    Notice,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { sources } => cmd_start(sources.as_deref()),
        Commands::Sources { sources } => cmd_sources(&sources),
        Commands::Notice => println!("{TRACKING_NOTICE}"),
    }
}

fn cmd_start(sources: Option<&str>) {
    println!("inputtrail v{VERSION}");
    println!();

    if !check_permission() {
        eprintln!("Error: input hooks cannot be installed.");
        eprintln!();
        eprintln!("On macOS, grant Input Monitoring permission:");
        eprintln!("1. Open System Preferences > Security & Privacy > Privacy");
        eprintln!("2. Select 'Input Monitoring' in the left sidebar");
        eprintln!("3. Add this application to the allowed list");
        eprintln!("4. Restart the application");
        std::process::exit(1);
    }

    let config = Config::load().unwrap_or_default();
    let sources = match sources {
        Some(csv) => SourceConfig::from_csv(csv),
        None => config.sources,
    };
    if !sources.any_enabled() {
        eprintln!("Error: at least one source must be enabled (keyboard or mouse)");
        std::process::exit(1);
    }

    println!("Input tracking started. All keyboard and mouse activity will be recorded.");
    println!(
        "Press CTRL+C or wait {} seconds of inactivity to stop tracking.",
        IDLE_TIMEOUT.as_secs()
    );
    println!(
        "  Keyboard: {}",
        if sources.keyboard { "enabled" } else { "disabled" }
    );
    println!(
        "  Mouse: {}",
        if sources.mouse { "enabled" } else { "disabled" }
    );
    println!("  Log file: {LOG_FILE_NAME}");
    println!();

    let (sender, receiver) = crossbeam_channel::unbounded();
    let mut collector = Collector::new(
        CollectorConfig {
            capture_keyboard: sources.keyboard,
            capture_mouse: sources.mouse,
        },
        sender,
    );

    let mut session = match SessionController::new(LOG_FILE_NAME, receiver) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: could not open session log: {e}");
            std::process::exit(1);
        }
    };

    let handle = session.handle();
    ctrlc::set_handler(move || handle.stop()).expect("Error setting Ctrl+C handler");

    if let Err(e) = collector.start() {
        eprintln!("Error starting input hooks: {e}");
        std::process::exit(1);
    }

    match session.start(&mut collector) {
        Ok(summary) => {
            println!();
            println!("Tracking stopped. Results saved to '{LOG_FILE_NAME}'");
            println!("{}", summary.render_console());
        }
        Err(e @ SessionError::Log(_)) => {
            eprintln!();
            eprintln!("Error: {e}");
            eprintln!("Tracking aborted; the session log is incomplete.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_sources(csv: &str) {
    let sources = SourceConfig::from_csv(csv);
    if !sources.any_enabled() {
        eprintln!("Error: at least one source must be enabled (keyboard or mouse)");
        std::process::exit(1);
    }

    let mut config = Config::load().unwrap_or_default();
    config.sources = sources;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!(
        "Default sources saved: keyboard {}, mouse {}.",
        if config.sources.keyboard { "on" } else { "off" },
        if config.sources.mouse { "on" } else { "off" }
    );
}
