use clap::{Parser, Subcommand};
use colored::Colorize;
use nexum_cardwatch::event::event_channel;
use nexum_cardwatch::{
    CardMonitor, MonitorConfig, MonitorError, MonitorEvent, PcscManager, ResourceContext, Scope,
    TransitionKind, registry,
};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(version, about = "Watch smart card readers for card insertion and removal")]
struct Cli {
    /// Debug level output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available readers
    List {
        /// Establish the context in user scope instead of system scope
        #[arg(long)]
        user_scope: bool,
    },

    /// Watch all readers and print card insertions and removals
    Watch {
        /// Bound on each blocking wait, in milliseconds
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,

        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Establish the context in user scope instead of system scope
        #[arg(long)]
        user_scope: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::List { user_scope } => list_readers(scope(user_scope))?,
        Commands::Watch {
            timeout_ms,
            duration_secs,
            user_scope,
        } => {
            let config = MonitorConfig::new()
                .with_scope(scope(user_scope))
                .with_wait_timeout(Duration::from_millis(timeout_ms));
            watch(config, duration_secs.map(Duration::from_secs)).await?
        }
    }

    Ok(())
}

const fn scope(user_scope: bool) -> Scope {
    if user_scope { Scope::User } else { Scope::System }
}

/// List all available readers
fn list_readers(scope: Scope) -> Result<(), MonitorError> {
    let mut context = ResourceContext::new(PcscManager::new());
    context.establish(scope)?;

    let readers = registry::list_readers(&context);
    if readers.is_empty() {
        println!("No readers found!");
        return Ok(());
    }

    println!("Available readers:");
    for (i, reader) in readers.iter().enumerate() {
        println!("{}. {}", i + 1, reader);
    }

    Ok(())
}

/// Print events until interrupted, the duration elapses or monitoring ends
async fn watch(
    config: MonitorConfig,
    duration: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut monitor = CardMonitor::new(PcscManager::new(), config);
    let (sender, receiver) = event_channel();

    let readers = monitor.start_channel(sender)?.to_vec();
    if readers.is_empty() {
        println!("No readers found!");
        return Ok(());
    }

    println!("Watching readers:");
    for (i, reader) in readers.iter().enumerate() {
        println!("{}. {}", i + 1, reader);
    }
    println!("Press Ctrl+C to exit.");

    // Ends once the poll thread drops its sender
    let mut printer = tokio::task::spawn_blocking(move || {
        for event in receiver.iter() {
            print_event(&event);
        }
    });

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };

    let mut printer_done = false;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Interrupted");
        }
        _ = deadline => {
            debug!("Watch duration elapsed");
        }
        result = &mut printer => {
            result?;
            printer_done = true;
        }
    }

    tokio::task::spawn_blocking(move || monitor.stop()).await?;
    if !printer_done {
        printer.await?;
    }

    Ok(())
}

fn print_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::Transition { reader, kind } => {
            let label = match kind {
                TransitionKind::Inserted => "inserted".green().bold(),
                TransitionKind::Ejected => "ejected".red().bold(),
                TransitionKind::Other => "changed".yellow(),
            };
            println!("{label:>10}  {reader}");
        }
        MonitorEvent::Stopped { status } => {
            println!(
                "{:>10}  {} ({})",
                "stopped".red().bold(),
                status,
                status.condition()
            );
        }
    }
}

fn setup_logging(verbose: bool) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, &directives))
        .with_ansi(true)
        .init();
}

/// Filter defaulting to INFO, or DEBUG with `--verbose`; explicit directives win
fn log_filter(verbose: bool, directives: &str) -> EnvFilter {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::{Layer, Registry};

    fn max_level(filter: &EnvFilter) -> Option<LevelFilter> {
        Layer::<Registry>::max_level_hint(filter)
    }

    #[test]
    fn test_verbose_raises_level() {
        assert_eq!(max_level(&log_filter(false, "")), Some(LevelFilter::INFO));
        assert_eq!(max_level(&log_filter(true, "")), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_directives_override_default() {
        assert_eq!(max_level(&log_filter(true, "warn")), Some(LevelFilter::WARN));
    }
}
