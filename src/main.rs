use anyhow::{anyhow, Context, Result};
use aws_config::{BehaviorVersion, Region};
use chrono::{DateTime as ChronoDateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use stackops::aws::Connection;
use stackops::component::{Component, Components, LogQuery, MetricRequest, Summary};
use stackops::config::Config;
use stackops::extract::extract_components;
use stackops::ops::{get_stack_logs, OperationsProvider};
use stackops::snapshot::Snapshot;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Operations over deployed AWS stacks
#[derive(Parser, Debug)]
#[command(name = "stackops", version, about, long_about = None)]
struct Args {
    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the components extracted from a deployment snapshot
    Summary {
        /// Snapshot file (defaults to the last one used)
        snapshot: Option<PathBuf>,
    },
    /// Fetch runtime logs for the whole stack or one component
    Logs {
        snapshot: Option<PathBuf>,
        /// Component name; omit to fetch logs for every function
        #[arg(short, long)]
        component: Option<String>,
    },
    /// List the metrics supported for a component
    Metrics {
        snapshot: Option<PathBuf>,
        #[arg(short, long)]
        component: String,
    },
    /// Fetch statistics for one metric of a component
    MetricStats {
        snapshot: Option<PathBuf>,
        #[arg(short, long)]
        component: String,
        #[arg(short, long)]
        metric: String,
        /// Range start, RFC3339 (defaults to one hour ago)
        #[arg(long)]
        start: Option<String>,
        /// Range end, RFC3339 (defaults to now)
        #[arg(long)]
        end: Option<String>,
        /// Aggregation period in seconds
        #[arg(long, default_value_t = 300)]
        period: i32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return None;
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("stackops started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("stackops").join("stackops.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".stackops").join("stackops.log");
    }
    PathBuf::from("stackops.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();

    match args.command {
        Command::Summary { snapshot } => {
            let components = load_components(snapshot, &mut config)?;
            print!("{}", Summary(&components));
        }
        Command::Logs {
            snapshot,
            component,
        } => {
            let components = load_components(snapshot, &mut config)?;
            let connection = connect(&config).await;
            let query = LogQuery::default();

            let entries = match component {
                Some(name) => {
                    let component = find_component(&components, &name)?;
                    OperationsProvider::for_component(&connection, component)
                        .get_logs(&query)
                        .await?
                }
                None => get_stack_logs(&connection, &components, &query).await?,
            };

            for entry in entries {
                let when = ChronoDateTime::from_timestamp_millis(entry.timestamp)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| entry.timestamp.to_string());
                println!("{}\t{}\t{}", when, entry.id, entry.message);
            }
        }
        Command::Metrics {
            snapshot,
            component,
        } => {
            let components = load_components(snapshot, &mut config)?;
            let component = find_component(&components, &component)?;
            let connection = connect(&config).await;
            let provider = OperationsProvider::for_component(&connection, component);
            for metric in provider.list_metrics() {
                println!("{}", metric);
            }
        }
        Command::MetricStats {
            snapshot,
            component,
            metric,
            start,
            end,
            period,
        } => {
            let components = load_components(snapshot, &mut config)?;
            let component = find_component(&components, &component)?;
            let connection = connect(&config).await;

            let end = parse_time(end.as_deref())?.unwrap_or_else(|| Utc::now().timestamp());
            let start = parse_time(start.as_deref())?.unwrap_or(end - 3600);

            let request = MetricRequest {
                metric,
                start,
                end,
                period,
            };
            let points = OperationsProvider::for_component(&connection, component)
                .get_metric_statistics(&request)
                .await?;

            println!("timestamp\tunit\tsum\tcount\tavg\tmax\tmin");
            for p in points {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    p.timestamp, p.unit, p.sum, p.sample_count, p.average, p.maximum, p.minimum
                );
            }
        }
    }

    Ok(())
}

/// Connect to the backend, honoring a configured region override.
async fn connect(config: &Config) -> Connection {
    match &config.region {
        Some(region) => {
            let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.clone()))
                .load()
                .await;
            Connection::from_conf(&sdk_config)
        }
        None => Connection::new().await,
    }
}

/// Resolve the snapshot path (CLI > last used), extract, and remember it.
fn load_components(arg: Option<PathBuf>, config: &mut Config) -> Result<Components> {
    let path = match arg {
        Some(path) => path,
        None => config
            .snapshot
            .as_deref()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("No snapshot given and no previous snapshot remembered"))?,
    };

    let snapshot = Snapshot::load(&path)?;
    tracing::info!(
        "Loaded snapshot {} with {} resources",
        path.display(),
        snapshot.resources.len()
    );

    if let Err(err) = config.set_snapshot(&path.to_string_lossy()) {
        tracing::warn!("Failed to persist config: {:#}", err);
    }

    Ok(extract_components(&snapshot.resources))
}

fn find_component<'a>(components: &'a Components, name: &str) -> Result<&'a Component> {
    components
        .values()
        .find(|c| c.name == name)
        .with_context(|| {
            let known: Vec<&str> = components.values().map(|c| c.name.as_str()).collect();
            format!("No component named {} (known: {})", name, known.join(", "))
        })
}

fn parse_time(value: Option<&str>) -> Result<Option<i64>> {
    value
        .map(|v| {
            ChronoDateTime::parse_from_rfc3339(v)
                .map(|t| t.timestamp())
                .with_context(|| format!("Invalid RFC3339 timestamp: {}", v))
        })
        .transpose()
}
