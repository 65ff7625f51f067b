//! Hue Exporter binary.
//!
//! Polls a Philips Hue bridge and serves schema-driven Prometheus metrics.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use hue_exporter::{
    start_web_server, Collector, HueBridge, MetricSchema, RecordSource, ScrapePolicy, WebConfig,
    DEFAULT_LISTEN_PORT, DEFAULT_SCHEMA_FILE,
};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "hue_exporter")]
#[command(about = "Prometheus exporter for Philips Hue bridges")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Polls a Hue bridge for light and sensor state and exposes it \
as Prometheus gauges according to a JSON metric schema")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the Hue bridge (e.g. http://192.168.1.2)
    #[arg(long, env = "HUE_URL", default_value = "")]
    bridge_url: String,

    /// API username token with bridge access
    #[arg(long, env = "HUE_USERNAME", default_value = "")]
    username: String,

    /// JSON file with the metric definitions
    #[arg(short, long, default_value = DEFAULT_SCHEMA_FILE)]
    metrics_file: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the metrics endpoint (default)
    Serve(ServeArgs),

    /// Poll once and print the derived samples without serving
    Test,

    /// Dump all flattened device records as JSON
    Collect(CollectArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the HTTP server to
    #[arg(short, long, default_value_t = DEFAULT_LISTEN_PORT)]
    port: u16,

    /// Username for basic auth
    #[arg(long, default_value = "")]
    auth_user: String,

    /// Password for basic auth; enables basic auth if set
    #[arg(long, env = "HUE_EXPORTER_AUTH_PASS", default_value = "")]
    auth_pass: String,

    /// What a scrape returns while the bridge is down: serve-stale or fail
    #[arg(long, default_value = "serve-stale", value_parser = parse_policy)]
    on_error: ScrapePolicy,
}

#[derive(Args)]
struct CollectArgs {
    /// Also write the collected records to this JSON file
    #[arg(short, long)]
    output: Option<String>,
}

fn parse_policy(s: &str) -> Result<ScrapePolicy, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Serve(args)) => serve_command(&cli, args).await,
        Some(Commands::Test) => test_command(&cli).await,
        Some(Commands::Collect(args)) => collect_command(&cli, args).await,
        None => serve_command(&cli, &ServeArgs::default_args()).await,
    }
}

impl ServeArgs {
    fn default_args() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_LISTEN_PORT,
            auth_user: String::new(),
            auth_pass: String::new(),
            on_error: ScrapePolicy::default(),
        }
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Build the bridge client from the CLI flags.
fn build_bridge(cli: &Cli) -> anyhow::Result<HueBridge> {
    if cli.bridge_url.is_empty() {
        bail!("--bridge-url (or HUE_URL) is required");
    }
    if cli.username.is_empty() {
        bail!("--username (or HUE_USERNAME) is required");
    }
    Ok(HueBridge::new(&cli.bridge_url, &cli.username)?)
}

/// Build the collector: schema file + bridge client.
fn build_collector(cli: &Cli) -> anyhow::Result<Collector> {
    let schema = MetricSchema::from_file(&cli.metrics_file)
        .with_context(|| format!("loading metric schema from {}", cli.metrics_file))?;
    info!(
        metrics = schema.metrics.len(),
        file = %cli.metrics_file,
        "loaded metric schema"
    );
    let bridge = build_bridge(cli)?;
    Ok(Collector::new(Arc::new(schema), Box::new(bridge)))
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    let collector = build_collector(cli)?;

    let mut config = WebConfig::new(&args.host, args.port).with_scrape_policy(args.on_error);

    match (args.auth_user.is_empty(), args.auth_pass.is_empty()) {
        (true, true) => {}
        (false, false) => {
            config = config.with_auth(&args.auth_user, &args.auth_pass);
            info!("basic auth enabled");
        }
        _ => bail!("both --auth-user and --auth-pass are needed to enable basic auth"),
    }

    println!("metrics available at http://{}/metrics", config.bind_address());
    start_web_server(config, Arc::new(collector)).await?;

    Ok(())
}

/// Poll once and print every derived family and sample.
async fn test_command(cli: &Cli) -> anyhow::Result<()> {
    let collector = build_collector(cli)?;
    let families = collector.poll().await?;

    for family in &families {
        println!("Metric: {}", family.name);
        println!(" - help: {}", family.help);
        for sample in &family.samples {
            let labels = family
                .label_names
                .iter()
                .zip(&sample.label_values)
                .map(|(name, value)| format!("{}=\"{}\"", name, value))
                .collect::<Vec<_>>()
                .join(" ");
            println!(" - sample: {} value={}", labels, sample.value);
        }
        if family.samples.is_empty() {
            println!(" - no samples");
        }
    }

    Ok(())
}

/// Dump all flattened device records, for writing a metric schema.
async fn collect_command(cli: &Cli, args: &CollectArgs) -> anyhow::Result<()> {
    let bridge = build_bridge(cli)?;
    let records = bridge.fetch_records().await?;

    let json = serde_json::to_string_pretty(&records)?;
    println!("{}", json);

    if let Some(path) = &args.output {
        std::fs::write(path, &json).with_context(|| format!("writing records to {}", path))?;
        info!(file = %path, records = records.len(), "wrote collected records");
    }

    Ok(())
}
