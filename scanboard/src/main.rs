use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use scan_engine::views;
use scan_engine::{
    list_scan_dates, AggregateReport, DateKey, Engine, FsCache, FsScanSource, QueryError, QueryOutcome, ReportCache,
    ReportOrigin,
};
use scanboard_core::OrderedCounts;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat { Text, Json, Jsonl }

impl OutputFormat {
    fn from_config(s: &str) -> Self {
        match s { "json" => OutputFormat::Json, "jsonl" => OutputFormat::Jsonl, _ => OutputFormat::Text }
    }
}

#[derive(Debug, Args)]
struct DateArgs {
    /// Scan date key (directory name under the scan root, digits only)
    #[arg(long)]
    date: String,
    /// Ignore any cached report and re-parse the scan directory
    #[arg(long, default_value_t = false)]
    rebuild: bool,
}

#[derive(Debug, Subcommand)]
enum CacheCmd {
    /// List cached date keys, most recent first
    List,
    /// Delete the cached report for one date
    Clear {
        #[arg(long)]
        date: String,
    },
}

#[derive(Debug, Parser)]
#[command(name = "scanboard", version, about = "Aggregate per-date nmap scan directories into cached reports")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./scanboard.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding one subdirectory of scan files per date
    #[arg(long, global = true)]
    scan_root: Option<PathBuf>,
    /// Directory for cached reports
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    /// Output format: text, json, or jsonl
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,
    /// More log output on stderr (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// List available scan dates, most recent first
    Dates,
    /// Full aggregate report for a date
    Query(DateArgs),
    /// Summary counters and certificate posture for a date
    Summary(DateArgs),
    /// Most common ports for a date
    Ports {
        #[command(flatten)]
        args: DateArgs,
        /// Number of ports to show
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Port-to-host link pairs for graph views
    Links(DateArgs),
    /// Per-host table
    Hosts {
        #[command(flatten)]
        args: DateArgs,
        /// Output file (overwrites)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Write CSV instead of text/json (requires --out)
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// Rebuild and cache reports for several dates in parallel
    Warm {
        /// Comma-separated date keys. Default: every date under the scan root.
        #[arg(long, value_delimiter = ',')]
        dates: Vec<String>,
        /// Number of dates rebuilt at once
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Inspect or clear cached reports
    Cache {
        #[command(subcommand)]
        cmd: CacheCmd,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Settings {
    scan_root: PathBuf,
    cache_dir: PathBuf,
    format: OutputFormat,
    warm_concurrency: usize,
}

impl Settings {
    /// Flags win over the config file, which wins over built-in defaults.
    fn resolve(cli: &Cli, cfg: Option<config::Config>) -> Self {
        let cfg = cfg.unwrap_or_default();
        Settings {
            scan_root: cli.scan_root.clone().or(cfg.scan_root).unwrap_or_else(|| config::DEFAULT_SCAN_ROOT.into()),
            cache_dir: cli.cache_dir.clone().or(cfg.cache_dir).unwrap_or_else(|| config::DEFAULT_CACHE_DIR.into()),
            format: cli
                .format
                .or_else(|| cfg.format.as_deref().map(OutputFormat::from_config))
                .unwrap_or(OutputFormat::Text),
            warm_concurrency: cfg.warm_concurrency.unwrap_or(config::DEFAULT_WARM_CONCURRENCY).max(1),
        }
    }

    fn engine(&self) -> Engine {
        Engine::new(Arc::new(FsScanSource::new(&self.scan_root)), Arc::new(FsCache::new(&self.cache_dir)))
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let loaded_cfg = config::load_config(cli.config.as_deref());
    let settings = Settings::resolve(&cli, loaded_cfg);
    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e, settings.format);
            ExitCode::FAILURE
        }
    }
}

fn error_kind(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<QueryError>().map(QueryError::kind).unwrap_or("internal")
}

fn error_payload(err: &anyhow::Error) -> serde_json::Value {
    serde_json::json!({ "error": error_kind(err), "message": format!("{:#}", err) })
}

/// Every failure leaves as one structured line in the selected format.
fn print_error(err: &anyhow::Error, format: OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("error ({}): {:#}", error_kind(err), err),
        OutputFormat::Json | OutputFormat::Jsonl => println!("{}", error_payload(err)),
    }
}

fn run(command: Commands, s: &Settings) -> Result<()> {
    let format = s.format;
    match command {
        Commands::Version => {
            println!("scanboard {} (core {})", env!("CARGO_PKG_VERSION"), scanboard_core::version());
        }
        Commands::Dates => {
            let dates: Vec<String> = list_scan_dates(&s.scan_root).into_iter().map(|d| d.to_string()).collect();
            match format {
                OutputFormat::Text => for d in &dates { println!("{}", d); },
                OutputFormat::Json => println!("{}", serde_json::to_string(&dates)?),
                OutputFormat::Jsonl => for d in &dates { println!("{}", serde_json::json!({ "date": d })); },
            }
        }
        Commands::Query(args) => {
            let out = fetch(s, &args)?;
            match format {
                OutputFormat::Text => print!("{}", render_report_text(&out.report, out.origin)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&out.report)?),
                OutputFormat::Jsonl => println!("{}", serde_json::to_string(&out.report)?),
            }
        }
        Commands::Summary(args) => {
            let out = fetch(s, &args)?;
            let view = views::summary_view(&out.report);
            match format {
                OutputFormat::Text => {
                    let sm = &view.summary;
                    println!(
                        "{}: {} files ({} skipped), {} live hosts, {} port entries, {} unique ports",
                        view.scan_date, sm.total_files, sm.skipped_files, sm.live_hosts, sm.total_port_entries, sm.unique_port_count
                    );
                    let t = &view.tls_posture;
                    println!("tls: {} valid, {} expired, {} self-signed", t.valid, t.expired, t.self_signed);
                }
                OutputFormat::Json | OutputFormat::Jsonl => println!("{}", serde_json::to_string(&view)?),
            }
        }
        Commands::Ports { args, top } => {
            if top == 0 { return Err(anyhow!("--top must be > 0")); }
            let out = fetch(s, &args)?;
            let ports = views::top_ports(&out.report, top);
            match format {
                OutputFormat::Text => for (port, count) in &ports { println!("{:<12} {}", port, count); },
                OutputFormat::Json => {
                    let counts: OrderedCounts = ports.into_iter().collect();
                    println!("{}", serde_json::to_string(&counts)?);
                }
                OutputFormat::Jsonl => {
                    for (port, count) in &ports {
                        println!("{}", serde_json::json!({ "port": port, "count": count }));
                    }
                }
            }
        }
        Commands::Links(args) => {
            let out = fetch(s, &args)?;
            let links = views::port_host_links(&out.report);
            match format {
                OutputFormat::Text => for l in &links { println!("{} -> {}", l.source, l.target); },
                OutputFormat::Json => println!("{}", serde_json::to_string(&links)?),
                OutputFormat::Jsonl => for l in &links { println!("{}", serde_json::to_string(l)?); },
            }
        }
        Commands::Hosts { args, out, csv } => {
            let fetched = fetch(s, &args)?;
            let rows = views::host_rows(&fetched.report);
            if csv {
                let Some(path) = out else { return Err(anyhow!("--csv requires --out <file>")); };
                let mut wtr = csv::Writer::from_writer(File::create(&path)?);
                wtr.write_record(["address","hostname","os","mac","vendor","open_ports","closed_ports","filtered_ports","ports"])?;
                for r in rows {
                    wtr.write_record([
                        r.address,
                        r.hostname,
                        r.os,
                        r.mac,
                        r.vendor,
                        r.open_ports.to_string(),
                        r.closed_ports.to_string(),
                        r.filtered_ports.to_string(),
                        r.ports,
                    ])?;
                }
                wtr.flush()?;
                return Ok(());
            }
            let mut w = writer_for(out.as_deref())?;
            match format {
                OutputFormat::Text => {
                    for r in &rows {
                        writeln!(w, "{:<16} {:<24} {:<28} open={} closed={} filtered={}", r.address, r.hostname, r.os, r.open_ports, r.closed_ports, r.filtered_ports)?;
                    }
                }
                OutputFormat::Json => writeln!(w, "{}", serde_json::to_string(&rows)?)?,
                OutputFormat::Jsonl => for r in &rows { writeln!(w, "{}", serde_json::to_string(r)?)?; },
            }
            w.flush()?;
        }
        Commands::Warm { dates, concurrency } => {
            let engine = Arc::new(s.engine());
            let targets: Vec<String> = if dates.is_empty() {
                engine.list_dates().into_iter().map(|d| d.to_string()).collect()
            } else { dates };
            if targets.is_empty() { return Err(anyhow!("no scan dates found under {}", s.scan_root.display())); }
            let limit = concurrency.unwrap_or(s.warm_concurrency).max(1);
            let started = Instant::now();
            let rt = tokio::runtime::Runtime::new()?;
            let results = rt.block_on(warm(engine, targets, limit))?;
            let failed = results.iter().filter(|(_, r)| r.is_err()).count();
            let mut lines = Vec::with_capacity(results.len());
            for (date, res) in &results {
                lines.push(match res {
                    Ok(o) => serde_json::json!({
                        "date": date,
                        "status": "ok",
                        "total_files": o.report.summary.total_files,
                        "live_hosts": o.report.summary.live_hosts,
                        "cache_warning": o.cache_warning,
                    }),
                    Err(e) => serde_json::json!({ "date": date, "status": "error", "error": e.kind(), "message": e.to_string() }),
                });
            }
            info!(dates = results.len(), failed, duration_ms = started.elapsed().as_millis() as u64, "warm finished");
            match format {
                OutputFormat::Text => {
                    for (date, res) in &results {
                        match res {
                            Ok(o) => println!(
                                "{}: {} files, {} live hosts{}",
                                date,
                                o.report.summary.total_files,
                                o.report.summary.live_hosts,
                                o.cache_warning.as_ref().map(|w| format!(" (not cached: {})", w)).unwrap_or_default()
                            ),
                            Err(e) => println!("{}: error: {}", date, e),
                        }
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string(&lines)?),
                OutputFormat::Jsonl => for l in &lines { println!("{}", l); },
            }
            if failed > 0 { return Err(anyhow!("{} of {} dates failed", failed, results.len())); }
        }
        Commands::Cache { cmd } => {
            let cache = FsCache::new(&s.cache_dir);
            match cmd {
                CacheCmd::List => {
                    let keys: Vec<String> = cache.entries()?.into_iter().map(|d| d.to_string()).collect();
                    match format {
                        OutputFormat::Text => for k in &keys { println!("{}", k); },
                        OutputFormat::Json => println!("{}", serde_json::to_string(&keys)?),
                        OutputFormat::Jsonl => for k in &keys { println!("{}", serde_json::json!({ "date": k })); },
                    }
                }
                CacheCmd::Clear { date } => {
                    let key = DateKey::parse(&date)?;
                    cache.remove(&key)?;
                    info!(date = %key, dir = %cache.dir().display(), "cache entry removed");
                }
            }
        }
    }
    Ok(())
}

/// Run a query, reporting a failed cache write without failing the command.
fn fetch(s: &Settings, args: &DateArgs) -> Result<QueryOutcome> {
    let out = s.engine().query(&args.date, args.rebuild)?;
    if let Some(w) = &out.cache_warning {
        warn!(date = %args.date, warning = %w, "report served uncached");
        match s.format {
            OutputFormat::Text => eprintln!("warning: report not cached: {}", w),
            OutputFormat::Json | OutputFormat::Jsonl => eprintln!("{}", serde_json::json!({ "warning": w })),
        }
    }
    Ok(out)
}

async fn warm(
    engine: Arc<Engine>,
    dates: Vec<String>,
    limit: usize,
) -> Result<Vec<(String, Result<QueryOutcome, QueryError>)>> {
    let sem = Arc::new(Semaphore::new(limit));
    let mut handles = Vec::with_capacity(dates.len());
    for date in dates {
        let permit = sem.clone().acquire_owned().await?;
        let engine = engine.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let res = engine.query(&date, true);
            drop(permit);
            (date, res)
        }));
    }
    let mut out = Vec::with_capacity(handles.len());
    for h in handles { out.push(h.await?); }
    Ok(out)
}

fn writer_for(out: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

fn render_report_text(r: &AggregateReport, origin: ReportOrigin) -> String {
    let origin = match origin { ReportOrigin::Cache => "cached", ReportOrigin::Rebuilt => "rebuilt" };
    let sm = &r.summary;
    let mut s = format!("scan {} ({}, generated {})\n", r.scan_date, origin, r.generated_at);
    s.push_str(&format!(
        "files: {} ({} skipped)  live hosts: {}  port entries: {}  unique ports: {}\n",
        sm.total_files, sm.skipped_files, sm.live_hosts, sm.total_port_entries, sm.unique_port_count
    ));
    s.push_str(&format!(
        "tls: {} valid, {} expired, {} self-signed\n",
        r.tls_posture.valid, r.tls_posture.expired, r.tls_posture.self_signed
    ));
    s.push_str("top ports:\n");
    for (port, count) in r.port_distribution.iter() { s.push_str(&format!("  {:<12} {}\n", port, count)); }
    s.push_str("os:\n");
    for (os, count) in r.os_distribution.iter() { s.push_str(&format!("  {:<28} {}\n", os, count)); }
    s
}
