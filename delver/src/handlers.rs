use anyhow::{Context, bail};
use chrono::Utc;
use clap::ArgMatches;
use colored::Colorize;
use delver_core::report::{ReportData, ReportFormat, generate_report, save_report};
use delver_core::{CrawlMode, CrawlStatistics, GraphSnapshot, LinkFilter};
use delver_scanner::{
    BfsOptions, CrawlResult, Crawler, FetcherConfig, HybridOptions, Termination,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Which engine a command runs, with its limits
#[derive(Debug, Clone)]
pub enum CrawlPlan {
    Search(BfsOptions),
    Deep(HybridOptions),
}

impl CrawlPlan {
    pub fn mode(&self) -> CrawlMode {
        match self {
            CrawlPlan::Search(_) => CrawlMode::Search,
            CrawlPlan::Deep(_) => CrawlMode::DeepResearch,
        }
    }
}

/// Where and how the results of a crawl are written
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub graph: Option<PathBuf>,
}

pub fn print_banner() {
    let banner = r#"
     _      _
  __| | ___| |_   _____ _ __
 / _` |/ _ \ \ \ / / _ \ '__|
| (_| |  __/ |\ V /  __/ |
 \__,_|\___|_| \_/ \___|_|
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "breadth and depth research crawler".bright_white(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}

/// Install the tracing subscriber. `RUST_LOG` wins over the flags.
pub fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// Helper functions for seed handling

/// Load seeds from either a hosts file or the `--url` arguments
pub fn load_urls_from_source(
    urls: &[Url],
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if !urls.is_empty() {
        Ok(urls.iter().map(|url| url.as_str().to_string()).collect())
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file. A leading `~` in the path is expanded.
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, String> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let content = fs::read_to_string(&expanded)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    warn!("Skipping invalid URL '{}'", line);
    None
}

// Argument extraction

fn usize_arg(args: &ArgMatches, name: &str) -> anyhow::Result<usize> {
    args.get_one::<usize>(name)
        .copied()
        .with_context(|| format!("missing --{}", name))
}

fn u64_arg(args: &ArgMatches, name: &str) -> anyhow::Result<u64> {
    args.get_one::<u64>(name)
        .copied()
        .with_context(|| format!("missing --{}", name))
}

pub fn seeds_from_args(args: &ArgMatches) -> anyhow::Result<Vec<String>> {
    let urls: Vec<Url> = args
        .get_many::<Url>("url")
        .map(|urls| urls.cloned().collect())
        .unwrap_or_default();
    let hosts_file = args.get_one::<PathBuf>("hosts-file");

    load_urls_from_source(&urls, hosts_file).map_err(anyhow::Error::msg)
}

pub fn fetcher_config_from_args(args: &ArgMatches) -> anyhow::Result<FetcherConfig> {
    Ok(FetcherConfig::default().with_timeout(Duration::from_secs(u64_arg(args, "timeout")?)))
}

pub fn search_options_from_args(args: &ArgMatches) -> anyhow::Result<BfsOptions> {
    Ok(BfsOptions::default()
        .with_max_depth(usize_arg(args, "max-depth")?)
        .with_max_pages(usize_arg(args, "max-pages")?)
        .with_link_cap(usize_arg(args, "links-per-page")?)
        .with_delay(Duration::from_millis(u64_arg(args, "delay")?)))
}

pub fn deep_options_from_args(args: &ArgMatches) -> anyhow::Result<HybridOptions> {
    Ok(HybridOptions::default()
        .with_bfs_pages(usize_arg(args, "bfs-pages")?)
        .with_dfs_depth(usize_arg(args, "dfs-depth")?)
        .with_max_pages(usize_arg(args, "max-pages")?)
        .with_bfs_link_cap(usize_arg(args, "bfs-links")?)
        .with_dfs_link_cap(usize_arg(args, "dfs-links")?)
        .with_delay(Duration::from_millis(u64_arg(args, "delay")?)))
}

pub fn output_options_from_args(args: &ArgMatches) -> anyhow::Result<OutputOptions> {
    let format_name = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let Some(format) = ReportFormat::from_str(format_name) else {
        bail!("Unsupported report format: {}", format_name);
    };

    Ok(OutputOptions {
        format,
        output: args.get_one::<PathBuf>("output").cloned(),
        graph: args.get_one::<PathBuf>("graph").cloned(),
    })
}

// Command handlers

pub async fn handle_search(args: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let plan = CrawlPlan::Search(search_options_from_args(args)?);
    run_command(args, plan, quiet).await
}

pub async fn handle_deep(args: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let plan = CrawlPlan::Deep(deep_options_from_args(args)?);
    run_command(args, plan, quiet).await
}

async fn run_command(args: &ArgMatches, plan: CrawlPlan, quiet: bool) -> anyhow::Result<()> {
    let seeds = seeds_from_args(args)?;
    let output = output_options_from_args(args)?;
    let config = fetcher_config_from_args(args)?;
    let link_filter = LinkFilter::new(usize_arg(args, "max-links")?);

    if !quiet {
        print_plan(&plan, &seeds);
    }

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with the pages crawled so far");
            ctrl_c_token.cancel();
        }
    });

    let spinner = crawl_spinner(quiet);
    let progress_spinner = spinner.clone();
    let mut crawler = Crawler::with_http(config)?
        .with_link_filter(link_filter)
        .with_cancellation(token)
        .with_progress_callback(Arc::new(move |count: usize, url: String| {
            progress_spinner.set_message(format!("{} pages | {}", count, url));
        }));

    let started_at = Utc::now();
    let result = execute_plan(&mut crawler, &seeds, &plan).await;
    spinner.finish_and_clear();
    let result = result?;

    let statistics = crawler.statistics();
    if !quiet {
        print_summary(&result, &statistics);
    }

    let report = ReportData::new(
        plan.mode(),
        seeds,
        started_at,
        result.termination.to_string(),
        statistics,
        &result.pages,
    )
    .with_finished_at(Utc::now());
    write_outputs(&report, &crawler.graph_snapshot(), &output)
}

/// Run the engine selected by `plan` on an already configured crawler
pub async fn execute_plan(
    crawler: &mut Crawler,
    seeds: &[String],
    plan: &CrawlPlan,
) -> anyhow::Result<CrawlResult> {
    let result = match plan {
        CrawlPlan::Search(options) => crawler.crawl_bfs(seeds, options).await,
        CrawlPlan::Deep(options) => crawler.crawl_hybrid(seeds, options).await,
    };
    result.context("Crawl aborted")
}

/// Render the report and, when requested, the graph snapshot
pub fn write_outputs(
    report: &ReportData,
    snapshot: &GraphSnapshot,
    options: &OutputOptions,
) -> anyhow::Result<()> {
    let rendered = generate_report(report, options.format).context("Failed to render report")?;
    match options.output {
        Some(ref path) => {
            save_report(&rendered, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("{} Report saved to {}", "✓".green().bold(), path.display());
        }
        None => print!("{}", rendered),
    }

    if let Some(ref path) = options.graph {
        write_graph(snapshot, path)?;
        println!("{} Graph saved to {}", "✓".green().bold(), path.display());
    }
    Ok(())
}

/// Write a snapshot as Graphviz DOT for `.dot` paths, JSON otherwise
pub fn write_graph(snapshot: &GraphSnapshot, path: &Path) -> anyhow::Result<()> {
    let is_dot = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dot"));

    let content = if is_dot {
        snapshot.to_dot()
    } else {
        snapshot.to_json().context("Failed to serialize graph")?
    };
    fs::write(path, content)
        .with_context(|| format!("Failed to write graph to {}", path.display()))?;
    info!("Wrote {} nodes to {}", snapshot.nodes.len(), path.display());
    Ok(())
}

fn crawl_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.cyan} {elapsed} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("starting");
    spinner
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_plan(plan: &CrawlPlan, seeds: &[String]) {
    print_divider();
    println!("  {}", plan.mode().label().bright_white().bold());
    print_divider();
    println!("{} {} seed URL(s)", "→".blue(), seeds.len());
    match plan {
        CrawlPlan::Search(options) => {
            println!("{} Max depth: {}", "→".blue(), options.max_depth);
            println!("{} Max pages: {}", "→".blue(), options.max_pages);
            println!("{} Links per page: {}", "→".blue(), options.link_cap);
        }
        CrawlPlan::Deep(options) => {
            println!("{} Seed pages: {}", "→".blue(), options.bfs_pages);
            println!("{} Dive depth: {}", "→".blue(), options.dfs_depth);
            println!("{} Max pages: {}", "→".blue(), options.max_pages);
        }
    }
    println!();
}

fn print_summary(result: &CrawlResult, statistics: &CrawlStatistics) {
    let status = match result.termination {
        Termination::Cancelled => "✗".yellow().bold(),
        _ => "✓".green().bold(),
    };
    println!(
        "{} Crawl finished ({}): {} pages in {:.1}s",
        status,
        result.termination,
        result.pages.len(),
        result.elapsed.as_secs_f64()
    );
    println!(
        "{} {} nodes, {} failed, {:.1}% success",
        "→".blue(),
        statistics.total_nodes,
        statistics.failed_nodes,
        statistics.success_rate
    );
    if result.stack_operations > 0 || result.seed_count > 0 {
        println!(
            "{} {} seeds, {} queue ops, {} stack ops",
            "→".blue(),
            result.seed_count,
            result.queue_operations,
            result.stack_operations
        );
    }
    println!();
}
