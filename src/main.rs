//! # SchoolScout CLI
//!
//! Command-line front end for the contact pipeline.
//!
//! ## Subcommands
//!
//! - `run`: discovery through compilation, writing every artifact
//! - `discover`: discovery and filtering only, writing the organizations CSV
//! - `crawl`: rank the pages of a single site
//! - `compile`: turn a raw contacts JSON file into the final CSVs and report
//!
//! Logs go to stderr and to `<log-dir>/schoolscout.log`; results go to stdout.

mod telemetry;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use schoolscout::collector::{ChromeBrowser, CollectorConfig};
use schoolscout::compiler::{Compiler, CompilerConfig, load_raw_contacts};
use schoolscout::crawler::{CrawlerConfig, SiteCrawler};
use schoolscout::discovery::{DiscoveryConfig, PlacesClient, write_organizations_csv};
use schoolscout::http::{FetchConfig, HttpFetcher};
use schoolscout::model::{DEFAULT_OPENAI_MODEL, DEFAULT_REQUESTS_PER_MINUTE, openai_from_env};
use schoolscout::pipeline::{
    Pipeline, PipelineConfig, PipelineConfigBuilder, RunStatus, RunSummary, ShutdownSignal,
    TitleFilterMode, discover_organizations,
};
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "Find private K-12 schools and compile their administrative contacts", long_about = None)]
struct Cli {
    /// Directory for the log file
    #[arg(long, global = true, default_value = ".schoolscout")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline for a state
    Run(RunArgs),

    /// Discover and filter organizations, writing them as CSV
    Discover(DiscoverArgs),

    /// Crawl one website and print its ranked pages
    Crawl(CrawlArgs),

    /// Compile a raw contacts JSON file into the final artifacts
    Compile(CompileArgs),
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Target state, by name or abbreviation
    #[arg(short, long)]
    state: String,

    /// County to search (repeatable); default is the state's county list
    #[arg(long = "county")]
    counties: Vec<String>,

    /// City to search (repeatable); takes precedence over counties
    #[arg(long = "city")]
    cities: Vec<String>,

    /// Maximum places API calls for the run
    #[arg(short, long)]
    budget: Option<usize>,

    /// Randomly sample this many counties; 0 searches all
    #[arg(long, default_value = "0")]
    batch_size: usize,

    /// Query templates per county (default: 5 unbounded, 2 with a budget)
    #[arg(long)]
    max_search_terms: Option<usize>,

    /// Directory holding states/<state>.txt county lists
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

impl SearchArgs {
    fn apply(&self, builder: PipelineConfigBuilder) -> PipelineConfigBuilder {
        builder
            .state(self.state.clone())
            .counties(self.counties.clone())
            .cities(self.cities.clone())
            .budget(self.budget)
            .discovery(
                DiscoveryConfig::builder()
                    .batch_size(self.batch_size)
                    .max_search_terms(self.max_search_terms)
                    .data_dir(self.data_dir.clone())
                    .build(),
            )
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TitleFilterArg {
    Rules,
    Llm,
}

impl From<TitleFilterArg> for TitleFilterMode {
    fn from(arg: TitleFilterArg) -> Self {
        match arg {
            TitleFilterArg::Rules => TitleFilterMode::Rules,
            TitleFilterArg::Llm => TitleFilterMode::Llm,
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    search: SearchArgs,

    /// Maximum pages fetched per site
    #[arg(short = 'p', long)]
    max_pages: Option<usize>,

    /// Organizations processed at once
    #[arg(short, long, default_value = "4")]
    concurrency: usize,

    /// Title classifier
    #[arg(long, value_enum, default_value = "llm")]
    title_filter: TitleFilterArg,

    /// Never fall back to the scripted browser
    #[arg(long)]
    no_browser: bool,

    /// Directory receiving every artifact
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Print the run summary as JSON
    #[arg(long)]
    summary_json: bool,

    /// OpenAI model used for extraction and classification
    #[arg(short, long, default_value = DEFAULT_OPENAI_MODEL)]
    model: String,

    /// Model requests per minute
    #[arg(long, default_value_t = DEFAULT_REQUESTS_PER_MINUTE)]
    requests_per_minute: u32,
}

#[derive(Args, Debug)]
struct DiscoverArgs {
    #[command(flatten)]
    search: SearchArgs,

    /// Organizations CSV to write
    #[arg(short, long, default_value = "output/organizations.csv")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Homepage URL
    #[arg(required = true)]
    url: String,

    /// Maximum link depth
    #[arg(short = 'd', long, default_value = "3")]
    max_depth: u32,

    /// Maximum pages fetched
    #[arg(short = 'p', long, default_value = "30")]
    max_pages: usize,
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Raw contacts JSON written by a run
    #[arg(short, long, default_value = "output/contacts_raw.json")]
    input: PathBuf,

    /// Final contacts CSV; siblings are written next to it
    #[arg(short, long, default_value = "output/final_contacts.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _otel = telemetry::init_tracing_subscriber(&cli.log_dir)?;

    match cli.command {
        Some(Commands::Run(args)) => run_command(args).await,
        Some(Commands::Discover(args)) => discover_command(args).await.map(|_| ExitCode::SUCCESS),
        Some(Commands::Crawl(args)) => crawl_command(args).await.map(|_| ExitCode::SUCCESS),
        Some(Commands::Compile(args)) => compile_command(args).map(|_| ExitCode::SUCCESS),
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["schoolscout", "--help"]);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} [{elapsed_precise}] {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

fn interruptible() -> ShutdownSignal {
    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_ctrl_c();
    shutdown
}

#[instrument]
async fn run_command(args: RunArgs) -> anyhow::Result<ExitCode> {
    let mut crawler = CrawlerConfig::builder();
    if let Some(max_pages) = args.max_pages {
        crawler = crawler.max_pages(max_pages);
    }
    let config = args
        .search
        .apply(PipelineConfig::builder())
        .concurrency(args.concurrency)
        .title_filter(args.title_filter.into())
        .output_dir(args.output_dir.clone())
        .crawler(crawler.build())
        .collector(CollectorConfig::builder().use_browser(!args.no_browser).build())
        .build();

    let places = PlacesClient::from_env(&config.discovery)?;
    let fetcher = HttpFetcher::new(config.fetch.clone())?;
    let browser = ChromeBrowser::new(&config.collector, config.fetch.user_agent.clone());
    let model = openai_from_env(&args.model, args.requests_per_minute)?
        .completion()
        .clone();

    let pipeline = Pipeline::new(config, fetcher, browser, model).with_shutdown(interruptible());
    let progress = spinner(&format!("Collecting contacts for {}...", args.search.state))?;
    let summary = pipeline.run(places).await;
    progress.finish_and_clear();

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(if summary.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_summary(summary: &RunSummary) {
    let status = match summary.status {
        RunStatus::Completed => "completed",
        RunStatus::Interrupted => "interrupted",
        RunStatus::Failed => "failed",
    };
    println!("Run {} {} for {}", summary.run_id, status, summary.state);
    if let Some(error) = &summary.error {
        println!("Error: {error}");
    }

    let counts = &summary.counts;
    println!("Places API calls:       {}", summary.api_calls);
    println!(
        "Organizations:          {} discovered, {} kept, {} with website",
        counts.organizations_discovered, counts.organizations_kept, counts.organizations_with_website
    );
    println!(
        "Processed:              {} ({} failed, {} skipped)",
        counts.organizations_processed, counts.organizations_failed, counts.organizations_skipped
    );
    println!(
        "Pages:                  {} found, {} collected",
        counts.pages_found, counts.pages_collected
    );
    println!(
        "Contacts:               {} extracted, {} kept, {} final",
        counts.contacts_extracted, counts.contacts_kept, counts.contacts_final
    );

    if let Some(paths) = &summary.outputs.contacts {
        println!("Contacts CSV:           {}", paths.contacts.display());
        println!("Quality report:         {}", paths.quality_report.display());
    }
}

#[instrument]
async fn discover_command(args: DiscoverArgs) -> anyhow::Result<()> {
    let config = args.search.apply(PipelineConfig::builder()).build();
    let places = PlacesClient::from_env(&config.discovery)?;

    let progress = spinner(&format!("Searching {}...", args.search.state))?;
    let outcome = discover_organizations(&config, places, &interruptible()).await?;
    progress.finish_and_clear();

    write_organizations_csv(&args.output, &outcome.kept)?;
    println!(
        "Discovered {} organizations, kept {} ({} rejected) using {} API calls",
        outcome.discovered,
        outcome.kept.len(),
        outcome.rejected,
        outcome.api_calls
    );
    println!("Saved organizations to {}", args.output.display());
    Ok(())
}

#[instrument]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::new(FetchConfig::default())?;
    let config = CrawlerConfig::builder()
        .max_depth(args.max_depth)
        .max_pages(args.max_pages)
        .build();
    let crawler = SiteCrawler::new(fetcher, config);

    let progress = spinner(&format!("Crawling {}...", args.url))?;
    let report = crawler.crawl(&args.url, &args.url).await?;
    progress.finish_and_clear();

    println!(
        "Fetched {} pages ({} abandoned, {} pruned), stopped: {:?}",
        report.fetched, report.abandoned, report.pruned, report.stop_reason
    );
    for page in &report.pages {
        println!(
            "{:>5}  depth {}  {}  {}",
            page.score,
            page.depth,
            page.url,
            page.title.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn output_parts(output: &Path) -> anyhow::Result<(PathBuf, String)> {
    let file_name = output
        .file_name()
        .ok_or_else(|| anyhow!("output must name a file: {}", output.display()))?
        .to_string_lossy()
        .into_owned();
    let dir = output
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok((dir, file_name))
}

#[instrument]
fn compile_command(args: CompileArgs) -> anyhow::Result<()> {
    let raw = load_raw_contacts(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let (dir, file_name) = output_parts(&args.output)?;

    let compiler = Compiler::new(CompilerConfig::builder().output_file_name(file_name).build());
    let compiled = compiler.compile(raw);
    let paths = compiler.write(&dir, &compiled.contacts)?;

    let stats = &compiled.stats;
    println!(
        "Compiled {} of {} contacts ({} duplicates, {} invalid names, {} shared mailboxes)",
        stats.output, stats.input, stats.duplicates, stats.invalid_names, stats.generic_emails
    );
    println!("Saved contacts to {}", paths.contacts.display());
    println!("Saved quality report to {}", paths.quality_report.display());
    Ok(())
}
