//! # Pipeline Module
//!
//! Runs discovery, filtering and then crawl, collect, extract and classify
//! for each kept organization, and always leaves the run's artifacts on disk.
//!
//! Organizations are independent units of work. Up to `concurrency` of them
//! are in flight at once; a failure inside one never touches the others.
//! Interruption is cooperative: the [`ShutdownSignal`] is checked before each
//! discovery query and before each organization starts, and whatever was
//! gathered up to that point is still compiled and written.

mod config;
mod shutdown;

use std::fs;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use chrono::Local;
use futures::{FutureExt, StreamExt, stream};
use rig::completion::CompletionModel;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

pub use config::{PipelineConfig, PipelineConfigBuilder, TitleFilterMode};
pub use shutdown::ShutdownSignal;

use crate::collector::{ContentCollector, ScriptedBrowser};
use crate::compiler::{CompileStats, Compiler, OutputPaths, write_raw_contacts};
use crate::crawler::SiteCrawler;
use crate::discovery::{
    DiscoveryClient, DiscoveryStats, DiscoveryStop, PlacesClient, SearchMode, TargetRegion,
    load_units, select_units, write_organizations_csv,
};
use crate::error::Result;
use crate::extraction::{ContactExtractor, TitleClassifier, TitleFilter};
use crate::filter::OrganizationFilter;
use crate::http::PageFetcher;
use crate::types::{Contact, Organization};

/// Organizations kept after filtering
pub const ORGANIZATIONS_FILE: &str = "organizations.csv";

/// Every classified contact before compilation
pub const RAW_CONTACTS_FILE: &str = "contacts_raw.json";

/// How a run ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Completed,
    Interrupted,
    Failed,
}

/// Item counts at each stage boundary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub organizations_discovered: usize,
    pub organizations_rejected: usize,
    pub organizations_kept: usize,
    pub organizations_with_website: usize,
    pub organizations_processed: usize,
    pub organizations_failed: usize,
    pub organizations_skipped: usize,
    pub pages_found: usize,
    pub pages_collected: usize,
    pub contacts_extracted: usize,
    pub contacts_kept: usize,
    pub contacts_final: usize,
}

/// Files written by a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunOutputs {
    pub organizations_csv: Option<PathBuf>,
    pub raw_contacts_json: Option<PathBuf>,
    pub contacts: Option<OutputPaths>,
}

/// Machine-readable account of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub status: RunStatus,
    pub error: Option<String>,
    pub state: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    /// Places API calls charged to the budget
    pub api_calls: usize,
    pub counts: StageCounts,
    pub discovery: Option<DiscoveryStats>,
    pub compile: Option<CompileStats>,
    pub outputs: RunOutputs,
}

impl RunSummary {
    fn start(state: &str) -> Self {
        let now = Local::now();
        Self {
            run_id: now.format("%Y%m%d_%H%M%S").to_string(),
            status: RunStatus::Completed,
            error: None,
            state: state.to_string(),
            started_at: now.to_rfc3339(),
            finished_at: None,
            api_calls: 0,
            counts: StageCounts::default(),
            discovery: None,
            compile: None,
            outputs: RunOutputs::default(),
        }
    }

    fn interrupt(&mut self) {
        if self.status == RunStatus::Completed {
            self.status = RunStatus::Interrupted;
        }
    }

    fn fail(&mut self, message: String) {
        self.status = RunStatus::Failed;
        self.error.get_or_insert(message);
    }

    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }
}

/// Result of discovery plus filtering
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    pub kept: Vec<Organization>,
    pub discovered: usize,
    pub rejected: usize,
    pub stats: DiscoveryStats,
    pub stop: DiscoveryStop,
    pub api_calls: usize,
}

/// Search the configured units and keep the organizations that pass the filter.
///
/// Explicit cities win over explicit counties; with neither, the state's unit
/// list is loaded from the data directory and sampled by `batch_size`.
#[instrument(skip_all, fields(state = %config.state))]
pub async fn discover_organizations(
    config: &PipelineConfig,
    places: PlacesClient,
    shutdown: &ShutdownSignal,
) -> Result<DiscoveryOutcome> {
    let region = TargetRegion::resolve(&config.state)?;

    let (units, mode) = if !config.cities.is_empty() {
        (config.cities.clone(), SearchMode::Cities)
    } else if !config.counties.is_empty() {
        (config.counties.clone(), SearchMode::Counties)
    } else {
        let units = load_units(&config.discovery.data_dir, &region)?;
        (select_units(units, config.discovery.batch_size), SearchMode::Counties)
    };

    let budget = config.call_budget();
    let mut client = DiscoveryClient::new(
        places,
        budget.clone(),
        region.clone(),
        config.effective_discovery(),
    );
    let report = client.discover(&units, mode, shutdown).await;

    let discovered = report.organizations.len();
    let (kept, rejected) = OrganizationFilter::new()
        .with_region(region)
        .apply(report.organizations);
    info!(
        discovered,
        kept = kept.len(),
        rejected = rejected.len(),
        api_calls = budget.used(),
        "discovery finished"
    );

    Ok(DiscoveryOutcome {
        kept,
        discovered,
        rejected: rejected.len(),
        stats: report.stats,
        stop: report.stop,
        api_calls: budget.used(),
    })
}

/// What processing one organization produced
#[derive(Debug, Clone, Default)]
pub struct OrganizationOutcome {
    pub pages_found: usize,
    pub pages_collected: usize,
    pub contacts_extracted: usize,
    /// Contacts whose title passed classification
    pub contacts: Vec<Contact>,
}

/// Totals over a batch of organizations
#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
    pub processed: usize,
    pub failed: usize,
    /// Not started because shutdown was requested
    pub skipped: usize,
    pub pages_found: usize,
    pub pages_collected: usize,
    pub contacts_extracted: usize,
    pub contacts: Vec<Contact>,
}

enum OrganizationRun {
    Done(OrganizationOutcome),
    Failed,
    Skipped,
}

/// End-to-end runner over injected fetcher, browser and model
pub struct Pipeline<F, B, M>
where
    F: PageFetcher,
    B: ScriptedBrowser,
    M: CompletionModel,
{
    config: PipelineConfig,
    crawler: SiteCrawler<F>,
    collector: ContentCollector<F, B>,
    extractor: ContactExtractor<M>,
    classifier: TitleFilter<M>,
    compiler: Compiler,
    shutdown: ShutdownSignal,
}

impl<F, B, M> Pipeline<F, B, M>
where
    F: PageFetcher + Clone,
    B: ScriptedBrowser,
    M: CompletionModel + Clone,
{
    pub fn new(config: PipelineConfig, fetcher: F, browser: B, model: M) -> Self {
        let classifier = match config.title_filter {
            TitleFilterMode::Rules => TitleFilter::rules(),
            TitleFilterMode::Llm => TitleFilter::llm(model.clone(), &config.extraction),
        };
        Self {
            crawler: SiteCrawler::new(fetcher.clone(), config.crawler.clone()),
            collector: ContentCollector::new(fetcher, browser, config.collector.clone()),
            extractor: ContactExtractor::new(model, config.extraction.clone()),
            classifier,
            compiler: Compiler::new(config.compiler.clone()),
            shutdown: ShutdownSignal::new(),
            config,
        }
    }

    /// Share an externally controlled shutdown flag
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Crawl, collect, extract and classify one organization
    #[instrument(skip_all, fields(organization = %organization.name))]
    pub async fn process_organization(&self, organization: &Organization) -> OrganizationOutcome {
        let crawl = self.crawler.crawl_organization(organization).await;
        let pages = self.collector.collect_pages(&crawl.pages).await;

        let mut outcome = OrganizationOutcome {
            pages_found: crawl.pages.len(),
            pages_collected: pages.len(),
            ..Default::default()
        };
        for page in &pages {
            let contacts = self.extractor.extract_page(page).await;
            outcome.contacts_extracted += contacts.len();
            for contact in contacts {
                if self.classifier.keep(&contact).await {
                    outcome.contacts.push(contact);
                }
            }
        }

        info!(
            pages = outcome.pages_collected,
            extracted = outcome.contacts_extracted,
            kept = outcome.contacts.len(),
            "organization done"
        );
        outcome
    }

    /// Process organizations with bounded concurrency.
    ///
    /// Organizations not yet started when shutdown is requested are skipped.
    /// A panic inside one organization counts it as failed.
    pub async fn process_organizations(&self, organizations: &[Organization]) -> ProcessReport {
        let total = organizations.len();
        let runs: Vec<OrganizationRun> = stream::iter(organizations.iter().enumerate())
            .map(|(index, organization)| async move {
                if self.shutdown.is_requested() {
                    return OrganizationRun::Skipped;
                }
                info!(organization = %organization.name, "processing organization {}/{}", index + 1, total);
                match AssertUnwindSafe(self.process_organization(organization))
                    .catch_unwind()
                    .await
                {
                    Ok(outcome) => OrganizationRun::Done(outcome),
                    Err(_) => {
                        error!(organization = %organization.name, "organization processing panicked");
                        OrganizationRun::Failed
                    }
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut report = ProcessReport::default();
        for run in runs {
            match run {
                OrganizationRun::Done(outcome) => {
                    report.processed += 1;
                    report.pages_found += outcome.pages_found;
                    report.pages_collected += outcome.pages_collected;
                    report.contacts_extracted += outcome.contacts_extracted;
                    report.contacts.extend(outcome.contacts);
                }
                OrganizationRun::Failed => report.failed += 1,
                OrganizationRun::Skipped => report.skipped += 1,
            }
        }
        if report.skipped > 0 {
            warn!(skipped = report.skipped, "shutdown requested, organizations skipped");
        }
        report
    }

    /// Run every stage and write the artifacts, whatever the outcome
    #[instrument(skip_all, fields(state = %self.config.state))]
    pub async fn run(&self, places: PlacesClient) -> RunSummary {
        let mut summary = RunSummary::start(&self.config.state);
        let mut organizations = Vec::new();
        let mut contacts = Vec::new();

        if let Err(e) = self
            .execute(places, &mut summary, &mut organizations, &mut contacts)
            .await
        {
            error!(error = %e, "run failed");
            summary.fail(e.to_string());
        }
        if let Err(e) = self.flush(&organizations, contacts, &mut summary) {
            error!(error = %e, "writing artifacts failed");
            summary.fail(e.to_string());
        }

        summary.finished_at = Some(Local::now().to_rfc3339());
        info!(
            status = ?summary.status,
            organizations = summary.counts.organizations_kept,
            contacts = summary.counts.contacts_final,
            api_calls = summary.api_calls,
            "run finished"
        );
        summary
    }

    async fn execute(
        &self,
        places: PlacesClient,
        summary: &mut RunSummary,
        organizations: &mut Vec<Organization>,
        contacts: &mut Vec<Contact>,
    ) -> Result<()> {
        let discovery = discover_organizations(&self.config, places, &self.shutdown).await?;
        summary.api_calls = discovery.api_calls;
        summary.counts.organizations_discovered = discovery.discovered;
        summary.counts.organizations_rejected = discovery.rejected;
        summary.counts.organizations_kept = discovery.kept.len();
        summary.counts.organizations_with_website = discovery
            .kept
            .iter()
            .filter(|o| o.website_url().is_some())
            .count();
        summary.discovery = Some(discovery.stats);
        *organizations = discovery.kept;

        if discovery.stop == DiscoveryStop::Interrupted || self.shutdown.is_requested() {
            summary.interrupt();
            return Ok(());
        }

        let report = self.process_organizations(organizations).await;
        summary.counts.organizations_processed = report.processed;
        summary.counts.organizations_failed = report.failed;
        summary.counts.organizations_skipped = report.skipped;
        summary.counts.pages_found = report.pages_found;
        summary.counts.pages_collected = report.pages_collected;
        summary.counts.contacts_extracted = report.contacts_extracted;
        summary.counts.contacts_kept = report.contacts.len();
        if report.skipped > 0 {
            summary.interrupt();
        }
        *contacts = report.contacts;
        Ok(())
    }

    fn flush(
        &self,
        organizations: &[Organization],
        contacts: Vec<Contact>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir)?;

        let organizations_csv = dir.join(ORGANIZATIONS_FILE);
        write_organizations_csv(&organizations_csv, organizations)?;
        summary.outputs.organizations_csv = Some(organizations_csv);

        let raw_contacts = dir.join(RAW_CONTACTS_FILE);
        write_raw_contacts(&raw_contacts, &contacts)?;
        summary.outputs.raw_contacts_json = Some(raw_contacts);

        let compiled = self.compiler.compile(contacts);
        summary.counts.contacts_final = compiled.stats.output;
        summary.compile = Some(compiled.stats);
        summary.outputs.contacts = Some(self.compiler.write(dir, &compiled.contacts)?);
        Ok(())
    }
}
