use std::sync::Arc;

use upwatch_core::{Settings, TimeConverter, WindowPolicy};
use upwatch_logging::{watch_error, watch_info, watch_warn};

use crate::{
    ensure_cache_dir, BroadcastReport, DetectError, Dispatcher, FailureKind, FetchSettings,
    PageCache, PageFetcher, ReqwestFetcher, RunError, UpdateDetector,
};

/// How a run fetches and which window it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMode {
    pub use_cache: bool,
    pub window: WindowPolicy,
}

impl RunMode {
    /// Scheduled runs: always hit the network, current clock hour only.
    pub fn production() -> Self {
        Self {
            use_cache: false,
            window: WindowPolicy::LastHour,
        }
    }

    /// Manual verification: replay cached pages, look back a week.
    pub fn replay() -> Self {
        Self {
            use_cache: true,
            window: WindowPolicy::LastWeek,
        }
    }
}

impl Default for RunMode {
    fn default() -> Self {
        Self::production()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Checked {
        found: usize,
        report: BroadcastReport,
    },
    FetchFailed(FailureKind),
    /// Layout or timestamp format no longer matches; nothing was sent.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub label: String,
    pub outcome: PageOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: Vec<PageReport>,
}

impl RunSummary {
    pub fn total_found(&self) -> usize {
        self.pages
            .iter()
            .map(|page| match page.outcome {
                PageOutcome::Checked { found, .. } => found,
                _ => 0,
            })
            .sum()
    }

    pub fn failed_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| !matches!(page.outcome, PageOutcome::Checked { .. }))
            .count()
    }
}

/// Walks the configured source pages in order: detect, then broadcast.
pub struct Orchestrator {
    settings: Settings,
    fetcher: Arc<dyn PageFetcher>,
    dispatcher: Dispatcher,
    time: TimeConverter,
}

impl Orchestrator {
    pub fn new(settings: Settings, time: TimeConverter) -> Result<Self, RunError> {
        let cache = PageCache::new(settings.cache_dir.clone());
        let fetcher = ReqwestFetcher::new(
            FetchSettings::new(&settings.fetch, &settings.credentials),
            cache,
        )
        .map_err(RunError::FetcherSetup)?;
        let dispatcher = Dispatcher::from_settings(&settings).map_err(RunError::NotifierSetup)?;
        Ok(Self::with_parts(
            settings,
            Arc::new(fetcher),
            dispatcher,
            time,
        ))
    }

    pub fn with_parts(
        settings: Settings,
        fetcher: Arc<dyn PageFetcher>,
        dispatcher: Dispatcher,
        time: TimeConverter,
    ) -> Self {
        Self {
            settings,
            fetcher,
            dispatcher,
            time,
        }
    }

    /// A failing page is logged and recorded in the summary; only an
    /// unusable cache directory or a webhook overflow ends the run early.
    pub async fn run(&self, mode: RunMode) -> Result<RunSummary, RunError> {
        ensure_cache_dir(&self.settings.cache_dir)?;
        watch_info!(
            "Checking {} source page(s) at {}",
            self.settings.sources.len(),
            self.time.now_formatted()
        );

        let detector = UpdateDetector::new(self.fetcher.as_ref(), &self.time);
        let mut summary = RunSummary::default();
        for source in &self.settings.sources {
            let outcome = match detector
                .check_updates(source, mode.use_cache, mode.window)
                .await
            {
                Ok(records) => {
                    let report = self.dispatcher.broadcast(&records, &source.label).await?;
                    PageOutcome::Checked {
                        found: records.len(),
                        report,
                    }
                }
                Err(DetectError::Fetch(err)) => {
                    watch_warn!("{}: skipped, {}", source.label, err);
                    PageOutcome::FetchFailed(err.kind)
                }
                Err(err) => {
                    watch_error!("{}: update check aborted: {}", source.label, err);
                    PageOutcome::Rejected(err.to_string())
                }
            };
            summary.pages.push(PageReport {
                label: source.label.clone(),
                outcome,
            });
        }
        Ok(summary)
    }
}
