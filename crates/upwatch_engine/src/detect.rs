use upwatch_core::{FormatError, SourcePage, TimeConverter, UploadRecord, WindowPolicy};
use upwatch_logging::{watch_debug, watch_info};

use crate::{DetectError, PageFetcher, TableParser};

/// Finds the records on one source page that fall inside the window.
pub struct UpdateDetector<'a> {
    fetcher: &'a dyn PageFetcher,
    time: &'a TimeConverter,
}

impl<'a> UpdateDetector<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, time: &'a TimeConverter) -> Self {
        Self { fetcher, time }
    }

    /// Most-recent-first records of `source` matching `policy`. An empty
    /// result is the normal case.
    pub async fn check_updates(
        &self,
        source: &SourcePage,
        use_cache: bool,
        policy: WindowPolicy,
    ) -> Result<Vec<UploadRecord>, DetectError> {
        if policy == WindowPolicy::LastWeek {
            watch_debug!("Replay window: keeping records from the last week");
        }

        let url = source.index_url();
        let html = self.fetcher.fetch(&url, use_cache).await?;
        let records = TableParser::new(source.base(), self.time).parse(&html)?;
        watch_info!("{}: parsed {} rows from {}", source.label, records.len(), url);

        let recent = select_recent(records, self.time, policy)?;
        watch_info!("{}: {} rows inside the window", source.label, recent.len());
        Ok(recent)
    }
}

/// Reverses document order, then keeps records inside the window.
pub fn select_recent(
    records: Vec<UploadRecord>,
    time: &TimeConverter,
    policy: WindowPolicy,
) -> Result<Vec<UploadRecord>, FormatError> {
    let mut recent = Vec::new();
    for record in records.into_iter().rev() {
        if time.is_within(policy, record.published_at())? {
            recent.push(record);
        }
    }
    Ok(recent)
}
