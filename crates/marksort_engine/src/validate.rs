use futures_util::future::join_all;
use marksort_core::BookmarkRecord;
use marksort_logging::{mark_debug, mark_info};
use tokio_util::sync::CancellationToken;

use crate::{Cancelled, LivenessProbe, ProgressSink};

pub const VALIDATION_BATCH_SIZE: usize = 10;
pub const VALIDATE_START_PERCENT: u8 = 15;
pub const VALIDATE_SPAN_PERCENT: u8 = 25;

/// Bookmarks split by probe result, each side in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validation {
    pub valid: Vec<BookmarkRecord>,
    pub dead: Vec<BookmarkRecord>,
}

impl Validation {
    /// Everything counts as valid when no probing was requested.
    pub fn all_valid(records: Vec<BookmarkRecord>) -> Self {
        Self {
            valid: records,
            dead: Vec::new(),
        }
    }
}

/// Runs a probe over bookmarks in fixed-size chunks. Probes inside a chunk
/// run concurrently; a chunk fully settles before the next one starts.
pub struct BatchValidator<'a> {
    probe: &'a dyn LivenessProbe,
    batch_size: usize,
}

impl<'a> BatchValidator<'a> {
    pub fn new(probe: &'a dyn LivenessProbe) -> Self {
        Self::with_batch_size(probe, VALIDATION_BATCH_SIZE)
    }

    pub fn with_batch_size(probe: &'a dyn LivenessProbe, batch_size: usize) -> Self {
        Self {
            probe,
            batch_size: batch_size.max(1),
        }
    }

    /// Cancellation is only observed before each chunk; a chunk already in
    /// flight always completes.
    pub async fn validate(
        &self,
        records: &[BookmarkRecord],
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<Validation, Cancelled> {
        let total = records.len();
        let mut validation = Validation::default();
        let mut checked = 0usize;

        for chunk in records.chunks(self.batch_size) {
            if cancel.is_cancelled() {
                mark_info!("URL validation cancelled after {}/{}", checked, total);
                return Err(Cancelled);
            }

            let results = join_all(chunk.iter().map(|record| async move {
                (record, self.probe.check(&record.url).await)
            }))
            .await;

            for (record, alive) in results {
                if alive {
                    validation.valid.push(record.clone());
                } else {
                    mark_debug!("Dead link {} ({})", record.url, record.id);
                    validation.dead.push(record.clone());
                }
            }

            checked += chunk.len();
            progress.report(
                validation_percent(checked, total),
                &format!("Checking URLs... {checked}/{total}"),
            );
        }

        Ok(validation)
    }
}

fn validation_percent(checked: usize, total: usize) -> u8 {
    if total == 0 {
        return VALIDATE_START_PERCENT + VALIDATE_SPAN_PERCENT;
    }
    let span = checked.min(total) * usize::from(VALIDATE_SPAN_PERCENT) / total;
    VALIDATE_START_PERCENT + span as u8
}

#[cfg(test)]
mod tests {
    use super::validation_percent;

    #[test]
    fn percent_spans_fifteen_to_forty() {
        assert_eq!(validation_percent(0, 40), 15);
        assert_eq!(validation_percent(10, 40), 21);
        assert_eq!(validation_percent(40, 40), 40);
        assert_eq!(validation_percent(0, 0), 40);
    }
}
