use std::sync::Arc;

use marksort_core::{
    check_coverage, extract_bookmarks, BookmarkId, BookmarkNode, CategoryPlan, RunRequest,
    RunSummary, BOOKMARK_BAR, OTHER_BOOKMARKS,
};
use marksort_logging::{mark_info, mark_warn};
use tokio_util::sync::CancellationToken;

use crate::validate::{BatchValidator, Validation, VALIDATE_START_PERCENT, VALIDATION_BATCH_SIZE};
use crate::{
    BookmarkStore, Categorizer, LivenessProbe, ModelClient, MutationWarning, OrganizeError,
    ProgressSink, RunEnd, RunOutcome, Stage,
};

pub const DEAD_LINKS_FOLDER: &str = "Dead Links";

/// Produces the `YYYY-MM-DD` stamp used in backup folder titles.
pub type DateSource = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct OrganizerConfig {
    pub today: DateSource,
    pub validation_batch_size: usize,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            today: Arc::new(|| chrono::Utc::now().format("%Y-%m-%d").to_string()),
            validation_batch_size: VALIDATION_BATCH_SIZE,
        }
    }
}

/// Runs the whole organization pipeline against a bookmark store.
///
/// Stages run strictly in order and each one checks the cancellation token
/// on entry. Any error aborts the run and leaves already applied mutations
/// in place.
#[derive(Clone)]
pub struct Reorganizer {
    store: Arc<dyn BookmarkStore>,
    probe: Arc<dyn LivenessProbe>,
    model: Arc<dyn ModelClient>,
    config: OrganizerConfig,
}

impl Reorganizer {
    pub fn new(
        store: Arc<dyn BookmarkStore>,
        probe: Arc<dyn LivenessProbe>,
        model: Arc<dyn ModelClient>,
        config: OrganizerConfig,
    ) -> Self {
        Self {
            store,
            probe,
            model,
            config,
        }
    }

    pub async fn run(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<RunEnd, OrganizeError> {
        if let Some(end) = checkpoint(cancel, Stage::LoadTree) {
            return Ok(end);
        }
        progress.report(5, "Loading bookmarks...");
        let tree = self.store.get_full_tree().await?;
        let bar = BOOKMARK_BAR.resolve(&tree)?;
        let records = extract_bookmarks(bar);
        progress.report(10, &format!("Found {} bookmarks", records.len()));
        if records.is_empty() {
            return Err(OrganizeError::EmptyInput);
        }

        let validation = if request.validate_urls {
            if let Some(end) = checkpoint(cancel, Stage::Validate) {
                return Ok(end);
            }
            progress.report(VALIDATE_START_PERCENT, "Checking for dead links...");
            let validator =
                BatchValidator::with_batch_size(self.probe.as_ref(), self.config.validation_batch_size);
            let Ok(validation) = validator.validate(&records, cancel, progress).await else {
                return Ok(RunEnd::Cancelled {
                    stage: Stage::Validate,
                });
            };
            progress.report(
                40,
                &format!(
                    "{} alive, {} dead",
                    validation.valid.len(),
                    validation.dead.len()
                ),
            );
            validation
        } else {
            Validation::all_valid(records)
        };

        if let Some(end) = checkpoint(cancel, Stage::Categorize) {
            return Ok(end);
        }
        progress.report(45, "AI is analyzing your bookmarks...");
        let plans = Categorizer::new(self.model.as_ref())
            .categorize(&validation.valid, &request.credential, request.max_folders)
            .await?;
        let coverage = check_coverage(&plans, validation.valid.len());
        if !coverage.is_partition() {
            mark_warn!(
                "Model plan is not a partition: missing={:?} duplicated={:?} out_of_range={:?}",
                coverage.missing,
                coverage.duplicated,
                coverage.out_of_range
            );
        }
        progress.report(70, &format!("Created {} categories", plans.len()));

        if let Some(end) = checkpoint(cancel, Stage::Backup) {
            return Ok(end);
        }
        progress.report(75, "Backing up old bookmarks...");
        let warnings = self.backup(&tree, &bar.id).await?;
        progress.report(80, "Old bookmarks backed up");

        if let Some(end) = checkpoint(cancel, Stage::CreateFolders) {
            return Ok(end);
        }
        progress.report(85, "Creating new folders...");
        self.create_folders(&bar.id, &plans, &validation).await?;

        if let Some(end) = checkpoint(cancel, Stage::CreateDeadLinksFolder) {
            return Ok(end);
        }
        if !validation.dead.is_empty() {
            self.create_dead_links_folder(&bar.id, &validation).await?;
        }

        progress.report(100, "Done!");
        let summary = RunSummary {
            organized: validation.valid.len(),
            folders: plans.len(),
            dead: validation.dead.len(),
        };
        mark_info!(
            "Organized {} bookmarks into {} folders ({} dead, {} backup warnings)",
            summary.organized,
            summary.folders,
            summary.dead,
            warnings.len()
        );
        Ok(RunEnd::Completed(RunOutcome {
            summary,
            warnings,
            coverage,
        }))
    }

    /// Moves everything currently on the bar into a dated folder under the
    /// secondary root. Individual move failures are collected, not fatal.
    async fn backup(
        &self,
        tree: &BookmarkNode,
        bar_id: &BookmarkId,
    ) -> Result<Vec<MutationWarning>, OrganizeError> {
        let parent = OTHER_BOOKMARKS
            .resolve(tree)
            .map(|node| node.id.clone())
            .unwrap_or_else(|_| OTHER_BOOKMARKS.default_id());
        let title = format!("Backup {}", (self.config.today)());
        let backup = self.store.create_folder(&parent, &title).await?;
        mark_info!("Created backup folder {:?} ({})", title, backup.id);

        let mut warnings = Vec::new();
        for item in self.store.get_children(bar_id).await? {
            if let Err(err) = self.store.move_item(&item.id, &backup.id).await {
                let warning = MutationWarning {
                    item: item.id.clone(),
                    title: item.title.clone(),
                    message: err.to_string(),
                };
                mark_warn!("{}", warning);
                warnings.push(warning);
            }
        }
        Ok(warnings)
    }

    async fn create_folders(
        &self,
        bar_id: &BookmarkId,
        plans: &[CategoryPlan],
        validation: &Validation,
    ) -> Result<(), OrganizeError> {
        for plan in plans {
            let folder = self.store.create_folder(bar_id, &plan.name).await?;
            for record in plan.resolve(&validation.valid) {
                self.store
                    .create_bookmark(&folder.id, &record.title, &record.url)
                    .await?;
            }
        }
        Ok(())
    }

    async fn create_dead_links_folder(
        &self,
        bar_id: &BookmarkId,
        validation: &Validation,
    ) -> Result<(), OrganizeError> {
        let folder = self.store.create_folder(bar_id, DEAD_LINKS_FOLDER).await?;
        for record in &validation.dead {
            self.store
                .create_bookmark(&folder.id, &record.title, &record.url)
                .await?;
        }
        Ok(())
    }
}

fn checkpoint(cancel: &CancellationToken, stage: Stage) -> Option<RunEnd> {
    if cancel.is_cancelled() {
        mark_info!("Run cancelled before {:?}", stage);
        Some(RunEnd::Cancelled { stage })
    } else {
        None
    }
}
