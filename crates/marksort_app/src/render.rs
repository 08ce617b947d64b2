use marksort_core::{BookmarkStats, ProgressState};

const BAR_WIDTH: usize = 20;

/// `[#####---------------]  25% Checking URLs... 5/20`
pub fn progress_line(progress: &ProgressState) -> String {
    let percent = usize::from(progress.percent.min(100));
    let filled = percent * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent,
        progress.text
    )
}

/// Closing line for a terminal snapshot; `None` while the run is going.
pub fn final_message(progress: &ProgressState) -> Option<String> {
    if let Some(error) = &progress.error {
        return Some(format!("Error: {error}"));
    }
    if progress.cancelled {
        return Some("Organization cancelled.".to_string());
    }
    progress.summary_message()
}

pub fn stats_line(stats: &BookmarkStats) -> String {
    format!("{} bookmarks in {} folders", stats.urls, stats.folders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marksort_core::RunSummary;
    use pretty_assertions::assert_eq;

    #[test]
    fn bar_tracks_percent() {
        let progress = ProgressState {
            percent: 45,
            text: "AI is analyzing your bookmarks...".to_string(),
            running: true,
            ..ProgressState::default()
        };
        assert_eq!(
            progress_line(&progress),
            "[#########-----------]  45% AI is analyzing your bookmarks..."
        );
    }

    #[test]
    fn final_message_per_outcome() {
        let running = ProgressState {
            running: true,
            ..ProgressState::default()
        };
        assert_eq!(final_message(&running), None);

        let failed = ProgressState {
            error: Some("No bookmarks found to organize".to_string()),
            ..ProgressState::default()
        };
        assert_eq!(
            final_message(&failed).as_deref(),
            Some("Error: No bookmarks found to organize")
        );

        let done = ProgressState {
            percent: 100,
            done: true,
            result: Some(RunSummary {
                organized: 12,
                folders: 3,
                dead: 2,
            }),
            ..ProgressState::default()
        };
        assert_eq!(
            final_message(&done).as_deref(),
            Some("Organized 12 bookmarks into 3 folders. Found 2 dead links.")
        );
    }
}
