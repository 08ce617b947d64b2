//! Marksort core: bookmark data model and the pure progress state machine.
mod effect;
mod msg;
mod plan;
mod roots;
mod state;
mod tree;
mod update;
mod view_model;

pub use effect::{Effect, RunRequest};
pub use msg::Msg;
pub use plan::{check_coverage, CategoryPlan, PlanCoverage};
pub use roots::{resolve_special_root, RootNotFound, SpecialRoot, BOOKMARK_BAR, OTHER_BOOKMARKS};
pub use state::{OrganizerState, RunId, CANCELLED_TEXT, MAX_PERCENT, STARTING_TEXT};
pub use tree::{
    count_bookmarks, extract_bookmarks, BookmarkId, BookmarkNode, BookmarkRecord, BookmarkStats,
    UNTITLED,
};
pub use update::update;
pub use view_model::{ProgressState, RunSummary};
