use thiserror::Error;

use crate::{BookmarkId, BookmarkNode};

/// How a top-level container is recognised: store ids differ across
/// installs, titles differ across locales, so both are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialRoot {
    pub label: &'static str,
    pub candidate_ids: &'static [&'static str],
    pub candidate_titles: &'static [&'static str],
}

pub const BOOKMARK_BAR: SpecialRoot = SpecialRoot {
    label: "bookmarks bar",
    candidate_ids: &["1"],
    candidate_titles: &["Bookmarks Bar", "Bookmarks bar"],
};

pub const OTHER_BOOKMARKS: SpecialRoot = SpecialRoot {
    label: "other bookmarks",
    candidate_ids: &["2"],
    candidate_titles: &["Other Bookmarks", "Other bookmarks"],
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not find {label}")]
pub struct RootNotFound {
    pub label: &'static str,
}

/// Looks among the direct children of `tree` for the first node matching any
/// candidate id or title.
pub fn resolve_special_root<'a>(
    tree: &'a BookmarkNode,
    candidate_ids: &[&str],
    candidate_titles: &[&str],
) -> Option<&'a BookmarkNode> {
    tree.children.iter().find(|child| {
        candidate_ids.contains(&child.id.as_str()) || candidate_titles.contains(&child.title.as_str())
    })
}

impl SpecialRoot {
    pub fn resolve<'a>(&self, tree: &'a BookmarkNode) -> Result<&'a BookmarkNode, RootNotFound> {
        resolve_special_root(tree, self.candidate_ids, self.candidate_titles)
            .ok_or(RootNotFound { label: self.label })
    }

    /// The id to fall back to when no child matches.
    pub fn default_id(&self) -> BookmarkId {
        BookmarkId::new(self.candidate_ids.first().copied().unwrap_or_default())
    }
}
