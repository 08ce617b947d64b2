use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNTITLED: &str = "Untitled";

/// Opaque identifier assigned by the bookmark store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkId(String);

impl BookmarkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookmarkId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One node of the bookmark tree. Folders have no url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    pub id: BookmarkId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BookmarkNode>,
}

impl BookmarkNode {
    pub fn folder(id: impl Into<String>, title: impl Into<String>, children: Vec<BookmarkNode>) -> Self {
        Self {
            id: BookmarkId::new(id),
            title: title.into(),
            url: None,
            children,
        }
    }

    pub fn bookmark(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: BookmarkId::new(id),
            title: title.into(),
            url: Some(url.into()),
            children: Vec::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.url.is_none()
    }

    /// The url when it is non-empty. An empty url does not make a bookmark.
    pub fn bookmark_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }

    /// Depth-first search for a node by id, including `self`.
    pub fn find(&self, id: &BookmarkId) -> Option<&BookmarkNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Immutable snapshot of a leaf bookmark taken when a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub id: BookmarkId,
    pub title: String,
    pub url: String,
}

/// Flattens every leaf reachable from `node` in depth-first document order.
///
/// A node carrying a non-empty url is a leaf even if it also has children.
/// Any other node contributes its children.
pub fn extract_bookmarks(node: &BookmarkNode) -> Vec<BookmarkRecord> {
    let mut out = Vec::new();
    collect_leaves(node, &mut out);
    out
}

fn collect_leaves(node: &BookmarkNode, out: &mut Vec<BookmarkRecord>) {
    if let Some(url) = node.bookmark_url() {
        out.push(BookmarkRecord {
            id: node.id.clone(),
            title: if node.title.is_empty() {
                UNTITLED.to_string()
            } else {
                node.title.clone()
            },
            url: url.to_string(),
        });
        return;
    }
    for child in &node.children {
        collect_leaves(child, out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BookmarkStats {
    pub urls: usize,
    pub folders: usize,
}

/// Counts bookmarks and titled folders under `node` (the node itself included).
/// Entries with an empty url count as neither unless they hold children.
pub fn count_bookmarks(node: &BookmarkNode) -> BookmarkStats {
    if node.bookmark_url().is_some() {
        return BookmarkStats { urls: 1, folders: 0 };
    }
    let holds_children = node.is_folder() || !node.children.is_empty();
    let mut stats = BookmarkStats {
        urls: 0,
        folders: usize::from(holds_children && !node.title.is_empty()),
    };
    for child in &node.children {
        let child_stats = count_bookmarks(child);
        stats.urls += child_stats.urls;
        stats.folders += child_stats.folders;
    }
    stats
}
