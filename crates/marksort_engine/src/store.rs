use std::sync::Mutex;

use marksort_core::{BookmarkId, BookmarkNode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("bookmark {0} not found")]
    NotFound(BookmarkId),
    #[error("bookmark {0} is not a folder")]
    NotAFolder(BookmarkId),
    #[error("cannot move {item} into {parent}")]
    InvalidMove { item: BookmarkId, parent: BookmarkId },
    #[error("bookmark store failure: {0}")]
    Backend(String),
}

/// The ordered bookmark tree the pipeline reads and rewrites.
///
/// Every call may fail on its own; callers decide which failures are fatal.
#[async_trait::async_trait]
pub trait BookmarkStore: Send + Sync {
    /// The invisible root whose children are the top-level containers.
    async fn get_full_tree(&self) -> Result<BookmarkNode, StoreError>;

    async fn get_children(&self, folder: &BookmarkId) -> Result<Vec<BookmarkNode>, StoreError>;

    async fn create_folder(
        &self,
        parent: &BookmarkId,
        title: &str,
    ) -> Result<BookmarkNode, StoreError>;

    async fn create_bookmark(
        &self,
        parent: &BookmarkId,
        title: &str,
        url: &str,
    ) -> Result<BookmarkNode, StoreError>;

    /// Appends `item` to the end of `new_parent`'s children.
    async fn move_item(&self, item: &BookmarkId, new_parent: &BookmarkId) -> Result<(), StoreError>;
}

/// Bookmark store backed by an owned tree. New ids continue after the
/// largest numeric id already present.
#[derive(Debug)]
pub struct InMemoryBookmarkStore {
    inner: Mutex<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    root: BookmarkNode,
    next_id: u64,
}

impl InMemoryBookmarkStore {
    pub fn new(root: BookmarkNode) -> Self {
        let next_id = max_numeric_id(&root) + 1;
        Self {
            inner: Mutex::new(StoreInner { root, next_id }),
        }
    }

    /// A root with an empty bookmarks bar (`1`) and other-bookmarks folder (`2`).
    pub fn with_default_roots() -> Self {
        Self::new(BookmarkNode::folder(
            "0",
            "",
            vec![
                BookmarkNode::folder("1", "Bookmarks Bar", Vec::new()),
                BookmarkNode::folder("2", "Other Bookmarks", Vec::new()),
            ],
        ))
    }

    /// Clone of the current tree.
    pub fn snapshot(&self) -> BookmarkNode {
        self.lock().root.clone()
    }

    pub fn into_tree(self) -> BookmarkNode {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .root
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, parent: &BookmarkId, title: &str, url: Option<&str>) -> Result<BookmarkNode, StoreError> {
        let mut inner = self.lock();
        let id = BookmarkId::new(inner.next_id.to_string());
        let node = BookmarkNode {
            id,
            title: title.to_string(),
            url: url.map(str::to_string),
            children: Vec::new(),
        };
        let parent_node = find_folder_mut(&mut inner.root, parent)?;
        parent_node.children.push(node.clone());
        inner.next_id += 1;
        Ok(node)
    }
}

#[async_trait::async_trait]
impl BookmarkStore for InMemoryBookmarkStore {
    async fn get_full_tree(&self) -> Result<BookmarkNode, StoreError> {
        Ok(self.snapshot())
    }

    async fn get_children(&self, folder: &BookmarkId) -> Result<Vec<BookmarkNode>, StoreError> {
        let inner = self.lock();
        let node = inner
            .root
            .find(folder)
            .ok_or_else(|| StoreError::NotFound(folder.clone()))?;
        if !node.is_folder() {
            return Err(StoreError::NotAFolder(folder.clone()));
        }
        Ok(node.children.clone())
    }

    async fn create_folder(
        &self,
        parent: &BookmarkId,
        title: &str,
    ) -> Result<BookmarkNode, StoreError> {
        self.insert(parent, title, None)
    }

    async fn create_bookmark(
        &self,
        parent: &BookmarkId,
        title: &str,
        url: &str,
    ) -> Result<BookmarkNode, StoreError> {
        self.insert(parent, title, Some(url))
    }

    async fn move_item(&self, item: &BookmarkId, new_parent: &BookmarkId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if &inner.root.id == item {
            return Err(StoreError::InvalidMove {
                item: item.clone(),
                parent: new_parent.clone(),
            });
        }
        {
            let moving = inner
                .root
                .find(item)
                .ok_or_else(|| StoreError::NotFound(item.clone()))?;
            if moving.find(new_parent).is_some() {
                return Err(StoreError::InvalidMove {
                    item: item.clone(),
                    parent: new_parent.clone(),
                });
            }
        }
        // Validate the destination before detaching so a failed move leaves
        // the tree untouched.
        find_folder_mut(&mut inner.root, new_parent)?;
        let node = detach(&mut inner.root, item).ok_or_else(|| StoreError::NotFound(item.clone()))?;
        find_folder_mut(&mut inner.root, new_parent)?.children.push(node);
        Ok(())
    }
}

fn find_mut<'a>(node: &'a mut BookmarkNode, id: &BookmarkId) -> Option<&'a mut BookmarkNode> {
    if &node.id == id {
        return Some(node);
    }
    node.children.iter_mut().find_map(|child| find_mut(child, id))
}

fn find_folder_mut<'a>(
    root: &'a mut BookmarkNode,
    id: &BookmarkId,
) -> Result<&'a mut BookmarkNode, StoreError> {
    let node = find_mut(root, id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
    if !node.is_folder() {
        return Err(StoreError::NotAFolder(id.clone()));
    }
    Ok(node)
}

fn detach(node: &mut BookmarkNode, id: &BookmarkId) -> Option<BookmarkNode> {
    if let Some(pos) = node.children.iter().position(|child| &child.id == id) {
        return Some(node.children.remove(pos));
    }
    node.children.iter_mut().find_map(|child| detach(child, id))
}

fn max_numeric_id(node: &BookmarkNode) -> u64 {
    let own = node.id.as_str().parse::<u64>().unwrap_or(0);
    node.children
        .iter()
        .map(max_numeric_id)
        .fold(own, u64::max)
}
