//! Folder tree and breadcrumb structures for hierarchical display.

use serde::{Deserialize, Serialize};

/// A node in a folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    /// Folder identifier.
    pub id: String,
    /// Folder name.
    pub name: String,
    /// Absolute display path.
    pub path: String,
    /// Number of files directly inside this folder.
    pub file_count: u64,
    /// Child folder nodes, sorted by name.
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    /// Total number of folders in this subtree, including this node.
    pub fn total_folders(&self) -> usize {
        1 + self.children.iter().map(FolderNode::total_folders).sum::<usize>()
    }
}

/// One step of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Folder identifier; `None` for the root crumb.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Absolute display path.
    pub path: String,
}

impl Breadcrumb {
    /// The leading crumb every trail starts with.
    pub fn root() -> Self {
        Self {
            id: None,
            name: "Root".to_string(),
            path: "/".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_folders() {
        let leaf = FolderNode {
            id: "2".into(),
            name: "B".into(),
            path: "/A/B".into(),
            file_count: 0,
            children: vec![],
        };
        let root = FolderNode {
            id: "1".into(),
            name: "A".into(),
            path: "/A".into(),
            file_count: 3,
            children: vec![leaf],
        };
        assert_eq!(root.total_folders(), 2);
    }
}
