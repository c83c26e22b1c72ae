//! Table and JSON output formatting for CLI commands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::{Table, Tabled};

use filemanager_entity::{FileManagerItem, FolderNode};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One listing row.
#[derive(Debug, Serialize, Tabled)]
pub struct ItemRow {
    /// Identifier
    pub id: String,
    /// Name
    pub name: String,
    /// File or folder
    pub kind: String,
    /// Size
    pub size: String,
    /// Last modified
    pub modified: String,
    /// Display path
    pub path: String,
}

impl From<&FileManagerItem> for ItemRow {
    fn from(item: &FileManagerItem) -> Self {
        Self {
            id: item.identifier().to_string(),
            name: item.name().to_string(),
            kind: item.kind().as_str().to_string(),
            size: item.size().map(human_size).unwrap_or_else(|| "-".to_string()),
            modified: item
                .last_modified()
                .map(format_time)
                .unwrap_or_else(|| "-".to_string()),
            path: item.path().to_string(),
        }
    }
}

/// Print a list of rows in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => print_json(items),
    }
}

/// Print a list of items in the selected format
pub fn print_items(items: &[FileManagerItem], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<ItemRow> = items.iter().map(ItemRow::from).collect();
            print_list(&rows, format);
        }
        OutputFormat::Json => print_json(items),
    }
}

/// Print one item's details
pub fn print_item(item: &FileManagerItem, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let summary = item.summary();
            print_kv("ID", &summary.id);
            print_kv("Name", &summary.name);
            print_kv("Kind", summary.kind.as_str());
            print_kv("Path", &summary.path);
            print_kv("Parent", summary.parent_path.as_deref().unwrap_or("/"));
            if let Some(size) = summary.size {
                print_kv("Size", &human_size(size));
            }
            if let Some(mime) = &summary.mime_type {
                print_kv("MIME type", mime);
            }
            if let Some(modified) = summary.last_modified {
                print_kv("Modified", &format_time(modified));
            }
            if let Some(thumbnail) = &summary.thumbnail {
                print_kv("Thumbnail", thumbnail);
            }
            if let Some(duration) = summary.duration {
                print_kv("Duration", &format!("{duration}s"));
            }
        }
        OutputFormat::Json => print_json(item),
    }
}

/// Print the folder tree
pub fn print_tree(nodes: &[FolderNode], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("/");
            print_nodes(nodes, "");
        }
        OutputFormat::Json => print_json(nodes),
    }
}

fn print_nodes(nodes: &[FolderNode], prefix: &str) {
    for (idx, node) in nodes.iter().enumerate() {
        let last = idx + 1 == nodes.len();
        let branch = if last { "└── " } else { "├── " };
        println!(
            "{prefix}{branch}{}/ ({} files)",
            node.name, node.file_count
        );
        let nested = format!("{prefix}{}", if last { "    " } else { "│   " });
        print_nodes(&node.children, &nested);
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    println!("{json}");
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<16} {}", format!("{key}:"), value);
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

/// Byte count with a binary unit.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
