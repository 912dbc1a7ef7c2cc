//! Project workspace access.
//!
//! Everything the file explorer and editor need, with every path confined
//! to the project root. All validation happens here; route handlers only
//! translate errors.

use crate::error::ApiError;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One filesystem entry in the explorer tree. `path` is relative to the
/// project root and forward-slash separated on every host OS. `children`
/// is absent for files and present (possibly empty) for directories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// Entry names never shown in the tree.
const SKIPPED_ENTRIES: [&str; 2] = [".git", "node_modules"];

fn skipped_name(name: &str) -> bool {
    SKIPPED_ENTRIES.contains(&name) || name.starts_with('.')
}

pub struct WorkspaceTools {
    root: PathBuf,
}

impl WorkspaceTools {
    /// `root` must already be canonical; the config layer takes care of that.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a client-supplied path against the project root.
    ///
    /// Accepts either separator convention and folds `.`/`..` segments
    /// lexically without touching the filesystem. Any traversal that would
    /// climb above the root is denied. The result is inside the root by
    /// construction, so there is no prefix comparison that a sibling
    /// directory sharing the root's name as a prefix could fool. A leading
    /// separator is treated as root-relative.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, ApiError> {
        let normalized = raw.replace('\\', "/");
        let mut resolved = self.root.clone();
        let mut depth: usize = 0;
        for part in normalized.split('/') {
            match part {
                "" | "." => continue,
                ".." => {
                    if depth == 0 {
                        return Err(ApiError::AccessDenied);
                    }
                    resolved.pop();
                    depth -= 1;
                }
                name => {
                    resolved.push(name);
                    depth += 1;
                }
            }
        }
        Ok(resolved)
    }

    /// Build the explorer tree for the whole workspace.
    pub async fn tree(&self) -> Result<Vec<FileNode>, ApiError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let mut visited = HashSet::new();
            visited.insert(std::fs::canonicalize(&root)?);
            build_dir(&root, &root, &mut visited)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("tree task failed: {}", e)))?
    }

    /// Flat, sorted listing of the workspace's top-level entry names.
    /// Unfiltered on purpose: this backs the diagnostics endpoint.
    pub async fn list_root(&self) -> Result<Vec<String>, ApiError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let mut names = Vec::new();
            for entry in WalkDir::new(&root).min_depth(1).max_depth(1).sort_by_file_name() {
                let entry = entry
                    .map_err(|e| ApiError::Internal(format!("Failed to read directory: {}", e)))?;
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            Ok(names)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("listing task failed: {}", e)))?
    }

    /// Read one file as text.
    pub async fn read(&self, raw: &str) -> Result<String, ApiError> {
        let path = self.resolve(raw)?;
        let display = display_path(raw);
        let meta = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
            // NotADirectory: a parent component is a regular file, so the
            // requested path does not exist either.
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                ApiError::NotFound(display.clone())
            }
            _ => ApiError::from(e),
        })?;
        if !meta.is_file() {
            return Err(ApiError::BadRequest(format!("Not a regular file: {}", display)));
        }
        Ok(tokio::fs::read_to_string(&path).await?)
    }

    /// Overwrite (create-or-truncate) one file, creating parent directories
    /// as needed.
    pub async fn write(&self, raw: &str, content: &str) -> Result<(), ApiError> {
        let path = self.resolve(raw)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        Ok(())
    }
}

/// Client-facing form of a workspace path.
pub fn display_path(raw: &str) -> String {
    raw.replace('\\', "/")
}

fn build_dir(
    root: &Path,
    dir: &Path,
    visited: &mut HashSet<PathBuf>,
) -> Result<Vec<FileNode>, ApiError> {
    let mut nodes = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                // A followed symlink pointing back into its own ancestry
                // surfaces as a loop error, not an entry; drop the edge like
                // any revisited directory. Entries the name filter hides
                // never fail the tree, even when they cannot be stat-ed.
                let hidden = err
                    .path()
                    .and_then(Path::file_name)
                    .is_some_and(|n| skipped_name(&n.to_string_lossy()));
                if err.loop_ancestor().is_some() || hidden {
                    continue;
                }
                return Err(ApiError::Internal(format!(
                    "Failed to read directory: {}",
                    err
                )));
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if skipped_name(&name) {
            continue;
        }
        let rel = relative_path(root, entry.path())?;
        if entry.file_type().is_dir() {
            // Revisiting a real path means a symlink cycle; drop the edge.
            let real = std::fs::canonicalize(entry.path())?;
            if !visited.insert(real) {
                continue;
            }
            let children = build_dir(root, entry.path(), visited)?;
            nodes.push(FileNode {
                name,
                kind: NodeKind::Directory,
                path: rel,
                children: Some(children),
            });
        } else {
            nodes.push(FileNode {
                name,
                kind: NodeKind::File,
                path: rel,
                children: None,
            });
        }
    }
    Ok(nodes)
}

fn relative_path(root: &Path, path: &Path) -> Result<String, ApiError> {
    let rel = path.strip_prefix(root).map_err(|_| {
        ApiError::Internal(format!("entry {} is outside the workspace", path.display()))
    })?;
    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
