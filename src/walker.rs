use crate::config::WalkOptions;
use crate::error::{Result, WebpifyError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Lazily enumerates candidate files below an input directory.
///
/// Every call to [`ImageWalker::walk`] starts a fresh traversal. Errors for
/// individual entries (permission denied, unreadable directories) are yielded
/// in the stream instead of ending it. Symlinks that point back at an
/// ancestor are dropped.
#[derive(Debug, Clone)]
pub struct ImageWalker {
    root: PathBuf,
    options: WalkOptions,
    excluded: Option<PathBuf>,
}

impl ImageWalker {
    pub fn new(root: &Path, options: WalkOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            options,
            excluded: None,
        }
    }

    /// Prunes `dir` (compared by canonical path) from the traversal.
    pub fn excluding(mut self, dir: &Path) -> Self {
        self.excluded = Some(dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf>> + Send {
        let mut walker = WalkDir::new(&self.root)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name();
        if !self.options.recursive {
            walker = walker.max_depth(1);
        }

        let include_hidden = self.options.include_hidden;
        let excluded = self.excluded.clone();
        // Real paths of every directory entered so far. Aliased or cyclic
        // symlinks resolve to an already seen path and get pruned.
        let mut visited: HashSet<PathBuf> = HashSet::new();

        walker
            .into_iter()
            .filter_entry(move |entry| {
                if entry.depth() > 0 && !include_hidden && is_hidden(entry) {
                    return false;
                }

                if entry.file_type().is_dir() {
                    let real = match entry.path().canonicalize() {
                        Ok(real) => real,
                        Err(_) => return true,
                    };
                    if excluded.as_deref() == Some(real.as_path()) {
                        debug!("Skipping output directory {}", entry.path().display());
                        return false;
                    }
                    if !visited.insert(real) {
                        debug!("Already visited {}, not descending again", entry.path().display());
                        return false;
                    }
                }

                true
            })
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
                Ok(_) => None,
                Err(e) if e.loop_ancestor().is_some() => {
                    debug!("Not following symlink loop: {}", e);
                    None
                }
                Err(e) => Some(Err(WebpifyError::from(e))),
            })
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
