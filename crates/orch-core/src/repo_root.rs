use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::paths::VCS_MARKER;

#[derive(Debug, Error)]
pub enum RepoRootError {
    #[error("no git repository found from: {}", start.display())]
    NotFound { start: PathBuf },
}

/// Find the nearest ancestor of `start` (inclusive) that contains a `.git`
/// entry. A `.git` file counts too, so worktrees and submodules resolve.
///
/// No caching; each call walks the filesystem again.
pub fn find_repo_root(start: &Path) -> Result<PathBuf, RepoRootError> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(VCS_MARKER).exists() {
            return Ok(dir);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => {
                return Err(RepoRootError::NotFound {
                    start: start.to_path_buf(),
                })
            }
        }
    }
}
