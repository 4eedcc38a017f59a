//! Local cache of the repositories a descriptor declares.
//!
//! Layout: `<appDir>/.cache/<repo name>/...`, with the status pointing at
//! `<appDir>/.cache/<repo name>/<repo root>`.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{DescriptorError, Result};
use crate::fetch::ArtifactFetcher;
use crate::model::descriptor::{Descriptor, Repo, RepoCache};

/// Cache directory name inside an application directory.
pub const CACHE_DIR: &str = ".cache";

impl Descriptor {
    /// Fetch every declared repository into the cache and record where it landed.
    ///
    /// Every repository is evicted and fetched again on each call. The first
    /// failed fetch aborts the sync; entries recorded before it are kept.
    pub fn sync_cache(&mut self, fetcher: &dyn ArtifactFetcher) -> Result<()> {
        let app_dir = match self.spec.app_dir.as_deref() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => {
                return Err(DescriptorError::InvalidArgument(
                    "app dir must be specified to sync the repository cache".to_string(),
                ));
            }
        };

        validate_repos(&self.spec.repos)?;

        let base_cache_dir = app_dir.join(CACHE_DIR);
        if !base_cache_dir.exists() {
            tracing::info!("creating directory {}", base_cache_dir.display());
            fs::create_dir_all(&base_cache_dir).map_err(|e| {
                tracing::error!("couldn't create directory {}: {e}", base_cache_dir.display());
                DescriptorError::io(&base_cache_dir, e)
            })?;
        }

        for repo in &self.spec.repos {
            let cache_dir = base_cache_dir.join(&repo.name);
            evict(&cache_dir)?;

            tracing::info!("fetching {} to {}", repo.uri, cache_dir.display());
            fetcher
                .fetch_tree(&cache_dir, &repo.uri)
                .map_err(|e| DescriptorError::RepoFetch {
                    repo: repo.name.clone(),
                    uri: repo.uri.clone(),
                    source: e,
                })?;

            tracing::info!("fetch of {} succeeded", repo.name);
            self.status.repos_cache.insert(
                repo.name.clone(),
                RepoCache {
                    local_path: local_path(&cache_dir, repo),
                },
            );
        }

        Ok(())
    }
}

// Names and roots are joined onto the cache dir and evicted recursively, so
// neither may leave it. Names must also be unique and a single component.
fn validate_repos(repos: &[Repo]) -> Result<()> {
    let mut seen = HashSet::new();

    for repo in repos {
        let mut components = Path::new(&repo.name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(c)), None) if c == repo.name.as_str()
        );
        if !single_normal {
            return Err(DescriptorError::InvalidArgument(format!(
                "repo name {:?} must be a single non-empty path component",
                repo.name
            )));
        }

        if !seen.insert(repo.name.as_str()) {
            return Err(DescriptorError::InvalidArgument(format!(
                "repo name {} is declared more than once",
                repo.name
            )));
        }

        if let Some(root) = repo.root.as_deref() {
            let escapes = Path::new(root).components().any(|c| {
                matches!(
                    c,
                    Component::RootDir | Component::Prefix(_) | Component::ParentDir
                )
            });
            if escapes {
                return Err(DescriptorError::InvalidArgument(format!(
                    "root {root:?} of repo {} must be a relative path inside the repo",
                    repo.name
                )));
            }
        }
    }

    Ok(())
}

// A previous fetch may have died halfway; nothing left behind is trusted.
fn evict(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        return Ok(());
    }

    tracing::info!("removing {}", cache_dir.display());
    let removed = if cache_dir.is_dir() {
        fs::remove_dir_all(cache_dir)
    } else {
        fs::remove_file(cache_dir)
    };
    removed.map_err(|e| DescriptorError::io(cache_dir, e))
}

fn local_path(cache_dir: &Path, repo: &Repo) -> PathBuf {
    match repo.root.as_deref() {
        Some(root) if !root.is_empty() => cache_dir.join(root),
        _ => cache_dir.to_path_buf(),
    }
}
