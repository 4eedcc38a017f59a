use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use ignore::WalkBuilder;

use super::{ArtifactFetcher, FetchError};

/// Fetches from the local filesystem: plain paths and `file://` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

impl LocalFetcher {
    pub fn new() -> Self {
        Self
    }

    fn resolve(uri: &str) -> Result<PathBuf, FetchError> {
        if let Some(rest) = uri.strip_prefix("file://") {
            return Ok(PathBuf::from(rest));
        }

        if let Some((scheme, _)) = uri.split_once("://") {
            return Err(FetchError::UnsupportedScheme(scheme.to_string()));
        }

        Ok(PathBuf::from(uri))
    }
}

impl ArtifactFetcher for LocalFetcher {
    fn fetch_file(&self, dest: &Path, uri: &str) -> Result<(), FetchError> {
        let src = Self::resolve(uri)?;
        if !src.is_file() {
            return Err(FetchError::NotFound(src));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
        }

        fs::copy(&src, dest).map_err(|e| FetchError::io(&src, e))?;
        Ok(())
    }

    fn fetch_tree(&self, dest: &Path, uri: &str) -> Result<(), FetchError> {
        let src = Self::resolve(uri)?;

        if src.is_dir() {
            return copy_tree(&src, dest);
        }

        if !src.is_file() {
            return Err(FetchError::NotFound(src));
        }

        if is_tarball(&src) {
            return unpack_tarball(&src, dest);
        }

        let Some(file_name) = src.file_name() else {
            return Err(FetchError::NotFound(src));
        };
        fs::create_dir_all(dest).map_err(|e| FetchError::io(dest, e))?;
        fs::copy(&src, dest.join(file_name)).map_err(|e| FetchError::io(&src, e))?;
        Ok(())
    }
}

fn is_tarball(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

fn unpack_tarball(archive_path: &Path, dest: &Path) -> Result<(), FetchError> {
    let file = File::open(archive_path).map_err(|e| FetchError::io(archive_path, e))?;
    fs::create_dir_all(dest).map_err(|e| FetchError::io(dest, e))?;

    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.unpack(dest).map_err(|e| FetchError::Extract {
        path: archive_path.to_path_buf(),
        source: e,
    })
}

// Copies everything, hidden files and ignored paths included. Symlinks are
// followed, so linked directories land as real copies.
fn copy_tree(src: &Path, dest: &Path) -> Result<(), FetchError> {
    fs::create_dir_all(dest).map_err(|e| FetchError::io(dest, e))?;

    let walker = WalkBuilder::new(src)
        .standard_filters(false)
        .follow_links(true)
        .build();
    for entry in walker {
        let entry = entry.map_err(|e| FetchError::Walk {
            path: src.to_path_buf(),
            source: e,
        })?;

        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(relative);
        if entry.file_type().is_some_and(|t| t.is_dir()) {
            fs::create_dir_all(&target).map_err(|e| FetchError::io(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
        }
        fs::copy(entry.path(), &target).map_err(|e| FetchError::io(entry.path(), e))?;
    }

    Ok(())
}
