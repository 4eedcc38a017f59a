//! Loading descriptors into an application directory and writing them back.

use std::fs;
use std::path::Path;

use crate::error::{DescriptorError, Result};
use crate::fetch::ArtifactFetcher;
use crate::model::descriptor::Descriptor;

/// Name of the descriptor file inside an application directory.
pub const DESCRIPTOR_FILE: &str = "app.toml";

impl Descriptor {
    /// Fetch `source` into `app_dir/app.toml` (once) and parse it.
    ///
    /// An existing `app.toml` is reused without refetching, so repeated loads
    /// against the same directory never pick up upstream changes.
    pub fn load(
        source: &str,
        app_dir: impl AsRef<Path>,
        fetcher: &dyn ArtifactFetcher,
    ) -> Result<Self> {
        let app_dir = app_dir.as_ref();

        if source.is_empty() {
            return Err(DescriptorError::InvalidArgument(
                "source must be the URI of an application descriptor".to_string(),
            ));
        }
        if app_dir.as_os_str().is_empty() {
            return Err(DescriptorError::InvalidArgument(
                "app dir must be the directory where the app should be stored".to_string(),
            ));
        }

        if app_dir.exists() {
            tracing::info!("app directory exists {}", app_dir.display());
        } else {
            tracing::info!("creating directory {}", app_dir.display());
            fs::create_dir_all(app_dir).map_err(|e| {
                tracing::error!("couldn't create directory {}: {e}", app_dir.display());
                DescriptorError::io(app_dir, e)
            })?;
        }

        let app_file = app_dir.join(DESCRIPTOR_FILE);
        if app_file.exists() {
            tracing::info!("{} exists, not refetching", app_file.display());
        } else {
            tracing::info!("downloading {source} to {}", app_file.display());
            fetcher
                .fetch_file(&app_file, source)
                .map_err(|e| DescriptorError::Fetch {
                    uri: source.to_string(),
                    source: e,
                })?;
        }

        let raw = fs::read_to_string(&app_file).map_err(|e| DescriptorError::io(&app_file, e))?;
        let mut descriptor: Descriptor =
            toml::from_str(&raw).map_err(|e| DescriptorError::Parse {
                path: app_file.clone(),
                source: e,
            })?;

        descriptor.spec.app_dir = Some(app_dir.to_path_buf());
        Ok(descriptor)
    }

    /// Copy of this descriptor with every literal secret removed.
    pub fn persistable(&self) -> Descriptor {
        let mut stripped = self.clone();
        stripped.spec.secrets.retain(|secret| {
            if secret.is_literal() {
                tracing::warn!(
                    "stripping literal secret {} before serializing descriptor",
                    secret.name
                );
                return false;
            }
            true
        });
        stripped
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the descriptor to `path` without any literal secret.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let buf = self.persistable().to_toml_string().inspect_err(|e| {
            tracing::error!("error serializing descriptor: {e}");
        })?;

        tracing::info!("writing stripped descriptor to {}", path.display());
        fs::write(path, buf).map_err(|e| DescriptorError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fetch::LocalFetcher;
    use crate::model::descriptor::Secret;
    use tempfile::TempDir;

    fn write_source(dir: &Path, body: &str) -> String {
        let path = dir.join("source.toml");
        fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_load_rejects_empty_arguments() {
        let temp = TempDir::new().unwrap();

        let err = Descriptor::load("", temp.path(), &LocalFetcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = Descriptor::load("app.toml", "", &LocalFetcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_load_creates_app_dir_and_sets_app_dir() {
        let temp = TempDir::new().unwrap();
        let source = write_source(
            temp.path(),
            "[spec]\nappDir = \"/somewhere/else\"\nversion = \"v1\"\n",
        );
        let app_dir = temp.path().join("apps/demo");

        let d = Descriptor::load(&source, &app_dir, &LocalFetcher).unwrap();

        assert!(app_dir.join(DESCRIPTOR_FILE).is_file());
        assert_eq!(d.spec.app_dir.as_deref(), Some(app_dir.as_path()));
        assert_eq!(d.spec.version.as_deref(), Some("v1"));
    }

    #[test]
    fn test_load_reuses_existing_copy() {
        let temp = TempDir::new().unwrap();
        let source = write_source(temp.path(), "[spec]\nversion = \"v1\"\n");
        let app_dir = temp.path().join("app");

        Descriptor::load(&source, &app_dir, &LocalFetcher).unwrap();
        fs::write(temp.path().join("source.toml"), "[spec]\nversion = \"v2\"\n").unwrap();

        let d = Descriptor::load(&source, &app_dir, &LocalFetcher).unwrap();
        assert_eq!(d.spec.version.as_deref(), Some("v1"));
    }

    #[test]
    fn test_load_unreachable_source() {
        let temp = TempDir::new().unwrap();
        let err = Descriptor::load("/no/such/source.toml", temp.path(), &LocalFetcher).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unreachable);
    }

    #[test]
    fn test_load_malformed_document() {
        let temp = TempDir::new().unwrap();
        let source = write_source(temp.path(), "[spec\nversion = ");
        let err = Descriptor::load(&source, temp.path().join("app"), &LocalFetcher).unwrap_err();
        assert!(matches!(err, DescriptorError::Parse { .. }));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_write_strips_literal_secrets_only() {
        let temp = TempDir::new().unwrap();
        let mut d = Descriptor::default();
        d.spec.secrets.push(Secret::literal("token", "hunter2"));
        d.spec.secrets.push(Secret::env("password", "APP_PASSWORD"));

        let out = temp.path().join("app.toml");
        d.write_to_file(&out).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert!(!written.contains("hunter2"));
        assert!(!written.contains("token"));
        assert!(written.contains("APP_PASSWORD"));

        assert_eq!(d.spec.secrets.len(), 2);
        assert!(d.spec.secrets[0].is_literal());
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let err = Descriptor::default()
            .write_to_file(temp.path().join("missing/app.toml"))
            .unwrap_err();
        assert!(matches!(err, DescriptorError::Write { .. }));
    }
}
