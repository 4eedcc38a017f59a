use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root application descriptor, stored on disk as `app.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: DescriptorSpec,
    #[serde(default, skip_serializing_if = "DescriptorStatus::is_empty")]
    pub status: DescriptorStatus,
}

/// Object metadata. Only the name is interpreted; everything else is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// Desired state, authored by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSpec {
    /// Local working directory. Overwritten on every load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repos: Vec<Repo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<Secret>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<Plugin>,
    /// Deployment parameters this crate does not interpret.
    #[serde(flatten)]
    pub parameters: toml::Table,
}

/// A remote repository providing component configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    /// Any URI the configured fetcher understands.
    #[serde(default)]
    pub uri: String,
    /// Path inside the fetched tree to use as the repository root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl Repo {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            root: None,
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_source: Option<SecretSource>,
}

impl Secret {
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret_source: Some(SecretSource::LiteralSource {
                value: value.into(),
            }),
        }
    }

    pub fn env(name: impl Into<String>, var: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret_source: Some(SecretSource::EnvSource { name: var.into() }),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.secret_source, Some(SecretSource::LiteralSource { .. }))
    }
}

/// Where a secret's value comes from. Exactly one variant per secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecretSource {
    /// Inline value. Never written back to disk.
    LiteralSource { value: String },
    /// Name of an environment variable holding the value.
    EnvSource { name: String },
}

/// Provider-specific extension. `spec` has no fixed schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    #[serde(
        rename = "pluginParameters",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub parameters: Vec<PluginParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<toml::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    pub name: String,
}

/// Observed state, written by this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repos_cache: BTreeMap<String, RepoCache>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoCache {
    pub local_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl DescriptorStatus {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.repos_cache.is_empty()
    }

    pub fn condition(&self, kind: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.kind == kind)
    }

    /// Upsert a condition by type. The transition time only moves when the status changes.
    pub fn set_condition(
        &mut self,
        kind: &str,
        status: ConditionStatus,
        reason: Option<&str>,
        message: Option<&str>,
    ) {
        let now = Utc::now();
        let reason = reason.map(str::to_string);
        let message = message.map(str::to_string);

        if let Some(existing) = self.conditions.iter_mut().find(|c| c.kind == kind) {
            if existing.status != status {
                existing.last_transition_time = Some(now);
            }
            existing.status = status;
            existing.reason = reason;
            existing.message = message;
            existing.last_update_time = Some(now);
            return;
        }

        self.conditions.push(Condition {
            kind: kind.to_string(),
            status,
            reason,
            message,
            last_update_time: Some(now),
            last_transition_time: Some(now),
        });
    }
}
