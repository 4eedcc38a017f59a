//! Declarative application descriptors.
//!
//! A descriptor (`app.toml`) declares the repositories an application is
//! assembled from, the secrets it needs and provider-specific plugin
//! payloads. This crate loads and saves descriptors, resolves secrets,
//! gives typed access to plugin payloads and keeps a local cache of the
//! declared repositories.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod model;
pub mod plugin;
pub mod secret;
pub mod store;

pub use cache::CACHE_DIR;
pub use error::{DescriptorError, ErrorKind, Result};
pub use fetch::{ArtifactFetcher, FetchError, LocalFetcher};
pub use model::descriptor::{
    Condition, ConditionStatus, Descriptor, DescriptorSpec, DescriptorStatus, Metadata, Plugin,
    PluginParameter, Repo, RepoCache, Secret, SecretRef, SecretSource,
};
pub use plugin::TypedPlugin;
pub use secret::{EnvLookup, ProcessEnv};
pub use store::DESCRIPTOR_FILE;
