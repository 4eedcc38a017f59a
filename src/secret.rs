//! Secret resolution through literal values or environment indirection.

use crate::error::{DescriptorError, Result};
use crate::model::descriptor::{Descriptor, Secret, SecretSource};

/// Name → value lookup used for environment-sourced secrets.
pub trait EnvLookup {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

impl Descriptor {
    /// Resolve a secret against the process environment.
    pub fn secret(&self, name: &str) -> Result<String> {
        self.secret_with(name, &ProcessEnv)
    }

    /// Resolve a secret. An unset environment variable resolves to an empty string.
    pub fn secret_with(&self, name: &str, env: &dyn EnvLookup) -> Result<String> {
        let secret = self
            .spec
            .secrets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| DescriptorError::SecretNotFound(name.to_string()))?;

        match &secret.secret_source {
            Some(SecretSource::LiteralSource { value }) => Ok(value.clone()),
            Some(SecretSource::EnvSource { name: var }) => Ok(env.var(var).unwrap_or_default()),
            None => Err(DescriptorError::SecretWithoutSource(name.to_string())),
        }
    }

    /// Insert a secret, or replace the one with the same name in place.
    pub fn set_secret(&mut self, secret: Secret) -> Result<()> {
        if secret.name.is_empty() {
            return Err(DescriptorError::InvalidArgument(
                "secret name must not be empty".to_string(),
            ));
        }

        match self.spec.secrets.iter_mut().find(|s| s.name == secret.name) {
            Some(existing) => *existing = secret,
            None => self.spec.secrets.push(secret),
        }
        Ok(())
    }
}
