use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};
use crate::model::descriptor::{Descriptor, DescriptorSpec, Plugin};
use crate::plugin::TypedPlugin;
use crate::secret::{EnvLookup, ProcessEnv};

// Payloads are projected through TOML text. A TOML document must be a table,
// so the payload is nested under a single `spec` key; that way scalar and
// array payloads survive the trip as well.
#[derive(Serialize)]
struct Outgoing<'a, T: ?Sized> {
    spec: &'a T,
}

#[derive(Deserialize)]
struct Incoming<T> {
    spec: T,
}

impl DescriptorSpec {
    pub fn plugin(&self, name: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.name == name)
    }

    /// Decode the payload of `name` into `T`.
    pub fn get_plugin_spec<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let plugin = self
            .plugin(name)
            .ok_or_else(|| DescriptorError::PluginNotFound(name.to_string()))?;

        let text = toml::to_string(&Outgoing { spec: &plugin.spec }).map_err(|e| {
            tracing::error!("could not marshal plugin {name} spec: {e}");
            DescriptorError::PluginEncode {
                plugin: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        let incoming: Incoming<T> = toml::from_str(&text).map_err(|e| {
            tracing::error!("could not unmarshal plugin {name} to the provided type: {e}");
            DescriptorError::PluginShape {
                plugin: name.to_string(),
                source: e,
            }
        })?;

        Ok(incoming.spec)
    }

    /// Store `spec` as the payload of `name`, adding the plugin if it is new.
    pub fn set_plugin<T: Serialize + ?Sized>(&mut self, name: &str, spec: &T) -> Result<()> {
        if name.is_empty() {
            return Err(DescriptorError::InvalidArgument(
                "plugin name must not be empty".to_string(),
            ));
        }

        let encode_err = |reason: String| {
            tracing::error!("could not encode spec for plugin {name}: {reason}");
            DescriptorError::PluginEncode {
                plugin: name.to_string(),
                reason,
            }
        };

        let text = toml::to_string(&Outgoing { spec }).map_err(|e| encode_err(e.to_string()))?;
        let incoming: Incoming<Option<toml::Value>> =
            toml::from_str(&text).map_err(|e| encode_err(e.to_string()))?;

        match self.plugins.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.spec = incoming.spec,
            None => {
                tracing::info!("adding plugin {name}");
                self.plugins.push(Plugin {
                    name: name.to_string(),
                    parameters: Vec::new(),
                    spec: incoming.spec,
                });
            }
        }

        Ok(())
    }
}

impl Descriptor {
    pub fn get_plugin_spec<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.spec.get_plugin_spec(name)
    }

    pub fn set_plugin<T: Serialize + ?Sized>(&mut self, name: &str, spec: &T) -> Result<()> {
        self.spec.set_plugin(name, spec)
    }

    pub fn typed_plugin<P: TypedPlugin>(&self) -> Result<P> {
        self.spec.get_plugin_spec(P::NAME)
    }

    pub fn set_typed_plugin<P: TypedPlugin>(&mut self, plugin: &P) -> Result<()> {
        self.spec.set_plugin(P::NAME, plugin)
    }

    pub fn plugin_parameter(&self, plugin: &str, parameter: &str) -> Result<String> {
        self.plugin_parameter_with(plugin, parameter, &ProcessEnv)
    }

    /// Resolve a plugin parameter, following a secret reference if it has one.
    pub fn plugin_parameter_with(
        &self,
        plugin: &str,
        parameter: &str,
        env: &dyn EnvLookup,
    ) -> Result<String> {
        let entry = self
            .spec
            .plugin(plugin)
            .ok_or_else(|| DescriptorError::PluginNotFound(plugin.to_string()))?;

        let param = entry
            .parameters
            .iter()
            .find(|p| p.name == parameter)
            .ok_or_else(|| DescriptorError::ParameterNotFound {
                plugin: plugin.to_string(),
                parameter: parameter.to_string(),
            })?;

        match &param.secret_ref {
            Some(secret_ref) => self.secret_with(&secret_ref.name, env),
            None => Ok(param.value.clone().unwrap_or_default()),
        }
    }
}
