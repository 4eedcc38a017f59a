pub mod registry;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A provider payload with a fixed plugin name.
///
/// The descriptor stores payloads untyped; implementing this lets a provider
/// read and write its own shape without repeating the name at every call site.
pub trait TypedPlugin: Serialize + DeserializeOwned {
    const NAME: &'static str;
}
