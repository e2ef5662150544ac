//! Access-level derivation from request auth attributes.
//!
//! Authentication itself is out of scope: an outer layer (bearer/basic/JWT
//! middleware) authenticates the request and installs an [`AuthAttributes`]
//! map into the request extensions. The transport only reads one attribute
//! out of that map, named by [`AccessConfig::attribute_key`], and treats the
//! value `1` as elevated access ("admin mode"), which bypasses owner
//! checks. Anything else, including a missing map or key, is normal access.

use std::collections::HashMap;

use serde_json::Value;

/// Default name of the attribute carrying the access level.
pub const DEFAULT_ACCESS_ATTRIBUTE_KEY: &str = "access-level";

/// The attribute value that grants elevated access.
pub const ELEVATED_ACCESS_LEVEL: i64 = 1;

/// Attributes extracted from the request's auth token.
///
/// Installed into request extensions by the authentication layer; the key
/// space and values are owned by that layer.
///
/// # Examples
///
/// ```
/// use argus::auth::{AuthAttributes, ELEVATED_ACCESS_LEVEL};
///
/// let mut attrs = AuthAttributes::default();
/// attrs.insert("access-level", ELEVATED_ACCESS_LEVEL.into());
/// assert_eq!(attrs.get("access-level").and_then(|v| v.as_i64()), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuthAttributes {
    values: HashMap<String, Value>,
}

impl AuthAttributes {
    /// Creates an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Looks up an attribute by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

impl FromIterator<(String, Value)> for AuthAttributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Names the auth attribute the transport derives admin mode from.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Attribute holding the numeric access level.
    pub attribute_key: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            attribute_key: DEFAULT_ACCESS_ATTRIBUTE_KEY.to_string(),
        }
    }
}

impl AccessConfig {
    /// Overrides the attribute key.
    pub fn with_attribute_key(mut self, key: impl Into<String>) -> Self {
        self.attribute_key = key.into();
        self
    }
}

/// Whether the given attributes grant elevated access under `config`.
pub fn admin_mode(attrs: Option<&AuthAttributes>, config: &AccessConfig) -> bool {
    attrs
        .and_then(|attrs| attrs.get(&config.attribute_key))
        .and_then(Value::as_i64)
        == Some(ELEVATED_ACCESS_LEVEL)
}
