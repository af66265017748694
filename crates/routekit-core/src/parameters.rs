//! Immutable parameter bag with fingerprint derivation
//!
//! Parameters carry request-scoped facts (current site, dimension values,
//! ...) that influence routing. Because routing results are cached, every
//! parameter contributes to the cache key of the result it affected.

use serde::Serialize;

use crate::error::LookupError;
use crate::fingerprint;
use crate::map::OrderedMap;
use crate::value::CacheableValue;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterStore {
    parameters: OrderedMap<CacheableValue>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a store with `name` set to `value`
    ///
    /// Overwriting an existing parameter keeps its position.
    pub fn with_parameter(&self, name: impl Into<String>, value: impl Into<CacheableValue>) -> Self {
        let mut parameters = self.parameters.clone();
        parameters.insert(name, value.into());
        Self { parameters }
    }

    /// Return a store with `name` set inside the nested `namespace` map
    ///
    /// A non-nested value stored under `namespace` is replaced by a fresh map.
    pub fn with_namespaced_parameter(
        &self,
        namespace: &str,
        name: impl Into<String>,
        value: impl Into<CacheableValue>,
    ) -> Self {
        let mut scope = self
            .parameters
            .get(namespace)
            .and_then(CacheableValue::as_nested)
            .cloned()
            .unwrap_or_default();
        scope.insert(name, value.into());
        self.with_parameter(namespace, CacheableValue::Nested(scope))
    }

    pub fn get(&self, name: &str) -> Option<&CacheableValue> {
        self.parameters.get(name)
    }

    pub fn get_namespaced(&self, namespace: &str, name: &str) -> Option<&CacheableValue> {
        self.parameters
            .get(namespace)
            .and_then(CacheableValue::as_nested)
            .and_then(|scope| scope.get(name))
    }

    /// Like `get`, for callers that require the parameter to be present
    pub fn require(&self, name: &str) -> Result<&CacheableValue, LookupError> {
        self.get(name)
            .ok_or_else(|| LookupError::MissingParameter(name.to_string()))
    }

    pub fn require_namespaced(&self, namespace: &str, name: &str) -> Result<&CacheableValue, LookupError> {
        let scope = self
            .parameters
            .get(namespace)
            .and_then(CacheableValue::as_nested)
            .ok_or_else(|| LookupError::MissingNamespace(namespace.to_string()))?;
        scope
            .get(name)
            .ok_or_else(|| LookupError::MissingNamespacedParameter {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    pub fn has(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheableValue)> {
        self.parameters.iter()
    }

    /// Per-value fingerprint of one stored parameter
    pub fn value_fingerprint(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| value.fingerprint_as(name))
    }

    /// Fingerprint of the whole bag
    ///
    /// Digest of `name:value` entries joined by `|` in insertion order, where
    /// `value` is the external fingerprint, the scalar rendering, or the
    /// per-value fingerprint of a nested map.
    pub fn fingerprint(&self) -> String {
        let entries: Vec<String> = self
            .parameters
            .iter()
            .map(|(name, value)| {
                let rendered = match value {
                    CacheableValue::Nested(_) => value.fingerprint_as(name),
                    CacheableValue::External(external) => external.fingerprint(),
                    scalar => scalar.literal().unwrap_or_default(),
                };
                format!("{}:{}", name, rendered)
            })
            .collect();
        let fp = fingerprint::digest(&entries.join("|"));
        tracing::trace!(parameters = self.parameters.len(), fingerprint = %fp, "Computed parameter fingerprint");
        fp
    }
}

impl<K: Into<String>, V: Into<CacheableValue>> FromIterator<(K, V)> for ParameterStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            parameters: iter.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}
