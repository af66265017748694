//! Results of matching and resolving route parts

use routekit_core::{CacheMetadata, CacheableValue, Lifetime, LookupError, OrderedMap, TagSet};
use serde::Serialize;

use crate::constraints::UriConstraintSet;
use crate::uri::Uri;

/// Result of one route part matching a piece of the request path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    value: CacheableValue,
    #[serde(flatten)]
    metadata: CacheMetadata,
}

impl MatchOutcome {
    pub fn new(value: impl Into<CacheableValue>) -> Self {
        Self {
            value: value.into(),
            metadata: CacheMetadata::default(),
        }
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.metadata.tags = Some(tags);
        self
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.metadata.lifetime = Some(lifetime);
        self
    }

    pub fn value(&self) -> &CacheableValue {
        &self.value
    }

    pub fn tags(&self) -> Option<&TagSet> {
        self.metadata.tags.as_ref()
    }

    pub fn lifetime(&self) -> Option<Lifetime> {
        self.metadata.lifetime
    }

    pub fn metadata(&self) -> &CacheMetadata {
        &self.metadata
    }

    /// Merge the cache metadata of every part of a route match
    pub fn aggregate<'a>(outcomes: impl IntoIterator<Item = &'a MatchOutcome>) -> CacheMetadata {
        CacheMetadata::collect(outcomes.into_iter().map(MatchOutcome::metadata))
    }
}

/// Result of resolving route values into a URI
///
/// Resolving stages contribute output parameters, each into its own
/// namespace so stages cannot clobber each other. A stage may also demand
/// URI constraints (another host, a query string, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveOutcome {
    uri: Uri,
    namespaced_parameters: OrderedMap<OrderedMap<CacheableValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri_constraints: Option<UriConstraintSet>,
    #[serde(flatten)]
    metadata: CacheMetadata,
}

impl ResolveOutcome {
    pub fn new(uri: Uri) -> Self {
        Self {
            uri,
            namespaced_parameters: OrderedMap::new(),
            uri_constraints: None,
            metadata: CacheMetadata::default(),
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn with_uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    pub fn with_parameter(
        mut self,
        namespace: &str,
        name: impl Into<String>,
        value: impl Into<CacheableValue>,
    ) -> Self {
        match self.namespaced_parameters.get_mut(namespace) {
            Some(scope) => {
                scope.insert(name, value.into());
            }
            None => {
                let mut scope = OrderedMap::new();
                scope.insert(name, value.into());
                self.namespaced_parameters.insert(namespace, scope);
            }
        }
        self
    }

    pub fn with_uri_constraints(mut self, uri_constraints: UriConstraintSet) -> Self {
        self.uri_constraints = Some(uri_constraints);
        self
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.metadata.tags = Some(tags);
        self
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.metadata.lifetime = Some(lifetime);
        self
    }

    pub fn uri_constraints(&self) -> Option<&UriConstraintSet> {
        self.uri_constraints.as_ref()
    }

    /// Fold the outcomes of every part of a resolved route
    ///
    /// Cache metadata merges like [`MatchOutcome::aggregate`]; URI
    /// constraints merge key by key, later parts winning.
    pub fn aggregate<'a>(
        outcomes: impl IntoIterator<Item = &'a ResolveOutcome>,
    ) -> (CacheMetadata, UriConstraintSet) {
        outcomes.into_iter().fold(
            (CacheMetadata::default(), UriConstraintSet::new()),
            |(metadata, constraints), outcome| {
                let constraints = match &outcome.uri_constraints {
                    Some(own) => constraints.merge(own),
                    None => constraints,
                };
                (metadata.merge(&outcome.metadata), constraints)
            },
        )
    }

    pub fn parameter(&self, namespace: &str, name: &str) -> Option<&CacheableValue> {
        self.namespaced_parameters
            .get(namespace)
            .and_then(|scope| scope.get(name))
    }

    pub fn namespace(&self, namespace: &str) -> Option<&OrderedMap<CacheableValue>> {
        self.namespaced_parameters.get(namespace)
    }

    pub fn require_parameter(&self, namespace: &str, name: &str) -> Result<&CacheableValue, LookupError> {
        let scope = self
            .namespace(namespace)
            .ok_or_else(|| LookupError::MissingNamespace(namespace.to_string()))?;
        scope
            .get(name)
            .ok_or_else(|| LookupError::MissingNamespacedParameter {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaced_parameters.keys()
    }

    pub fn tags(&self) -> Option<&TagSet> {
        self.metadata.tags.as_ref()
    }

    pub fn lifetime(&self) -> Option<Lifetime> {
        self.metadata.lifetime
    }

    pub fn metadata(&self) -> &CacheMetadata {
        &self.metadata
    }
}
