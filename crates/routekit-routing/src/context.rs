//! Routing context: the inbound request plus routing parameters
//!
//! The context exposes a single cache key covering everything that can
//! influence a route match: host, path, method and parameters.

use routekit_core::{CacheableValue, ParameterStore, fingerprint};
use std::sync::Arc;

use crate::request::RouteRequest;

#[derive(Debug, Clone)]
pub struct RoutingContext {
    request: Arc<dyn RouteRequest>,
    parameters: ParameterStore,
    fingerprint: String,
}

impl RoutingContext {
    /// Create a context and compute its cache fingerprint
    pub fn new(request: Arc<dyn RouteRequest>, parameters: ParameterStore) -> Self {
        let fingerprint = compute_fingerprint(request.as_ref(), &parameters);
        Self {
            request,
            parameters,
            fingerprint,
        }
    }

    /// Convenience constructor taking ownership of a concrete request
    pub fn from_request(request: impl RouteRequest + 'static, parameters: ParameterStore) -> Self {
        Self::new(Arc::new(request), parameters)
    }

    pub fn request(&self) -> &dyn RouteRequest {
        self.request.as_ref()
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    /// Cache key of this context, frozen at construction
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Return a context with a namespaced parameter added
    ///
    /// The fingerprint is NOT recomputed: it stays the one computed when the
    /// context was created. Call [`RoutingContext::refingerprinted`] (or build
    /// a new context) when the added parameter must be part of the cache key.
    pub fn with_parameter(
        &self,
        namespace: &str,
        name: impl Into<String>,
        value: impl Into<CacheableValue>,
    ) -> Self {
        Self {
            request: Arc::clone(&self.request),
            parameters: self
                .parameters
                .with_namespaced_parameter(namespace, name, value),
            fingerprint: self.fingerprint.clone(),
        }
    }

    /// Rebuild the context so the fingerprint reflects the current parameters
    pub fn refingerprinted(self) -> Self {
        Self::new(self.request, self.parameters)
    }
}

fn compute_fingerprint(request: &dyn RouteRequest, parameters: &ParameterStore) -> String {
    let key = format!(
        "host:{}|path:{}|method:{}|parameters:{}",
        request.host(),
        request.path(),
        request.method(),
        parameters.fingerprint()
    );
    let fp = fingerprint::digest(&key);
    tracing::trace!(
        host = request.host(),
        path = request.path(),
        method = request.method(),
        fingerprint = %fp,
        "Computed routing context fingerprint"
    );
    fp
}
