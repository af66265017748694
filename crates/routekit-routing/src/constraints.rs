//! Declarative URI constraints
//!
//! Route parts that resolve to another scheme, host or port (a language
//! subdomain, a country TLD, ...) express this as constraints; the resolved
//! path and query string travel as constraints too. Applying the
//! constraints rewrites a generated URI relative to the current request URI
//! and promotes it to an absolute URI whenever it leaves the current origin.
//!
//! # Example
//! ```
//! use routekit_routing::{Uri, UriConstraintSet};
//!
//! let request = Uri::parse("http://www.example.com/foo").unwrap();
//! let constraints = UriConstraintSet::new()
//!     .with_scheme("https")
//!     .with_sub_domain("de")
//!     .with_port(8080);
//! let uri = constraints.apply(&Uri::parse("/bar").unwrap(), &request);
//! assert_eq!(uri.to_string(), "https://de.example.com:8080/bar");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use routekit_core::{LookupError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::query::{self, QueryMap};
use crate::uri::Uri;

/// First label of a host with at least three labels
static SUB_DOMAIN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^.]+)(?:\.[^.]+){2,}$").unwrap());

/// Everything after the final dot of a host
static TOP_LEVEL_DOMAIN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([^.]*)$").unwrap());

/// Literal keys of the supported constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKey {
    Scheme,
    Host,
    SubDomain,
    TopLevelDomain,
    Port,
    Path,
    QueryString,
}

impl ConstraintKey {
    pub const ALL: [ConstraintKey; 7] = [
        ConstraintKey::Scheme,
        ConstraintKey::Host,
        ConstraintKey::SubDomain,
        ConstraintKey::TopLevelDomain,
        ConstraintKey::Port,
        ConstraintKey::Path,
        ConstraintKey::QueryString,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKey::Scheme => "scheme",
            ConstraintKey::Host => "host",
            ConstraintKey::SubDomain => "subDomain",
            ConstraintKey::TopLevelDomain => "topLevelDomain",
            ConstraintKey::Port => "port",
            ConstraintKey::Path => "path",
            ConstraintKey::QueryString => "queryString",
        }
    }
}

impl fmt::Display for ConstraintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstraintKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConstraintKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownConstraintKey(s.to_string()))
    }
}

/// Set of URI constraints; an absent constraint leaves the component alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UriConstraintSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    top_level_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    query_string: Option<String>,
}

impl UriConstraintSet {
    /// Create an empty constraint set
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheme to enforce, compared case-insensitively
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into().to_ascii_lowercase());
        self
    }

    /// Host to enforce, compared case-insensitively
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into().to_ascii_lowercase());
        self
    }

    pub fn with_sub_domain(mut self, sub_domain: impl Into<String>) -> Self {
        self.sub_domain = Some(sub_domain.into());
        self
    }

    pub fn with_top_level_domain(mut self, top_level_domain: impl Into<String>) -> Self {
        self.top_level_domain = Some(top_level_domain.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Path replacing the one of the candidate URI
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Raw (encoded) query string replacing the one of the candidate URI
    pub fn with_query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = Some(query_string.into());
        self
    }

    /// Merge `values` into the query string constraint
    ///
    /// Existing values are kept unless overridden; nested maps are merged
    /// recursively.
    pub fn with_added_query_values(mut self, values: &QueryMap) -> Self {
        let existing = self
            .query_string
            .as_deref()
            .map(query::parse_query)
            .unwrap_or_default();
        self.query_string = Some(query::build_query(&query::merge_recursive(existing, values)));
        self
    }

    /// Combine two sets; constraints of `other` replace ours key by key
    pub fn merge(self, other: &UriConstraintSet) -> Self {
        Self {
            scheme: other.scheme.clone().or(self.scheme),
            host: other.host.clone().or(self.host),
            sub_domain: other.sub_domain.clone().or(self.sub_domain),
            top_level_domain: other.top_level_domain.clone().or(self.top_level_domain),
            port: other.port.or(self.port),
            path: other.path.clone().or(self.path),
            query_string: other.query_string.clone().or(self.query_string),
        }
    }

    /// Value of a constraint rendered as string
    pub fn get(&self, key: ConstraintKey) -> Option<String> {
        match key {
            ConstraintKey::Scheme => self.scheme.clone(),
            ConstraintKey::Host => self.host.clone(),
            ConstraintKey::SubDomain => self.sub_domain.clone(),
            ConstraintKey::TopLevelDomain => self.top_level_domain.clone(),
            ConstraintKey::Port => self.port.map(|p| p.to_string()),
            ConstraintKey::Path => self.path.clone(),
            ConstraintKey::QueryString => self.query_string.clone(),
        }
    }

    pub fn require(&self, key: ConstraintKey) -> Result<String, LookupError> {
        self.get(key)
            .ok_or_else(|| LookupError::MissingConstraint(key.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        ConstraintKey::ALL.iter().all(|key| self.get(*key).is_none())
    }

    /// Apply the constraints to `candidate` relative to `request`
    pub fn apply(&self, candidate: &Uri, request: &Uri) -> Uri {
        self.apply_with(candidate, request, false)
    }

    /// Like [`apply`](Self::apply), optionally forcing an absolute result
    ///
    /// Every constraint that differs from the request URI rewrites its
    /// component and forces the result to be absolute; missing scheme, host
    /// and port are then filled in from the request URI.
    pub fn apply_with(&self, candidate: &Uri, request: &Uri, force_absolute: bool) -> Uri {
        let mut uri = candidate.clone();
        let mut force_absolute = force_absolute;

        if let Some(scheme) = &self.scheme {
            if !scheme.eq_ignore_ascii_case(request.scheme()) {
                tracing::debug!(from = request.scheme(), to = %scheme, "Scheme constraint rewrites URI");
                uri = uri.with_scheme(scheme.to_ascii_lowercase());
                force_absolute = true;
            }
        }

        if let Some(host) = &self.host {
            if !host.eq_ignore_ascii_case(request.host()) {
                tracing::debug!(from = request.host(), to = %host, "Host constraint rewrites URI");
                uri = uri.with_host(host.to_ascii_lowercase());
                force_absolute = true;
            }
        }

        if let Some(sub_domain) = &self.sub_domain {
            let current = current_sub_domain(request.host());
            if sub_domain != current {
                let host = working_host(&uri, request);
                let rewritten = replace_sub_domain(&host, sub_domain);
                tracing::debug!(from = %host, to = %rewritten, "Sub domain constraint rewrites host");
                uri = uri.with_host(rewritten);
                force_absolute = true;
            }
        }

        if let Some(top_level_domain) = &self.top_level_domain {
            let current = current_top_level_domain(request.host());
            if top_level_domain != current {
                let host = working_host(&uri, request);
                let rewritten = replace_top_level_domain(&host, top_level_domain);
                tracing::debug!(from = %host, to = %rewritten, "Top level domain constraint rewrites host");
                uri = uri.with_host(rewritten);
                force_absolute = true;
            }
        }

        if let Some(port) = self.port {
            if Some(port) != request.port() {
                tracing::debug!(from = ?request.port(), to = port, "Port constraint rewrites URI");
                uri = uri.with_port(Some(port));
                force_absolute = true;
            }
        }

        if let Some(path) = &self.path {
            uri = uri.with_path(path.as_str());
        }

        if let Some(query_string) = &self.query_string {
            uri = uri.with_query(query_string.as_str());
        }

        if force_absolute {
            if uri.scheme().is_empty() {
                uri = uri.with_scheme(request.scheme());
            }
            if uri.host().is_empty() {
                uri = uri.with_host(request.host());
            }
            if uri.port().is_none() && request.port().is_some() {
                uri = uri.with_port(request.port());
            }
            tracing::debug!(uri = %uri, "Promoted URI to absolute");
        }

        uri
    }
}

/// Host to rewrite: the already constrained host, else the request host
fn working_host(uri: &Uri, request: &Uri) -> String {
    if uri.host().is_empty() {
        request.host().to_string()
    } else {
        uri.host().to_string()
    }
}

fn current_sub_domain(host: &str) -> &str {
    SUB_DOMAIN_REGEX
        .captures(host)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default()
}

fn current_top_level_domain(host: &str) -> &str {
    TOP_LEVEL_DOMAIN_REGEX
        .captures(host)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default()
}

/// Replace the first label of a host with three or more labels, prepend
/// otherwise; an empty sub domain removes the first label
fn replace_sub_domain(host: &str, sub_domain: &str) -> String {
    let remainder = match current_sub_domain(host) {
        "" => host,
        current => &host[current.len() + 1..],
    };
    if sub_domain.is_empty() {
        remainder.to_string()
    } else {
        format!("{}.{}", sub_domain, remainder)
    }
}

/// Replace the label after the final dot, append one if the host has no dot
fn replace_top_level_domain(host: &str, top_level_domain: &str) -> String {
    match host.rfind('.') {
        Some(index) => format!("{}.{}", &host[..index], top_level_domain),
        None => format!("{}.{}", host, top_level_domain),
    }
}
