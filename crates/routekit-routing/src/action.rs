//! Controller action targets and their route values
//!
//! An [`ActionIdentity`] names the action a link should point to. Turning it
//! into route values is the input of URI resolution; turning matched route
//! values back into an identity is the output of request matching.

use routekit_core::{CacheableValue, LookupError, OrderedMap};
use serde::Serialize;

use crate::query::{self, QueryMap};
use crate::uri::Uri;

pub const ACTION_KEY: &str = "@action";
pub const CONTROLLER_KEY: &str = "@controller";
pub const PACKAGE_KEY: &str = "@package";
pub const SUBPACKAGE_KEY: &str = "@subpackage";
pub const FORMAT_KEY: &str = "@format";

/// Route values as produced for and by routes
pub type RouteValues = OrderedMap<CacheableValue>;

/// Protocol shared by everything that can be turned into a link
pub trait ActionUriSpecification {
    /// Raw route values to resolve into a URI
    fn to_route_values(&self) -> RouteValues;

    /// Query parameters to append to the resolved URI
    fn query_parameters(&self) -> &QueryMap;

    /// Merge the query parameters into `uri`'s existing query string
    ///
    /// Existing parameters are kept unless overridden; nested structures are
    /// merged recursively. Without query parameters `uri` is returned as is.
    fn merge_query_parameters_into_uri(&self, uri: Uri) -> Uri {
        let parameters = self.query_parameters();
        if parameters.is_empty() {
            return uri;
        }
        let merged = query::merge_recursive(query::parse_query(uri.query()), parameters);
        let query = query::build_query(&merged);
        uri.with_query(query)
    }
}

/// Package, controller and action a request is dispatched to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionIdentity {
    package: String,
    subpackage: Option<String>,
    controller: String,
    action: String,
    format: String,
    arguments: RouteValues,
    query_parameters: QueryMap,
}

impl ActionIdentity {
    pub fn create(
        package: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            subpackage: None,
            controller: controller.into(),
            action: action.into(),
            format: String::new(),
            arguments: RouteValues::new(),
            query_parameters: QueryMap::new(),
        }
    }

    /// Read an identity back from matched route values
    ///
    /// `@package`, `@controller` and `@action` are required. Every entry
    /// that is not a reserved key becomes an argument.
    pub fn from_route_values(values: &RouteValues) -> Result<Self, LookupError> {
        let required = |key: &str| {
            values
                .get(key)
                .and_then(CacheableValue::literal)
                .ok_or_else(|| LookupError::MissingRouteValue(key.to_string()))
        };
        let optional = |key: &str| values.get(key).and_then(CacheableValue::literal);

        let mut identity = Self::create(
            required(PACKAGE_KEY)?,
            required(CONTROLLER_KEY)?,
            required(ACTION_KEY)?,
        );
        identity.subpackage = optional(SUBPACKAGE_KEY).filter(|s| !s.is_empty());
        identity.format = optional(FORMAT_KEY).unwrap_or_default();
        identity.arguments = values
            .iter()
            .filter(|(key, _)| !is_reserved_key(key))
            .map(|(key, value)| (key, value.clone()))
            .collect();
        Ok(identity)
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn subpackage(&self) -> Option<&str> {
        self.subpackage.as_deref()
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn arguments(&self) -> &RouteValues {
        &self.arguments
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        let package = package.into();
        if self.package == package {
            return self;
        }
        self.package = package;
        self
    }

    pub fn with_subpackage(mut self, subpackage: Option<String>) -> Self {
        let subpackage = subpackage.filter(|s| !s.is_empty());
        if self.subpackage == subpackage {
            return self;
        }
        self.subpackage = subpackage;
        self
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        let controller = controller.into();
        if self.controller == controller {
            return self;
        }
        self.controller = controller;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        let action = action.into();
        if self.action == action {
            return self;
        }
        self.action = action;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        if self.format == format {
            return self;
        }
        self.format = format;
        self
    }

    /// Replace all routing arguments
    pub fn with_routing_arguments(mut self, arguments: RouteValues) -> Self {
        if self.arguments == arguments {
            return self;
        }
        self.arguments = arguments;
        self
    }

    /// Add arguments on top of the existing ones, overriding on collision
    pub fn with_additional_arguments(mut self, arguments: RouteValues) -> Self {
        if arguments.is_empty() {
            return self;
        }
        for (key, value) in arguments {
            self.arguments.insert(key, value);
        }
        self
    }

    pub fn with_query_parameters(mut self, query_parameters: QueryMap) -> Self {
        if self.query_parameters == query_parameters {
            return self;
        }
        self.query_parameters = query_parameters;
        self
    }
}

impl ActionUriSpecification for ActionIdentity {
    /// Arguments first, then the lower-cased reserved keys
    ///
    /// Reserved keys are force-set after the arguments, so an argument named
    /// `@action` can never override the real action.
    fn to_route_values(&self) -> RouteValues {
        let mut values = self.arguments.clone();
        values.insert(ACTION_KEY, CacheableValue::Str(self.action.to_lowercase()));
        values.insert(CONTROLLER_KEY, CacheableValue::Str(self.controller.to_lowercase()));
        values.insert(PACKAGE_KEY, CacheableValue::Str(self.package.to_lowercase()));
        match &self.subpackage {
            Some(subpackage) => {
                values.insert(SUBPACKAGE_KEY, CacheableValue::Str(subpackage.to_lowercase()));
            }
            None => {
                values.remove(SUBPACKAGE_KEY);
            }
        }
        if self.format.is_empty() {
            values.remove(FORMAT_KEY);
        } else {
            values.insert(FORMAT_KEY, CacheableValue::Str(self.format.clone()));
        }
        values
    }

    fn query_parameters(&self) -> &QueryMap {
        &self.query_parameters
    }
}

fn is_reserved_key(key: &str) -> bool {
    matches!(
        key,
        ACTION_KEY | CONTROLLER_KEY | PACKAGE_KEY | SUBPACKAGE_KEY | FORMAT_KEY
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryValue;

    fn values(entries: &[(&str, &str)]) -> RouteValues {
        entries
            .iter()
            .map(|(k, v)| (*k, CacheableValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_to_route_values_lowercases_reserved_keys() {
        let route_values = ActionIdentity::create("Acme", "Default", "index").to_route_values();
        assert_eq!(
            route_values,
            values(&[
                ("@action", "index"),
                ("@controller", "default"),
                ("@package", "acme"),
            ])
        );
        assert!(!route_values.contains_key(FORMAT_KEY));
        assert!(!route_values.contains_key(SUBPACKAGE_KEY));
    }

    #[test]
    fn test_to_route_values_with_subpackage_and_format() {
        let route_values = ActionIdentity::create("Acme.Shop", "Product", "Show")
            .with_subpackage(Some("Admin".to_string()))
            .with_format("json")
            .to_route_values();
        assert_eq!(route_values.get(SUBPACKAGE_KEY), Some(&CacheableValue::from("admin")));
        assert_eq!(route_values.get(FORMAT_KEY), Some(&CacheableValue::from("json")));
        assert_eq!(route_values.get(PACKAGE_KEY), Some(&CacheableValue::from("acme.shop")));
    }

    #[test]
    fn test_reserved_keys_cannot_be_smuggled() {
        let identity = ActionIdentity::create("Acme", "Default", "index").with_routing_arguments(values(&[
            ("@action", "delete"),
            ("@format", "xml"),
            ("product", "42"),
        ]));
        let route_values = identity.to_route_values();
        assert_eq!(route_values.get(ACTION_KEY), Some(&CacheableValue::from("index")));
        assert_eq!(route_values.get("product"), Some(&CacheableValue::from("42")));
        assert!(!route_values.contains_key(FORMAT_KEY));
    }

    #[test]
    fn test_builders_short_circuit_on_equal_values() {
        let identity = ActionIdentity::create("Acme", "Default", "index").with_format("html");
        let again = identity.clone().with_format("html");
        assert_eq!(identity, again);

        let same_args = again.clone().with_routing_arguments(RouteValues::new());
        assert_eq!(same_args, again);
        let no_additional = again.clone().with_additional_arguments(RouteValues::new());
        assert_eq!(no_additional, again);
    }

    #[test]
    fn test_additional_arguments_merge() {
        let identity = ActionIdentity::create("Acme", "Default", "index")
            .with_routing_arguments(values(&[("a", "1"), ("b", "2")]))
            .with_additional_arguments(values(&[("b", "3"), ("c", "4")]));
        assert_eq!(identity.arguments(), &values(&[("a", "1"), ("b", "3"), ("c", "4")]));
    }

    #[test]
    fn test_from_route_values() {
        let route_values = values(&[
            ("@package", "acme"),
            ("@controller", "product"),
            ("@action", "show"),
            ("@format", "html"),
            ("product", "42"),
        ]);
        let identity = ActionIdentity::from_route_values(&route_values).unwrap();
        assert_eq!(identity.package(), "acme");
        assert_eq!(identity.controller(), "product");
        assert_eq!(identity.action(), "show");
        assert_eq!(identity.format(), "html");
        assert_eq!(identity.subpackage(), None);
        assert_eq!(identity.arguments(), &values(&[("product", "42")]));
        assert_eq!(identity.to_route_values().get("product"), route_values.get("product"));
    }

    #[test]
    fn test_from_route_values_requires_action() {
        let route_values = values(&[("@package", "acme"), ("@controller", "product")]);
        assert_eq!(
            ActionIdentity::from_route_values(&route_values),
            Err(LookupError::MissingRouteValue("@action".to_string()))
        );
    }

    #[test]
    fn test_merge_query_parameters_without_parameters() {
        let uri = Uri::parse("/foo?a=1").unwrap();
        let identity = ActionIdentity::create("Acme", "Default", "index");
        assert_eq!(identity.merge_query_parameters_into_uri(uri.clone()), uri);
    }

    #[test]
    fn test_merge_query_parameters_into_uri() {
        let mut nested = QueryMap::new();
        nested.insert("page", QueryValue::from("2"));
        let mut parameters = QueryMap::new();
        parameters.insert("a", QueryValue::from("9"));
        parameters.insert("filter", QueryValue::Map(nested));

        let identity = ActionIdentity::create("Acme", "Default", "index").with_query_parameters(parameters);
        let uri = Uri::parse("http://example.com/foo?a=1&filter[page]=1&filter[sort]=name#top").unwrap();
        let merged = identity.merge_query_parameters_into_uri(uri);

        assert_eq!(
            merged.to_string(),
            "http://example.com/foo?a=9&filter%5Bpage%5D=2&filter%5Bsort%5D=name#top"
        );
    }
}
