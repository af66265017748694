//! Minimal view of an inbound HTTP request needed for routing
//!
//! The HTTP server is not part of RouteKit; anything that can report a
//! host, a path and a method can be routed.

use routekit_core::Result;
use std::fmt;

use crate::uri::Uri;

pub trait RouteRequest: Send + Sync + fmt::Debug {
    /// Host name without port
    fn host(&self) -> &str;
    /// Request path, without query string
    fn path(&self) -> &str;
    /// Upper-case HTTP method
    fn method(&self) -> &str;
}

/// Owned method and URI of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    method: http::Method,
    uri: Uri,
}

impl RequestHead {
    pub fn new(method: http::Method, uri: Uri) -> Self {
        Self { method, uri }
    }

    /// Build from raw strings, e.g. `("GET", "http://example.com/foo")`
    pub fn parse(method: &str, uri: &str) -> Result<Self> {
        let method = http::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|e| routekit_core::Error::InvalidUri(format!("invalid method '{}': {}", method, e)))?;
        Ok(Self::new(method, Uri::parse(uri)?))
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

impl RouteRequest for RequestHead {
    fn host(&self) -> &str {
        self.uri.host()
    }

    fn path(&self) -> &str {
        self.uri.path()
    }

    fn method(&self) -> &str {
        self.method.as_str()
    }
}

impl<B: Send + Sync + fmt::Debug> RouteRequest for http::Request<B> {
    fn host(&self) -> &str {
        if let Some(host) = self.uri().host() {
            return host;
        }
        // Origin-form requests carry the host in the header only
        self.headers()
            .get(http::header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(strip_port)
            .unwrap_or_default()
    }

    fn path(&self) -> &str {
        self.uri().path()
    }

    fn method(&self) -> &str {
        self.method().as_str()
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map(|end| &host[..=end]).unwrap_or(host);
    }
    host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_head() {
        let head = RequestHead::parse("get", "http://example.com:8080/foo/bar?x=1").unwrap();
        assert_eq!(head.host(), "example.com");
        assert_eq!(head.path(), "/foo/bar");
        assert_eq!(RouteRequest::method(&head), "GET");
    }

    #[test]
    fn test_request_head_rejects_invalid_method() {
        assert!(RequestHead::parse("GE T", "/").is_err());
    }

    #[test]
    fn test_http_request_absolute_form() {
        let request = http::Request::builder()
            .method("POST")
            .uri("http://example.com/api")
            .body(())
            .unwrap();
        assert_eq!(RouteRequest::host(&request), "example.com");
        assert_eq!(RouteRequest::path(&request), "/api");
        assert_eq!(RouteRequest::method(&request), "POST");
    }

    #[test]
    fn test_http_request_host_header() {
        let request = http::Request::builder()
            .uri("/api")
            .header("Host", "example.com:8080")
            .body(())
            .unwrap();
        assert_eq!(RouteRequest::host(&request), "example.com");
        assert_eq!(RouteRequest::method(&request), "GET");
    }

    #[test]
    fn test_strip_port_ipv6() {
        assert_eq!(strip_port("[::1]:80"), "[::1]");
        assert_eq!(strip_port("localhost"), "localhost");
    }
}
