//! URI value used for generated links and the current request URI
//!
//! Unlike `http::Uri` this type represents relative references (`/foo?x=1`)
//! and fragments, and every component can be replaced independently.

use once_cell::sync::Lazy;
use regex::Regex;
use routekit_core::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// RFC 3986 appendix B reference splitter
static URI_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$").unwrap()
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Uri {
    scheme: String,
    user_info: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
    fragment: String,
}

impl Uri {
    /// Parse an absolute URI or a relative reference
    ///
    /// Scheme and host are lower-cased. Ports are kept as given, including
    /// the default port of the scheme.
    pub fn parse(input: &str) -> Result<Self> {
        let caps = URI_REGEX
            .captures(input)
            .ok_or_else(|| Error::InvalidUri(input.to_string()))?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();

        let mut uri = Uri {
            scheme: group(1).to_ascii_lowercase(),
            path: group(3).to_string(),
            query: group(4).to_string(),
            fragment: group(5).to_string(),
            ..Default::default()
        };

        if let Some(authority) = caps.get(2).map(|m| m.as_str()) {
            let host_port = match authority.rsplit_once('@') {
                Some((user_info, rest)) => {
                    uri.user_info = user_info.to_string();
                    rest
                }
                None => authority,
            };
            let (host, port) = split_host_port(host_port)
                .ok_or_else(|| Error::InvalidUri(input.to_string()))?;
            uri.host = host.to_ascii_lowercase();
            uri.port = port;
        }

        Ok(uri)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn user_info(&self) -> &str {
        &self.user_info
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Whether the URI names both a scheme and a host
    pub fn is_absolute(&self) -> bool {
        !self.scheme.is_empty() && !self.host.is_empty()
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into().to_ascii_lowercase();
        self
    }

    pub fn with_user_info(mut self, user_info: impl Into<String>) -> Self {
        self.user_info = user_info.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().to_ascii_lowercase();
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = fragment.into();
        self
    }

    fn has_authority(&self) -> bool {
        !self.host.is_empty() || self.port.is_some() || !self.user_info.is_empty()
    }
}

fn split_host_port(host_port: &str) -> Option<(&str, Option<u16>)> {
    // IPv6 literal, e.g. [::1]:8080
    if host_port.starts_with('[') {
        let end = host_port.find(']')?;
        let (host, rest) = host_port.split_at(end + 1);
        return match rest.strip_prefix(':') {
            Some(port) => Some((host, parse_port(port)?)),
            None if rest.is_empty() => Some((host, None)),
            None => None,
        };
    }
    match host_port.rsplit_once(':') {
        Some((host, port)) => Some((host, parse_port(port)?)),
        None => Some((host_port, None)),
    }
}

/// `Some(None)` for an empty port, `None` when the port is not a number
fn parse_port(port: &str) -> Option<Option<u16>> {
    if port.is_empty() {
        return Some(None);
    }
    port.parse::<u16>().ok().map(Some)
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        if self.has_authority() {
            f.write_str("//")?;
            if !self.user_info.is_empty() {
                write!(f, "{}@", self.user_info)?;
            }
            f.write_str(&self.host)?;
            if let Some(port) = self.port {
                write!(f, ":{}", port)?;
            }
            if !self.path.is_empty() && !self.path.starts_with('/') {
                f.write_str("/")?;
            }
        }
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uri::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute() {
        let uri = Uri::parse("HTTPS://user@Example.COM:8443/some/path?x=1&y=2#top").unwrap();
        assert_eq!(uri.scheme(), "https");
        assert_eq!(uri.user_info(), "user");
        assert_eq!(uri.host(), "example.com");
        assert_eq!(uri.port(), Some(8443));
        assert_eq!(uri.path(), "/some/path");
        assert_eq!(uri.query(), "x=1&y=2");
        assert_eq!(uri.fragment(), "top");
        assert!(uri.is_absolute());
    }

    #[test]
    fn test_parse_relative() {
        let uri = Uri::parse("/foo?bar=baz").unwrap();
        assert_eq!(uri.scheme(), "");
        assert_eq!(uri.host(), "");
        assert_eq!(uri.port(), None);
        assert_eq!(uri.path(), "/foo");
        assert_eq!(uri.query(), "bar=baz");
        assert!(!uri.is_absolute());
    }

    #[test]
    fn test_default_port_is_kept() {
        let uri = Uri::parse("http://example.com:80/foo").unwrap();
        assert_eq!(uri.port(), Some(80));
        assert_eq!(uri.to_string(), "http://example.com:80/foo");
    }

    #[test]
    fn test_ipv6_host() {
        let uri = Uri::parse("http://[::1]:8080/").unwrap();
        assert_eq!(uri.host(), "[::1]");
        assert_eq!(uri.port(), Some(8080));
    }

    #[test]
    fn test_invalid_port() {
        assert!(matches!(
            Uri::parse("http://example.com:http/"),
            Err(Error::InvalidUri(_))
        ));
        assert!(Uri::parse("http://example.com:99999/").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for raw in [
            "http://example.com/foo",
            "https://a.b.example.org:8080/x/y?z=1#frag",
            "/relative/path?q=1",
            "",
        ] {
            assert_eq!(Uri::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_display_adds_slash_between_authority_and_path() {
        let uri = Uri::default().with_host("example.com").with_path("foo");
        assert_eq!(uri.to_string(), "//example.com/foo");
    }

    #[test]
    fn test_builders() {
        let uri = Uri::parse("/foo")
            .unwrap()
            .with_scheme("HTTPS")
            .with_host("Example.com")
            .with_port(Some(443))
            .with_query("a=b")
            .with_fragment("f");
        assert_eq!(uri.to_string(), "https://example.com:443/foo?a=b#f");
    }

    #[test]
    fn test_serde_as_string() {
        let uri = Uri::parse("http://example.com/foo").unwrap();
        assert_eq!(serde_json::to_string(&uri).unwrap(), r#""http://example.com/foo""#);
        let back: Uri = serde_json::from_str(r#""/bar""#).unwrap();
        assert_eq!(back.path(), "/bar");
    }
}
