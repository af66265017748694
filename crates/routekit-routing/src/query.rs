//! Query string codec with bracket-style nesting
//!
//! `a[b][c]=1&list[]=x&list[]=y` parses into nested maps; `build_query`
//! re-encodes with `&` as separator, percent-encoded brackets and `+` for
//! spaces. `merge_recursive` overlays one map onto another.

use once_cell::sync::Lazy;
use regex::Regex;
use routekit_core::{CacheableValue, OrderedMap};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Matches one `[segment]` of a query key
static KEY_SEGMENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([^\]]*)\]").unwrap());

pub type QueryMap = OrderedMap<QueryValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Value(String),
    Map(QueryMap),
}

impl QueryValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Value(v) => Some(v),
            QueryValue::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&QueryMap> {
        match self {
            QueryValue::Map(map) => Some(map),
            QueryValue::Value(_) => None,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Value(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Value(value)
    }
}

impl From<QueryMap> for QueryValue {
    fn from(value: QueryMap) -> Self {
        QueryValue::Map(value)
    }
}

/// Parse a raw (still encoded) query string into a nested map
pub fn parse_query(query: &str) -> QueryMap {
    let mut result = QueryMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let path = split_key(&key);
        if path.is_empty() {
            continue;
        }
        insert_path(&mut result, &path, value.into_owned());
    }
    result
}

/// Encode a nested map as a query string
pub fn build_query(query: &QueryMap) -> String {
    let mut pairs = Vec::new();
    for (name, value) in query.iter() {
        flatten(name.to_string(), value, &mut pairs);
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Overlay `overrule` onto `base`
///
/// Values of `overrule` win on key collision; when both sides hold a map
/// at the same key the maps are merged recursively.
pub fn merge_recursive(mut base: QueryMap, overrule: &QueryMap) -> QueryMap {
    for (key, value) in overrule.iter() {
        let merged = match (base.get(key), value) {
            (Some(QueryValue::Map(own)), QueryValue::Map(theirs)) => {
                QueryValue::Map(merge_recursive(own.clone(), theirs))
            }
            _ => value.clone(),
        };
        base.insert(key, merged);
    }
    base
}

/// Convert route values into query parameters
///
/// Literals keep their string form and nested values become nested maps.
/// Values that only expose a fingerprint have no query representation and
/// are skipped.
pub fn from_values(values: &OrderedMap<CacheableValue>) -> QueryMap {
    let mut query = QueryMap::new();
    for (name, value) in values.iter() {
        match query_value(value) {
            Some(v) => {
                query.insert(name, v);
            }
            None => tracing::warn!(parameter = name, "Skipping value without query representation"),
        }
    }
    query
}

fn query_value(value: &CacheableValue) -> Option<QueryValue> {
    match value {
        CacheableValue::Nested(map) => Some(QueryValue::Map(from_values(map))),
        other => other.literal().map(QueryValue::Value),
    }
}

/// Split `a[b][]` into `["a", "b", ""]`
fn split_key(key: &str) -> Vec<String> {
    let (base, mut rest) = match key.find('[') {
        Some(index) if index > 0 => key.split_at(index),
        _ if key.is_empty() => return Vec::new(),
        _ => return vec![key.to_string()],
    };
    let mut path = vec![base.to_string()];
    while let Some(caps) = KEY_SEGMENT_REGEX.captures(rest) {
        path.push(caps[1].to_string());
        rest = &rest[caps[0].len()..];
    }
    if !rest.is_empty() {
        // Unbalanced brackets: keep the key as a plain name
        return vec![key.to_string()];
    }
    path
}

fn insert_path(map: &mut QueryMap, path: &[String], value: String) {
    let key = match path[0].as_str() {
        "" => next_index(map),
        segment => segment.to_string(),
    };
    if path.len() == 1 {
        map.insert(key, QueryValue::Value(value));
        return;
    }
    if !matches!(map.get(&key), Some(QueryValue::Map(_))) {
        map.insert(key.clone(), QueryValue::Map(QueryMap::new()));
    }
    if let Some(QueryValue::Map(child)) = map.get_mut(&key) {
        insert_path(child, &path[1..], value);
    }
}

fn next_index(map: &QueryMap) -> String {
    map.keys()
        .filter_map(|k| k.parse::<u64>().ok())
        .max()
        .map(|max| max + 1)
        .unwrap_or(0)
        .to_string()
}

fn flatten(prefix: String, value: &QueryValue, pairs: &mut Vec<(String, String)>) {
    match value {
        QueryValue::Value(v) => pairs.push((prefix, v.clone())),
        QueryValue::Map(map) => {
            for (key, child) in map.iter() {
                flatten(format!("{}[{}]", prefix, key), child, pairs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, QueryValue)]) -> QueryMap {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_parse_flat() {
        let query = parse_query("a=1&b=two+words&c=%C3%A4");
        assert_eq!(query.get("a").and_then(QueryValue::as_str), Some("1"));
        assert_eq!(query.get("b").and_then(QueryValue::as_str), Some("two words"));
        assert_eq!(query.get("c").and_then(QueryValue::as_str), Some("ä"));
    }

    #[test]
    fn test_parse_nested_and_lists() {
        let query = parse_query("a%5Bb%5D%5Bc%5D=1&list[]=x&list[]=y&a[d]=2");
        let a = query.get("a").and_then(QueryValue::as_map).unwrap();
        let b = a.get("b").and_then(QueryValue::as_map).unwrap();
        assert_eq!(b.get("c").and_then(QueryValue::as_str), Some("1"));
        assert_eq!(a.get("d").and_then(QueryValue::as_str), Some("2"));

        let list = query.get("list").and_then(QueryValue::as_map).unwrap();
        assert_eq!(list.get("0").and_then(QueryValue::as_str), Some("x"));
        assert_eq!(list.get("1").and_then(QueryValue::as_str), Some("y"));
    }

    #[test]
    fn test_parse_ignores_empty_keys() {
        let query = parse_query("=1&&a=2");
        assert_eq!(query.len(), 1);
    }

    #[test]
    fn test_parse_unbalanced_brackets() {
        let query = parse_query("a[b=1");
        assert_eq!(query.get("a[b").and_then(QueryValue::as_str), Some("1"));
    }

    #[test]
    fn test_build_query() {
        let query = map(&[
            ("a", "1".into()),
            ("b", map(&[("c", "x y".into())]).into()),
        ]);
        assert_eq!(build_query(&query), "a=1&b%5Bc%5D=x+y");
    }

    #[test]
    fn test_build_then_parse_nested() {
        let query = map(&[("outer", map(&[("inner", map(&[("leaf", "v".into())]).into())]).into())]);
        assert_eq!(parse_query(&build_query(&query)), query);
    }

    #[test]
    fn test_merge_recursive_overrides_and_recurses() {
        let base = parse_query("a=1&b[x]=1&b[y]=2&c=3");
        let overrule = parse_query("a=9&b[y]=8&b[z]=7&d=4");
        let merged = merge_recursive(base, &overrule);
        assert_eq!(build_query(&merged), "a=9&b%5Bx%5D=1&b%5By%5D=8&b%5Bz%5D=7&c=3&d=4");
    }

    #[test]
    fn test_merge_scalar_replaces_map() {
        let base = parse_query("a[x]=1");
        let overrule = parse_query("a=2");
        let merged = merge_recursive(base, &overrule);
        assert_eq!(merged.get("a").and_then(QueryValue::as_str), Some("2"));
    }

    #[derive(Debug)]
    struct Node(&'static str);

    impl routekit_core::Fingerprintable for Node {
        fn fingerprint(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_from_values_skips_fingerprint_only_values() {
        let mut nested = OrderedMap::new();
        nested.insert("page", CacheableValue::from(2));
        let mut values = OrderedMap::new();
        values.insert("q", CacheableValue::from("shoes"));
        values.insert("node", CacheableValue::external(Node("node-1")));
        values.insert("filter", CacheableValue::Nested(nested));
        values.insert("sale", CacheableValue::from(true));

        let query = from_values(&values);
        assert_eq!(query.keys().collect::<Vec<_>>(), vec!["q", "filter", "sale"]);
        assert_eq!(build_query(&query), "q=shoes&filter%5Bpage%5D=2&sale=true");
    }
}
