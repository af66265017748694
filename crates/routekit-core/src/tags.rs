//! Cache tags attached to routing results
//!
//! A tag is a short label that lets a cache layer flush every entry that
//! depends on the same piece of content. Matchers and resolvers contribute
//! tags independently; the router merges them into one `TagSet` per result.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::fingerprint;
use crate::map::OrderedMap;
use crate::value::CacheableValue;

/// Maximum number of characters in a single tag
pub const MAX_TAG_LENGTH: usize = 250;

/// Regex for valid tags: letters, digits, `_`, `%`, `-` and `&`
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_%\-&]{1,250}$").unwrap());

/// Regex for literals that identify a persisted object
static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").unwrap()
});

/// Validated, de-duplicated set of cache tags
///
/// Insertion order is kept for output but ignored by equality.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    /// Create an empty tag set
    pub fn empty() -> Self {
        Self { tags: Vec::new() }
    }

    /// Create a tag set holding a single tag
    pub fn from_tag(tag: impl Into<String>) -> Result<Self, ValidationError> {
        Self::empty().with_tag(tag)
    }

    /// Create a tag set from many tags, dropping duplicates
    pub fn from_many<I, S>(tags: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        tags.into_iter()
            .try_fold(Self::empty(), |set, tag| set.with_tag(tag))
    }

    /// Tags for every cumulative prefix of a URI path
    ///
    /// `some/route/path` yields the digests of `some`, `some/route` and
    /// `some/route/path`, so flushing one prefix tag invalidates every cached
    /// result below it.
    pub fn from_uri_path(path: &str) -> Self {
        let mut tags = Vec::new();
        let mut prefix = String::new();
        for segment in path.trim_matches('/').split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            let tag = fingerprint::digest(&prefix);
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Self { tags }
    }

    /// Tags for a cached match or resolve result
    ///
    /// Every UUID literal found in `values`, at any nesting depth, becomes a
    /// tag in the order encountered, followed by the path tags of `path`.
    pub fn from_values(values: &OrderedMap<CacheableValue>, path: &str) -> Self {
        let mut tags = Vec::new();
        collect_uuids(values, &mut tags);
        Self { tags }.merge(&Self::from_uri_path(path))
    }

    /// Return a set that also contains `tag`
    ///
    /// Adding a tag that is already present returns the set unchanged.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Result<Self, ValidationError> {
        let tag = tag.into();
        if self.has(&tag) {
            return Ok(self);
        }
        validate_tag(&tag)?;
        self.tags.push(tag);
        Ok(self)
    }

    /// Union of both sets: own tags first, then the novel tags of `other`
    pub fn merge(mut self, other: &TagSet) -> Self {
        for tag in &other.tags {
            if !self.has(tag) {
                self.tags.push(tag.clone());
            }
        }
        self
    }

    pub fn has(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn as_list(&self) -> Vec<String> {
        self.tags.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl PartialEq for TagSet {
    fn eq(&self, other: &Self) -> bool {
        self.tags.len() == other.tags.len() && self.tags.iter().all(|t| other.has(t))
    }
}

impl Eq for TagSet {}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tags = Vec::<String>::deserialize(deserializer)?;
        TagSet::from_many(tags).map_err(serde::de::Error::custom)
    }
}

fn collect_uuids(values: &OrderedMap<CacheableValue>, tags: &mut Vec<String>) {
    for value in values.values() {
        match value {
            CacheableValue::Nested(nested) => collect_uuids(nested, tags),
            CacheableValue::Str(s) if UUID_REGEX.is_match(s) => {
                if !tags.contains(s) {
                    tags.push(s.clone());
                }
            }
            _ => {}
        }
    }
}

fn validate_tag(tag: &str) -> Result<(), ValidationError> {
    if tag.is_empty() {
        return Err(ValidationError::InvalidTag {
            tag: tag.to_string(),
            reason: "tag must not be empty".to_string(),
        });
    }
    if tag.chars().count() > MAX_TAG_LENGTH {
        return Err(ValidationError::InvalidTag {
            tag: tag.to_string(),
            reason: format!("tag exceeds {} characters", MAX_TAG_LENGTH),
        });
    }
    if !TAG_REGEX.is_match(tag) {
        return Err(ValidationError::InvalidTag {
            tag: tag.to_string(),
            reason: "only A-Z, a-z, 0-9, '_', '%', '-' and '&' are allowed".to_string(),
        });
    }
    Ok(())
}
