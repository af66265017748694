//! Cache metadata contributed by cooperating matchers and resolvers

use serde::{Deserialize, Serialize};

use crate::lifetime::Lifetime;
use crate::tags::TagSet;

/// Optional tags and lifetime attached to a routing result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<Lifetime>,
}

impl CacheMetadata {
    pub fn new(tags: Option<TagSet>, lifetime: Option<Lifetime>) -> Self {
        Self { tags, lifetime }
    }

    /// Combine two contributions; absent parts never override present ones
    pub fn merge(self, other: &CacheMetadata) -> Self {
        let tags = match (self.tags, &other.tags) {
            (Some(own), Some(theirs)) => Some(own.merge(theirs)),
            (Some(own), None) => Some(own),
            (None, theirs) => theirs.clone(),
        };
        let lifetime = match (self.lifetime, other.lifetime) {
            (Some(own), Some(theirs)) => Some(own.merge(theirs)),
            (own, theirs) => own.or(theirs),
        };
        Self { tags, lifetime }
    }

    /// Fold every contribution in order
    pub fn collect<'a>(contributions: impl IntoIterator<Item = &'a CacheMetadata>) -> Self {
        contributions
            .into_iter()
            .fold(Self::default(), |acc, next| acc.merge(next))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.lifetime.is_none()
    }
}
