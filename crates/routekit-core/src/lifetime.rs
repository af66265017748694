//! Cache lifetime hints contributed by matchers and resolvers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Undefined,
    Infinite,
    Seconds(NonZeroU32),
}

/// Tri-state cache TTL: no opinion, never expires, or a positive second count
///
/// Serialized as `null` (undefined), `0` (infinite) or the number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lifetime(Kind);

impl Lifetime {
    pub fn undefined() -> Self {
        Self(Kind::Undefined)
    }

    pub fn infinite() -> Self {
        Self(Kind::Infinite)
    }

    /// Create a finite lifetime; zero seconds is rejected
    pub fn from_seconds(seconds: u32) -> Result<Self, ValidationError> {
        NonZeroU32::new(seconds)
            .map(|s| Self(Kind::Seconds(s)))
            .ok_or(ValidationError::InvalidLifetime(u64::from(seconds)))
    }

    /// Create a finite lifetime from a duration, truncated to whole seconds
    pub fn from_duration(duration: Duration) -> Result<Self, ValidationError> {
        let seconds = duration.as_secs();
        let seconds = u32::try_from(seconds).map_err(|_| ValidationError::InvalidLifetime(seconds))?;
        Self::from_seconds(seconds)
    }

    pub fn is_undefined(&self) -> bool {
        self.0 == Kind::Undefined
    }

    pub fn is_infinite(&self) -> bool {
        self.0 == Kind::Infinite
    }

    /// Number of seconds for a finite lifetime
    pub fn seconds(&self) -> Option<u32> {
        match self.0 {
            Kind::Seconds(s) => Some(s.get()),
            _ => None,
        }
    }

    pub fn to_duration(&self) -> Option<Duration> {
        self.seconds().map(|s| Duration::from_secs(u64::from(s)))
    }

    /// Combine two lifetimes
    ///
    /// The shortest finite lifetime of either side wins, even over an
    /// infinite one. Without finite values the result is infinite if either
    /// side is, otherwise undefined. `undefined()` is the identity.
    pub fn merge(self, other: Lifetime) -> Self {
        let finite = [self.0, other.0]
            .into_iter()
            .filter_map(|kind| match kind {
                Kind::Seconds(s) => Some(s),
                _ => None,
            })
            .min();
        match finite {
            Some(s) => Self(Kind::Seconds(s)),
            None if self.is_infinite() || other.is_infinite() => Self::infinite(),
            None => Self::undefined(),
        }
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::undefined()
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Kind::Undefined => write!(f, "undefined"),
            Kind::Infinite => write!(f, "infinite"),
            Kind::Seconds(s) => write!(f, "{}s", s),
        }
    }
}

impl Serialize for Lifetime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Kind::Undefined => serializer.serialize_none(),
            Kind::Infinite => serializer.serialize_u32(0),
            Kind::Seconds(s) => serializer.serialize_u32(s.get()),
        }
    }
}

impl<'de> Deserialize<'de> for Lifetime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<u32>::deserialize(deserializer)? {
            None => Self::undefined(),
            Some(0) => Self::infinite(),
            Some(s) => Self::from_seconds(s).map_err(serde::de::Error::custom)?,
        })
    }
}
