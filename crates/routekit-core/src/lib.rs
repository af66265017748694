//! RouteKit Core Types
//!
//! This crate provides the cache-facing value types shared by RouteKit:
//! - Cache tags and lifetimes with their merge rules
//! - Cacheable parameter values and parameter stores
//! - Deterministic fingerprints used as cache keys
//! - Core error types

pub mod error;
pub mod fingerprint;
pub mod lifetime;
pub mod map;
pub mod metadata;
pub mod parameters;
pub mod tags;
pub mod value;

pub use error::{Error, LookupError, Result, ValidationError};
pub use lifetime::Lifetime;
pub use map::OrderedMap;
pub use metadata::CacheMetadata;
pub use parameters::ParameterStore;
pub use tags::TagSet;
pub use value::{CacheableValue, Fingerprintable};
