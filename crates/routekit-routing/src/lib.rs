//! RouteKit Routing
//!
//! This crate provides the request-facing side of RouteKit:
//! - URIs, query strings and a minimal request view
//! - Routing contexts with their cache fingerprint
//! - Match and resolve outcomes carrying cache metadata
//! - Action identities and URI constraints

pub mod action;
pub mod constraints;
pub mod context;
pub mod outcome;
pub mod query;
pub mod request;
pub mod uri;

// Re-export commonly used types
pub use action::{ActionIdentity, ActionUriSpecification, RouteValues};
pub use constraints::{ConstraintKey, UriConstraintSet};
pub use context::RoutingContext;
pub use outcome::{MatchOutcome, ResolveOutcome};
pub use query::{QueryMap, QueryValue};
pub use request::{RequestHead, RouteRequest};
pub use uri::Uri;
