//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed Request (method, path, headers)
//!     → router.rs (ordered route table)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: handler or None (caller decides what "no route" means)
//! ```
//!
//! # Design Decisions
//! - Routes are fixed once the application starts
//! - No regex in the hot path (exact and prefix matching only)
//! - First match wins, in registration order

pub mod matcher;
pub mod router;

pub use matcher::{AndMatcher, ExactPathMatcher, Matcher, MethodMatcher, PathPrefixMatcher};
pub use router::Router;
