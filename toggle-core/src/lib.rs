//! Toggle History Core
//!
//! Extracts the lifecycle of toggles (feature flags, runtime switches,
//! compile-time constants) from the patch history of tracked files.
//!
//! ## Pipeline
//!
//! - **Segmenter** - splits a `git log -p` stream into [`CommitRecord`]s
//! - **Classifier** - matches added/removed diff lines against a [`Profile`]
//! - **Resolver** - finds the owning toggle name with a bounded lookback
//! - **Emitter** - maps matches to [`ToggleEvent`]s and hands them to a sink
//!
//! ## Example
//!
//! ```ignore
//! use toggle_core::{extract_events, HeaderFormat, Profile, Segmenter};
//!
//! let profile = Profile::builtin("flag-metadata-expiry").unwrap();
//! for commit in Segmenter::new(&log, HeaderFormat::sentinel()) {
//!     let commit = commit?;
//!     for event in extract_events(&commit, &profile, "chrome/browser/flag-metadata.json") {
//!         println!("{:?}", event.toggle_name);
//!     }
//! }
//! ```

pub mod classify;
pub mod emit;
pub mod error;
pub mod model;
pub mod profile;
pub mod resolve;
pub mod segment;

pub use classify::{Candidate, NameSource, PatternKind, Rule, ValueSource};
pub use emit::{extract_events, Column, EventSink, ToggleRow};
pub use error::ToggleError;
pub use model::{Attribute, AttributeValue, ChangeType, CommitRecord, ToggleEvent};
pub use profile::{Profile, ProfileSpec, RuleSpec, BUILTIN_PROFILES};
pub use resolve::NameResolver;
pub use segment::{HeaderFormat, Region, Segmenter};
