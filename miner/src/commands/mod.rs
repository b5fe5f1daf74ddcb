//! Subcommand implementations.

pub mod efforts;
pub mod profiles;
pub mod releases;
pub mod toggles;

pub use releases::ReleaseOptions;
pub use toggles::ToggleOptions;
