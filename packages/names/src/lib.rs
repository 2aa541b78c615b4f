#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Name extraction for payroll document fragments.
//!
//! A PDF text layer arrives as an unordered bag of positioned runs.
//! [`layout`] rebuilds reading order from it, and [`NameEngine`] walks an
//! ordered chain of [`strategy`] matchers over that order, returning the
//! first name any of them finds. Absence of a name is an ordinary outcome
//! and is reported as `None`, never as an error.
//!
//! Document types (payroll receipts, paychecks) differ only in
//! configuration: the strategy chain, its parameters, and the denylist of
//! boilerplate words. Those live in TOML [`profile`]s, two of which are
//! embedded at compile time.

pub mod engine;
pub mod layout;
pub mod patterns;
pub mod profile;
pub mod strategy;

pub use engine::NameEngine;
pub use layout::LineGrouping;
pub use profile::DocumentProfile;
pub use strategy::StrategyConfig;

/// Errors that can occur while building a name engine or loading profiles.
#[derive(Debug, thiserror::Error)]
pub enum NameError {
    /// A configured pattern failed to compile.
    #[error("Invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    /// A profile TOML document failed to parse.
    #[error("Invalid profile TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A profile parsed but is unusable, or no profile matched.
    #[error("Profile error: {0}")]
    Profile(String),

    /// Reading a profile file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
