//! Core library for glaunch, a pinned Gradle launcher.
//!
//! Guarantees that a project's vendored Gradle distribution and matching JDK
//! are present and checksum-valid, then invokes Gradle with forwarded
//! arguments from inside a target working directory.

pub mod checksum;
pub mod config;
pub mod deps;
pub mod error;
pub mod fetch;
pub mod jdk;
pub mod launcher;
pub mod layout;
pub mod logging;
pub mod workdir;
