//! Sketch - URI resolution and request lifecycle for an image loader.
//!
//! Image URIs are matched against a registry of scheme models, each of
//! which knows how to derive a disk-cache key and build a byte source.
//! Display requests bound to UI targets move through a validated state
//! machine and deliver exactly one terminal outcome.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the dispatcher, use cases and DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for the domain ports.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "sketch";
