//! Shared test utilities for the layer explorer workspace.
//!
//! This crate provides common testing infrastructure including:
//! - A canned GIBS-like capabilities document
//! - A scripted in-memory `WmsService`
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, FakeWmsService};
//! ```

pub mod fake;
pub mod fixtures;

pub use fake::FakeWmsService;
