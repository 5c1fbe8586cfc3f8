//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`constants`]: Fixed buffer geometry, timeouts and channel names
//!
//! The public [`crate::constants`] facade re-exports what callers need.

pub(crate) mod constants;
