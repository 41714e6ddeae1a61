//! Integration tests for the grapple crates.
//!
//! These tests drive a [`grapple_core::Grapple`] against the reference
//! [`grapple_world::World`]:
//! - Extension → contact or fail
//! - Retraction, auto-retraction and the length floor
//! - Player attachment, target release and reset
//! - Properties over random configurations

pub mod attachment;
pub mod extension;
pub mod properties;
pub mod retraction;
