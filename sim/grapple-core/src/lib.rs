//! Link-chain simulation for a segmented grapple rope.
//!
//! A grapple is a chain of rigid links joined by character joints. Firing it
//! lays links out along a cast that advances from the origin; when the cast
//! strikes something the chain is linked up and latched onto the struck body,
//! and when it runs out of range the chain is linked and left hanging.
//! Retraction reels the tail back in one link at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Grapple                            │
//! │  routine: Extend(ExtensionScan) | AutoRetract                │
//! │  counters, target, PlayerAttachment, GrappleHandlers         │
//! └───────┬──────────────┬──────────────┬──────────────┬─────────┘
//!         ▼              ▼              ▼              ▼
//!     scan::step   linking::link   retract::step   attachment
//!         └──────────────┴──────┬───────┴──────────────┘
//!                               ▼
//!                     LinkPool ──▶ PhysicsBackend
//! ```
//!
//! The grapple never owns a physics engine. Every call that touches bodies
//! or joints takes `&mut impl PhysicsBackend`, and the host drives the
//! running routine with [`Grapple::tick`] once per simulation step.
//!
//! # Quick Start
//!
//! ```ignore
//! use grapple_core::{Grapple, ExtensionOutcome};
//! use grapple_types::{GrappleConfig, Pose};
//!
//! let mut grapple = Grapple::new(GrappleConfig::default(), Pose::identity(), &mut world)?;
//! grapple.fire(&mut world)?;
//!
//! loop {
//!     if let Some(outcome) = grapple.tick(&mut world, 1.0 / 60.0)? {
//!         if outcome.is_contact() {
//!             grapple.connect_player(&mut world, player)?;
//!         }
//!         break;
//!     }
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/grapple-core/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,      // Many methods can't be const due to nalgebra
    clippy::cast_precision_loss,        // link indices are small
    clippy::cast_possible_truncation,   // link counts are clamped to the pool
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,         // every fallible call forwards backend errors
    clippy::option_if_let_else,         // if-let is often more readable than map_or_else
)]

pub mod attachment;
pub mod events;
pub mod grapple;
pub mod linking;
pub mod physics;
pub mod pool;
pub mod retract;
pub mod scan;

#[cfg(test)]
mod testing;

pub use attachment::PlayerAttachment;
pub use events::{ExtensionOutcome, GrappleEvent, GrappleHandlers};
pub use grapple::{Grapple, GrapplePhase};
pub use linking::link_chain;
pub use physics::{PhysicsBackend, RayHit};
pub use pool::{Link, LinkPool};
pub use retract::{retract_step, RetractParams, RetractStep};
pub use scan::{ExtensionScan, ScanStep};

pub use grapple_types::{GrappleConfig, GrappleError, Pose, Result};
