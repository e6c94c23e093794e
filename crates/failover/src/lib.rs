//! Failover and leader connections over a roster.
//!
//! This crate provides:
//! - `RosterConnection`: tries nodes one at a time until one answers
//! - `LeaderConnection`: talks to the first node of the roster only
//! - Pluggable candidate ordering for the failover loop

pub mod error;
pub mod leader;
pub mod roster;
pub mod strategy;

pub use error::{Error, Result};
pub use leader::LeaderConnection;
pub use roster::RosterConnection;
pub use strategy::{CandidateOrder, ListOrder};
