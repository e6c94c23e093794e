//! Candidate ordering for failover sends.
//!
//! A candidate order decides in which sequence the nodes of a roster are
//! tried. The retry loop in [`crate::RosterConnection`] only consumes the
//! resulting list, so new policies plug in without touching it.
//!
//! - **ListOrder**: nodes in roster order, leader first

pub mod list_order;

pub use list_order::ListOrder;

use corelib::{NodeDescriptor, Roster};

/// Trait for candidate ordering policies.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` as one policy may be shared by
/// connections living on different tasks.
pub trait CandidateOrder: Send + Sync + 'static {
    /// Nodes to try for one send, first candidate first.
    ///
    /// Every returned node is attempted at most once per send.
    fn candidates<'a>(&self, roster: &'a Roster) -> Vec<&'a NodeDescriptor>;

    /// Policy name (for logging/debugging).
    fn name(&self) -> &'static str;
}
