//! Strict roster order.
//!
//! Candidates are tried exactly as they are listed, so the leader always
//! gets the first attempt. This keeps failover deterministic and means a
//! healthy leader serves every request.

use corelib::{NodeDescriptor, Roster};

use crate::strategy::CandidateOrder;

/// Tries nodes in roster order.
///
/// # Example
///
/// ```rust
/// use corelib::{NodeDescriptor, PublicKey, Roster};
/// use failover::{CandidateOrder, ListOrder};
///
/// let roster: Roster = ["tcp://a:1", "tcp://b:1"]
///     .iter()
///     .map(|addr| NodeDescriptor::new(addr.parse().unwrap(), PublicKey::new(vec![1])))
///     .collect();
/// let order = ListOrder.candidates(&roster);
/// assert_eq!(order[0].address.host(), "a");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOrder;

impl CandidateOrder for ListOrder {
    fn candidates<'a>(&self, roster: &'a Roster) -> Vec<&'a NodeDescriptor> {
        roster.iter().collect()
    }

    fn name(&self) -> &'static str {
        "ListOrder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::PublicKey;

    fn node(addr: &str, key: u8) -> NodeDescriptor {
        NodeDescriptor::new(addr.parse().unwrap(), PublicKey::new(vec![key]))
    }

    #[test]
    fn test_list_order_keeps_roster_order() {
        let roster = Roster::new(vec![
            node("tcp://c:1", 3),
            node("tcp://a:1", 1),
            node("tcp://b:1", 2),
        ]);

        let hosts: Vec<_> = ListOrder
            .candidates(&roster)
            .iter()
            .map(|n| n.address.host().to_string())
            .collect();
        assert_eq!(hosts, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_list_order_empty_roster() {
        assert!(ListOrder.candidates(&Roster::default()).is_empty());
    }
}
