//! Tests for roster loading, addresses and the client URL convention.
//!
//! # Test Strategy
//!
//! 1. **Group files**: parsing, ordering, optional fields
//! 2. **Edge cases**: empty rosters, malformed entries
//! 3. **Properties**: address parsing and port mapping over generated inputs

use corelib::address::{ConnType, NodeAddress};
use corelib::endpoint::ClientUrlMapping;
use corelib::{GroupDescription, NodeDescriptor, PublicKey, Roster};
use proptest::prelude::*;

const GROUP: &str = r#"{
  "description": "Default Dedis Cothority",
  "servers": [
    {
      "address": "tcp://5.135.161.91:2000",
      "public": "94b8255379e11df5167b8a7ae3b85f7e7eb5f13894abee85bd31b3270f1e4c65",
      "description": "Nikkolasg's server: spreading the love of singing"
    },
    {
      "address": "tcp://185.26.156.40:61117",
      "public": "6a921638a4ade8970ebcd9e371570f08d71a24987f90f12391b9f6c525be5be4",
      "description": "Ismail's server",
      "url": "https://ismail.example.com/conode"
    }
  ]
}"#;

// ============================================================================
// Group Files
// ============================================================================

#[test]
fn test_read_group_description() {
    let group = GroupDescription::from_json(GROUP).unwrap();

    assert_eq!(group.description.as_deref(), Some("Default Dedis Cothority"));
    assert_eq!(group.roster.len(), 2);

    let first = group.roster.leader().unwrap();
    assert_eq!(first.address.conn_type(), ConnType::PlainTcp);
    assert_eq!(first.address.network_address(), "5.135.161.91:2000");
    assert_eq!(first.public.as_bytes().len(), 32);

    let second = group.roster.get(1).unwrap();
    assert_eq!(second.description.as_deref(), Some("Ismail's server"));
    assert_eq!(second.url.as_deref(), Some("https://ismail.example.com/conode"));
}

#[test]
fn test_client_urls_for_group() {
    let group = GroupDescription::from_json(GROUP).unwrap();
    let mapping = ClientUrlMapping::default();

    let urls: Vec<String> = group
        .roster
        .iter()
        .map(|node| mapping.client_url(node).unwrap())
        .collect();
    assert_eq!(
        urls,
        vec![
            "ws://5.135.161.91:2001".to_string(),
            "wss://ismail.example.com/conode".to_string(),
        ]
    );
}

#[test]
fn test_group_roundtrip_keeps_order() {
    let group = GroupDescription::from_json(GROUP).unwrap();
    let json = group.to_json().unwrap();
    let again = GroupDescription::from_json(&json).unwrap();
    assert_eq!(again, group);
    assert_eq!(again.roster.node_ids(), group.roster.node_ids());
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_group_without_servers_is_empty() {
    let group = GroupDescription::from_json(r#"{"description": "nothing"}"#).unwrap();
    assert!(group.roster.is_empty());
}

#[test]
fn test_group_with_bad_address_is_rejected() {
    let bad = r#"{"servers": [{"address": "tls://1000.0.0.4:2000", "public": "00"}]}"#;
    assert!(GroupDescription::from_json(bad).is_err());
}

#[test]
fn test_group_with_bad_key_is_rejected() {
    let bad = r#"{"servers": [{"address": "tls://a:2000", "public": "zz"}]}"#;
    assert!(GroupDescription::from_json(bad).is_err());
}

#[test]
fn test_roster_iteration_order() {
    let roster: Roster = ["tls://c:1", "tls://a:1", "tls://b:1"]
        .iter()
        .enumerate()
        .map(|(i, addr)| NodeDescriptor::new(addr.parse().unwrap(), PublicKey::new(vec![i as u8])))
        .collect();
    let hosts: Vec<&str> = roster.iter().map(|n| n.address.host()).collect();
    assert_eq!(hosts, vec!["c", "a", "b"]);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_ipv4_address_roundtrip(a in any::<u8>(), b in any::<u8>(), c in any::<u8>(), d in any::<u8>(), port in any::<u16>()) {
        let input = format!("tls://{}.{}.{}.{}:{}", a, b, c, d, port);
        let addr = NodeAddress::parse(&input).unwrap();
        prop_assert_eq!(addr.port(), port);
        prop_assert_eq!(addr.to_string(), input);
    }

    #[test]
    fn prop_port_over_u16_rejected(port in 65536u32..10_000_000) {
        let input = format!("tls://10.0.0.1:{}", port);
        prop_assert!(NodeAddress::parse(&input).is_err());
    }

    #[test]
    fn prop_client_port_is_shifted(port in 0u16..65000, offset in 0i32..500) {
        let node = NodeDescriptor::new(
            NodeAddress::new(ConnType::Tls, "node.example.com", port).unwrap(),
            PublicKey::new(vec![1]),
        );
        let url = ClientUrlMapping::with_port_offset(offset).client_url(&node).unwrap();
        prop_assert_eq!(url, format!("ws://node.example.com:{}", port as i32 + offset));
    }
}
