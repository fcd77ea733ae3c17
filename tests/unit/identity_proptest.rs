//! Property tests for the descriptor identity law: equality and hash are
//! determined by (host, user, effective port) and nothing else.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;
use sshmux::{HostOptions, HostSpec, Server};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #[test]
    fn identity_triple_determines_equality_and_hash(
        host in "[a-z]{1,12}(\\.[a-z]{1,8}){0,2}",
        user in "[a-z]{1,10}",
        port in proptest::option::of(1u16..=65535),
        prop_value in "\\PC{0,16}",
    ) {
        let base = HostOptions { port, ..Default::default() };
        let decorated = base.clone().with_property("note", prop_value);

        let a = Server::new(host.clone(), user.clone(), base);
        let b = Server::new(host, user, decorated);

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hash_of(&a), hash_of(&b));
        prop_assert_eq!(a.key(), b.key());
    }

    #[test]
    fn unset_port_is_equivalent_to_explicit_22(
        host in "[a-z]{1,12}",
        user in "[a-z]{1,10}",
    ) {
        let implicit = Server::new(host.clone(), user.clone(), HostOptions::default());
        let explicit = Server::new(host, user, HostOptions::default().with_port(22));

        prop_assert_eq!(&implicit, &explicit);
        prop_assert_eq!(hash_of(&implicit), hash_of(&explicit));
    }

    #[test]
    fn host_spec_display_parse_roundtrip(
        user in proptest::option::of("[a-z]{1,10}"),
        host in "[a-z]{1,12}(\\.[a-z]{1,8}){0,2}",
        port in proptest::option::of(1u16..=65535),
    ) {
        let spec = HostSpec { user, host, port };
        let reparsed: HostSpec = spec.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, spec);
    }

    #[test]
    fn spec_parsing_never_panics(s in "\\PC{0,64}") {
        let _ = s.parse::<HostSpec>();
    }
}
