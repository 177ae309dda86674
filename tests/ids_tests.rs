use std::collections::HashSet;

use reminders::ids::{fallback_uuid, generate_id};
use reminders::timestamp;

#[test]
fn generated_ids_are_v4_uuids() {
    let id = generate_id();
    let parsed = uuid::Uuid::parse_str(&id).unwrap();
    assert_eq!(parsed.get_version_num(), 4);
    assert_eq!(parsed.get_variant(), uuid::Variant::RFC4122);
}

#[test]
fn fallback_ids_are_v4_shaped_and_distinct() {
    let ids: HashSet<uuid::Uuid> = (0..200).map(|_| fallback_uuid()).collect();
    assert_eq!(ids.len(), 200);
    for id in ids {
        assert_eq!(id.get_version_num(), 4);
        assert_eq!(id.get_variant(), uuid::Variant::RFC4122);
    }
}

#[test]
fn timestamp_grammar() {
    let midnight = timestamp::parse("2020-01-01T00:00:00Z").unwrap();
    assert_eq!(timestamp::parse("2020-01-01").unwrap(), midnight);
    assert_eq!(timestamp::parse("2020-01-01T00:00").unwrap(), midnight);
    assert_eq!(timestamp::parse("2020-01-01 00:00:00").unwrap(), midnight);
    assert_eq!(timestamp::parse("2020-01-01T01:00:00+01:00").unwrap(), midnight);
    assert_eq!(timestamp::parse(" 2020-01-01T00:00:00.000Z ").unwrap(), midnight);

    assert!(timestamp::parse("").is_none());
    assert!(timestamp::parse("2020-13-01").is_none());
    assert!(timestamp::parse("tomorrow").is_none());

    assert_eq!(timestamp::format(midnight), "2020-01-01T00:00:00.000Z");
}
