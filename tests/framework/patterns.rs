//! Topic Pattern Compiler Tests
//!
//! # Coverage
//! - [x] Placeholder extraction and single-segment matching
//! - [x] Subscription filter generation
//! - [x] Trailing slash and case sensitivity
//! - [x] Rejected patterns (empty, partial braces, duplicates)

use mqtt_gateway::error::RouteError;
use mqtt_gateway::router::TopicPattern;

#[test]
fn extracts_named_params() {
    let pattern = TopicPattern::compile("devices/{device_id}/status").unwrap();

    let params = pattern.match_topic("devices/abc-42/status").unwrap();
    assert_eq!(params.get("device_id").unwrap(), "abc-42");
}

#[test]
fn placeholder_matches_exactly_one_segment() {
    let pattern = TopicPattern::compile("devices/{device_id}/status").unwrap();

    assert!(pattern.match_topic("devices/abc/42/status").is_none());
    assert!(pattern.match_topic("devices/status").is_none());
}

#[test]
fn param_values_never_contain_slashes() {
    let pattern = TopicPattern::compile("a/{x}/b/{y}").unwrap();

    let params = pattern.match_topic("a/one/b/two").unwrap();
    for name in pattern.params() {
        let value = params.get(name).unwrap();
        assert!(!value.contains('/'), "{name}={value}");
    }
}

#[test]
fn filter_replaces_placeholders_with_wildcards() {
    let pattern = TopicPattern::compile("devices/{device_id}/status").unwrap();
    assert_eq!(pattern.filter(), "devices/+/status");

    let pattern = TopicPattern::compile("a/{x}/b/{y}").unwrap();
    assert_eq!(pattern.filter(), "a/+/b/+");
}

#[test]
fn filter_keeps_segment_count() {
    for raw in ["a", "a/{x}", "a/{x}/b", "{x}/{y}/{z}", "sensors/{id}/temp/c"] {
        let pattern = TopicPattern::compile(raw).unwrap();
        assert_eq!(
            pattern.filter().split('/').count(),
            raw.split('/').count(),
            "{raw}"
        );
    }
}

#[test]
fn no_trailing_slash_normalization() {
    let pattern = TopicPattern::compile("a/b").unwrap();
    assert!(pattern.match_topic("a/b/").is_none());

    let pattern = TopicPattern::compile("a/b/").unwrap();
    assert!(pattern.match_topic("a/b").is_none());
}

#[test]
fn matching_is_case_sensitive() {
    let pattern = TopicPattern::compile("Devices/{id}").unwrap();
    assert!(pattern.match_topic("devices/1").is_none());
    assert!(pattern.match_topic("Devices/1").is_some());
}

#[test]
fn literal_regex_characters_are_escaped() {
    let pattern = TopicPattern::compile("a.b/{x}").unwrap();
    assert!(pattern.match_topic("aXb/1").is_none());
    assert!(pattern.match_topic("a.b/1").is_some());
}

#[test]
fn rejects_invalid_patterns() {
    for raw in [
        "",
        "a/{}/b",
        "a/{x}/{x}",
        "a/x{y}/b",
        "a/{x/b",
        "a/x}/b",
        "a/{x-y}/b",
        "a/{1x}/b",
    ] {
        let err = TopicPattern::compile(raw).unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }), "{raw}");
    }
}
