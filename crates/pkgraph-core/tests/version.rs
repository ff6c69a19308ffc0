use pkgraph_core::version::{Version, VersionError, VersionRange};

fn v(s: &str) -> Version {
    s.parse().unwrap()
}

#[test]
fn test_precedence_chain() {
    let chain = [
        "1.0.0-alpha",
        "1.0.0-alpha.1",
        "1.0.0-alpha.beta",
        "1.0.0-beta",
        "1.0.0-beta.2",
        "1.0.0-beta.11",
        "1.0.0-rc.1",
        "1.0.0",
        "1.0.1",
        "1.1.0",
        "2.0.0",
    ];
    for pair in chain.windows(2) {
        assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
    }
}

#[test]
fn test_build_metadata_does_not_affect_equality() {
    assert_eq!(v("1.0.0+001"), v("1.0.0+002"));
    assert_eq!(v("1.0.0+001").to_string(), "1.0.0+001");
}

#[test]
fn test_leading_zeros_are_dropped_on_display() {
    assert_eq!(v("01.002.0003").to_string(), "1.2.3");
}

#[test]
fn test_rejections_carry_original_text() {
    for text in ["foo", "1", "1.0", "1.0.", "1.0.0.", "-1.0.0", "1.0.0-", "1.0.0+"] {
        assert_eq!(
            Version::parse(text),
            Err(VersionError::InvalidVersionString(text.to_string())),
            "{text}"
        );
    }
}

#[test]
fn test_range_selection_picks_highest_satisfying() {
    let available = [v("1.0.0"), v("1.5.0"), v("1.9.0"), v("2.0.0")];
    let range = VersionRange::parse("1.0.0..<2.0.0")
        .unwrap()
        .intersect(&VersionRange::parse("1.5.0..<2.0.0").unwrap());
    let best = available.iter().filter(|x| range.contains(x)).max();
    assert_eq!(best, Some(&v("1.9.0")));
}

#[test]
fn test_disjoint_ranges_intersect_to_empty() {
    let range = VersionRange::parse("1.0.0..<2.0.0")
        .unwrap()
        .intersect(&VersionRange::parse("2.0.0..<3.0.0").unwrap());
    assert!(range.is_empty());
    assert!(!range.contains(&v("2.0.0")));
}

#[test]
fn test_caret_range() {
    let range: VersionRange = "^1.2.3".parse().unwrap();
    assert!(range.contains(&v("1.9.9")));
    assert!(!range.contains(&v("2.0.0")));
    assert!(!range.contains(&v("1.2.2")));
}

#[test]
fn test_malformed_range() {
    assert_eq!(
        VersionRange::parse("1.0..<2.0.0"),
        Err(VersionError::InvalidRange("1.0..<2.0.0".to_string()))
    );
}
