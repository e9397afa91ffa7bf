//! Version string comparison.
//!
//! Defines the total order the resolver treats as an oracle: dotted segments
//! compare numerically (lexically when non-numeric), a pre-release suffix
//! (`_alpha` < `_beta` < `_pre` < `_rc`) orders before the plain version and
//! `_p` after it, and a trailing `-rN` revision breaks remaining ties.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Alpha,
    Beta,
    Pre,
    Rc,
    Release,
    Patch,
}

impl Phase {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "alpha" => Some(Phase::Alpha),
            "beta" => Some(Phase::Beta),
            "pre" => Some(Phase::Pre),
            "rc" => Some(Phase::Rc),
            "p" => Some(Phase::Patch),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Parsed<'a> {
    segments: Vec<&'a str>,
    phase: Phase,
    phase_num: u64,
    revision: u64,
}

fn parse(input: &str) -> Parsed<'_> {
    let mut rest = input.trim();

    let mut revision = 0;
    if let Some(pos) = rest.rfind("-r") {
        let digits = &rest[pos + 2..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            revision = digits.parse().unwrap_or(0);
            rest = &rest[..pos];
        }
    }

    let mut phase = Phase::Release;
    let mut phase_num = 0;
    if let Some(pos) = rest.rfind('_') {
        let tail = &rest[pos + 1..];
        let digits_at = tail
            .bytes()
            .position(|b| b.is_ascii_digit())
            .unwrap_or(tail.len());
        let (name, digits) = tail.split_at(digits_at);
        if let Some(known) = Phase::from_name(name) {
            phase = known;
            phase_num = digits.parse().unwrap_or(0);
            rest = &rest[..pos];
        }
    }

    Parsed {
        segments: rest.split('.').collect(),
        phase,
        phase_num,
        revision,
    }
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Split `name-1.2.3` into name and version at the last `-` that is
/// followed by a digit. Returns `None` when no version part is present.
pub fn split_name_version(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    for i in (0..bytes.len()).rev() {
        if bytes[i] == b'-' && bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit()) {
            return Some((&s[..i], &s[i + 1..]));
        }
    }
    None
}

/// Total order over version strings
pub fn compare(a: &str, b: &str) -> Ordering {
    let pa = parse(a);
    let pb = parse(b);

    for (sa, sb) in pa.segments.iter().zip(pb.segments.iter()) {
        let ord = compare_segments(sa, sb);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    pa.segments
        .len()
        .cmp(&pb.segments.len())
        .then(pa.phase.cmp(&pb.phase))
        .then(pa.phase_num.cmp(&pb.phase_num))
        .then(pa.revision.cmp(&pb.revision))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_segments() {
        assert_eq!(compare("1.2.3", "1.2.3"), Ordering::Equal);
        assert_eq!(compare("1.2.3", "1.2.4"), Ordering::Less);
        assert_eq!(compare("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare("2.0", "10.0"), Ordering::Less);
    }

    #[test]
    fn test_segment_count_breaks_ties() {
        assert_eq!(compare("1.2", "1.2.0"), Ordering::Less);
        assert_eq!(compare("1.2.0", "1.2"), Ordering::Greater);
    }

    #[test]
    fn test_prerelease_orders_before_release() {
        assert_eq!(compare("1.0_alpha", "1.0"), Ordering::Less);
        assert_eq!(compare("1.0_beta", "1.0_alpha"), Ordering::Greater);
        assert_eq!(compare("1.0_pre", "1.0_rc"), Ordering::Less);
        assert_eq!(compare("1.0_rc1", "1.0_rc2"), Ordering::Less);
        assert_eq!(compare("1.0_rc", "1.0_rc1"), Ordering::Less);
    }

    #[test]
    fn test_patch_suffix_orders_after_release() {
        assert_eq!(compare("1.0_p1", "1.0"), Ordering::Greater);
        assert_eq!(compare("1.0_p1", "1.0_p2"), Ordering::Less);
        assert_eq!(compare("1.0_p1", "1.1"), Ordering::Less);
    }

    #[test]
    fn test_revision_breaks_remaining_ties() {
        assert_eq!(compare("1.0-r1", "1.0"), Ordering::Greater);
        assert_eq!(compare("1.0-r1", "1.0-r2"), Ordering::Less);
        assert_eq!(compare("1.0_rc1-r3", "1.0_rc1-r2"), Ordering::Greater);
        assert_eq!(compare("1.0-r9", "1.1"), Ordering::Less);
    }

    #[test]
    fn test_split_name_version() {
        assert_eq!(split_name_version("zlib-1.3"), Some(("zlib", "1.3")));
        assert_eq!(
            split_name_version("gtk-engines-2.20_rc1-r2"),
            Some(("gtk-engines", "2.20_rc1-r2"))
        );
        assert_eq!(split_name_version("zlib"), None);
        assert_eq!(split_name_version("no-digit-"), None);
    }

    #[test]
    fn test_non_numeric_segment_falls_back_to_lexical() {
        assert_eq!(compare("1.2a", "1.2b"), Ordering::Less);
        assert_eq!(compare("1.2b", "1.2b"), Ordering::Equal);
    }

    #[test]
    fn test_unknown_underscore_tail_is_part_of_segment() {
        // "_foo" is not a recognized phase; the tail stays in the last
        // segment and compares lexically.
        assert_eq!(compare("1.0_foo", "1.0_foo"), Ordering::Equal);
        assert_ne!(compare("1.0_foo", "1.0_bar"), Ordering::Equal);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_version() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(0u64..50, 1..4),
            prop::option::of((0usize..4, 0u64..5)),
            0u64..5,
        )
            .prop_map(|(segments, phase, revision)| {
                let mut v = segments
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(".");
                if let Some((idx, num)) = phase {
                    let name = ["alpha", "beta", "pre", "rc"][idx];
                    v.push_str(&format!("_{}{}", name, num));
                }
                if revision > 0 {
                    v.push_str(&format!("-r{}", revision));
                }
                v
            })
    }

    proptest! {
        #[test]
        fn comparison_is_reflexive(v in arb_version()) {
            prop_assert_eq!(compare(&v, &v), Ordering::Equal);
        }
    }

    proptest! {
        #[test]
        fn comparison_is_antisymmetric(a in arb_version(), b in arb_version()) {
            prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
        }
    }

    proptest! {
        #[test]
        fn comparison_is_transitive(
            a in arb_version(),
            b in arb_version(),
            c in arb_version()
        ) {
            if compare(&a, &b) != Ordering::Greater && compare(&b, &c) != Ordering::Greater {
                prop_assert_ne!(compare(&a, &c), Ordering::Greater);
            }
        }
    }
}
