//! Core data types shared across the ember crates.

mod package;
mod plan;

pub use package::{BundleEntry, DepBundle, Gate, GateTerm, Package, PackageKey};
pub use plan::{DecisionPoint, OperationPlan};

use std::fmt;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Version comparator carried by dependency atoms, lock rules and decision
/// points. An atom without a comparator matches the best available version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cmp {
    #[serde(rename = ">=")]
    GreaterEq,
    #[serde(rename = "<=")]
    LessEq,
    #[serde(rename = "==")]
    Exact,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">")]
    Greater,
}

impl Cmp {
    /// Recognized prefixes in detection priority order. Two-character
    /// operators must be tried before their one-character prefixes.
    const PREFIXES: [(&'static str, Cmp); 5] = [
        (">=", Cmp::GreaterEq),
        ("<=", Cmp::LessEq),
        ("==", Cmp::Exact),
        ("<", Cmp::Less),
        (">", Cmp::Greater),
    ];

    /// Split a leading comparator off `input`, if one is present.
    pub fn strip(input: &str) -> (Option<Cmp>, &str) {
        for (prefix, cmp) in Self::PREFIXES {
            if let Some(rest) = input.strip_prefix(prefix) {
                return (Some(cmp), rest);
            }
        }
        (None, input)
    }

    /// Whether `candidate` satisfies `self wanted` under the version order.
    pub fn admits(&self, candidate: &str, wanted: &str) -> bool {
        let ord = crate::version::compare(candidate, wanted);
        match self {
            Cmp::GreaterEq => ord != Ordering::Less,
            Cmp::LessEq => ord != Ordering::Greater,
            Cmp::Exact => ord == Ordering::Equal,
            Cmp::Less => ord == Ordering::Less,
            Cmp::Greater => ord == Ordering::Greater,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cmp::GreaterEq => ">=",
            Cmp::LessEq => "<=",
            Cmp::Exact => "==",
            Cmp::Less => "<",
            Cmp::Greater => ">",
        }
    }
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_priority() {
        assert_eq!(Cmp::strip(">=sys-libs/zlib"), (Some(Cmp::GreaterEq), "sys-libs/zlib"));
        assert_eq!(Cmp::strip("<=x/y"), (Some(Cmp::LessEq), "x/y"));
        assert_eq!(Cmp::strip("==x/y"), (Some(Cmp::Exact), "x/y"));
        assert_eq!(Cmp::strip("<x/y"), (Some(Cmp::Less), "x/y"));
        assert_eq!(Cmp::strip(">x/y"), (Some(Cmp::Greater), "x/y"));
        assert_eq!(Cmp::strip("x/y"), (None, "x/y"));
    }

    #[test]
    fn test_admits() {
        assert!(Cmp::GreaterEq.admits("2.0", "2.0"));
        assert!(Cmp::GreaterEq.admits("2.1", "2.0"));
        assert!(!Cmp::GreaterEq.admits("1.9", "2.0"));

        assert!(Cmp::Less.admits("1.9", "2.0"));
        assert!(!Cmp::Less.admits("2.0", "2.0"));

        assert!(Cmp::Exact.admits("2.0", "2.0"));
        assert!(!Cmp::Exact.admits("2.0.1", "2.0"));
    }
}
