//! Dependency atom parsing.
//!
//! Grammar: `[cmp]category/name[-version][:slot][\[options\]]`. The inline
//! option list is split off first, then the slot (a second `:` is fatal),
//! then the comparator prefix; a comparator atom must carry a version.

use ember_core::error::{EmberError, EmberResult};
use ember_core::types::Cmp;
use ember_core::version;

/// A parsed dependency constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub cmp: Option<Cmp>,
    pub category: String,
    pub name: String,
    pub version: Option<String>,
    /// Slot request; a trailing `*` is a slot-prefix wildcard.
    pub slot: Option<String>,
    /// Inline option requests (`-` prefix disables).
    pub options: Vec<String>,
    /// The raw input, kept for error reporting and dependency records.
    pub raw: String,
}

fn find_unescaped(s: &str, needle: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    (0..bytes.len()).find(|&i| bytes[i] == needle && (i == 0 || bytes[i - 1] != b'\\'))
}

impl Atom {
    /// Parse an atom string; `owner` attributes errors to the requester
    pub fn parse(input: &str, owner: &str) -> EmberResult<Atom> {
        let raw = input.trim();
        let fail = |reason: &str| EmberError::InvalidAtom {
            atom: raw.to_string(),
            owner: owner.to_string(),
            reason: reason.to_string(),
        };

        let (body, options) = match find_unescaped(raw, b'[') {
            Some(open) => {
                let close = raw[open..]
                    .find(']')
                    .map(|j| open + j)
                    .ok_or_else(|| fail("unterminated option list"))?;
                let options = raw[open + 1..close]
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                (format!("{}{}", &raw[..open], &raw[close + 1..]), options)
            }
            None => (raw.to_string(), Vec::new()),
        };

        let (body, slot) = {
            let mut parts = body.splitn(3, ':');
            let head = parts.next().unwrap_or_default().to_string();
            let slot = parts.next().map(str::to_string);
            if parts.next().is_some() {
                return Err(fail("more than one slot separator"));
            }
            if slot.as_deref() == Some("") {
                return Err(fail("empty slot"));
            }
            (head, slot)
        };

        let (cmp, rest) = Cmp::strip(&body);
        let (cn, ver) = if cmp.is_some() {
            let (cn, ver) = version::split_name_version(rest)
                .ok_or_else(|| fail("comparator requires a version"))?;
            (cn.to_string(), Some(ver.to_string()))
        } else {
            (rest.to_string(), None)
        };

        let (category, name) = cn
            .split_once('/')
            .ok_or_else(|| fail("expected category/name"))?;
        if category.is_empty() || name.is_empty() || name.contains('/') {
            return Err(fail("expected category/name"));
        }

        Ok(Atom {
            cmp,
            category: category.to_string(),
            name: name.to_string(),
            version: ver,
            slot,
            options,
            raw: raw.to_string(),
        })
    }

    /// `category/name`
    pub fn cn(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// Whether the slot request is a prefix wildcard
    pub fn slot_is_wildcard(&self) -> bool {
        self.slot.as_deref().map_or(false, |s| s.ends_with('*'))
    }

    /// Whether a concrete version satisfies the comparator, if one is present
    pub fn admits_version(&self, candidate: &str) -> bool {
        match (self.cmp, &self.version) {
            (Some(cmp), Some(version)) => cmp.admits(candidate, version),
            _ => true,
        }
    }
}

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
