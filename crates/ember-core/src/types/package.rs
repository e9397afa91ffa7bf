//! Package records and conditional dependency bundles.
//!
//! A `Package` is one concrete versioned build in one slot; the database
//! hands them out read-only and the resolver never mutates them.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Deduplication key for plan entries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageKey {
    pub repo: String,
    pub category: String,
    pub name: String,
    pub version: String,
}

/// One concrete package record from the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Package {
    /// Surrogate key, assigned by the store. Stable for one resolution run.
    #[serde(default)]
    pub id: u32,
    pub repo: String,
    pub category: String,
    pub name: String,
    pub version: String,
    #[serde(default = "default_slot")]
    pub slot: String,
    pub arch: String,
    /// Option names this package declares support for.
    #[serde(default)]
    pub options: IndexSet<String>,
    /// Options the package was built with. Only meaningful on installed records.
    #[serde(default)]
    pub applied: IndexSet<String>,

    // Static dependency buckets: plain atom strings.
    #[serde(default)]
    pub depend_build: Vec<String>,
    #[serde(default)]
    pub depend_run: Vec<String>,
    #[serde(default)]
    pub depend_post: Vec<String>,
    #[serde(default)]
    pub depend_conflict: Vec<String>,

    // Conditional dependency buckets: option-gated bundles.
    #[serde(default)]
    pub optional_build: Vec<DepBundle>,
    #[serde(default)]
    pub optional_run: Vec<DepBundle>,
    #[serde(default)]
    pub optional_post: Vec<DepBundle>,
    #[serde(default)]
    pub optional_conflict: Vec<DepBundle>,
}

fn default_slot() -> String {
    "0".to_string()
}

impl Package {
    /// Create a bare package record with empty dependency buckets
    pub fn new(repo: &str, category: &str, name: &str, version: &str, slot: &str, arch: &str) -> Self {
        Self {
            id: 0,
            repo: repo.to_string(),
            category: category.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            slot: slot.to_string(),
            arch: arch.to_string(),
            options: IndexSet::new(),
            applied: IndexSet::new(),
            depend_build: Vec::new(),
            depend_run: Vec::new(),
            depend_post: Vec::new(),
            depend_conflict: Vec::new(),
            optional_build: Vec::new(),
            optional_run: Vec::new(),
            optional_post: Vec::new(),
            optional_conflict: Vec::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_applied<I, S>(mut self, applied: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applied = applied.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_depend_build(mut self, atoms: &[&str]) -> Self {
        self.depend_build = atoms.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_depend_run(mut self, atoms: &[&str]) -> Self {
        self.depend_run = atoms.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_depend_post(mut self, atoms: &[&str]) -> Self {
        self.depend_post = atoms.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_depend_conflict(mut self, atoms: &[&str]) -> Self {
        self.depend_conflict = atoms.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_optional_build(mut self, bundle: DepBundle) -> Self {
        self.optional_build.push(bundle);
        self
    }

    pub fn with_optional_run(mut self, bundle: DepBundle) -> Self {
        self.optional_run.push(bundle);
        self
    }

    pub fn with_optional_post(mut self, bundle: DepBundle) -> Self {
        self.optional_post.push(bundle);
        self
    }

    pub fn with_optional_conflict(mut self, bundle: DepBundle) -> Self {
        self.optional_conflict.push(bundle);
        self
    }

    /// `category/name`
    pub fn cn(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// `category/name:slot`, the key inline-option targets are stored under
    pub fn slot_key(&self) -> String {
        format!("{}/{}:{}", self.category, self.name, self.slot)
    }

    /// Deduplication key for plan entries
    pub fn key(&self) -> PackageKey {
        PackageKey {
            repo: self.repo.clone(),
            category: self.category.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}-{}:{}", self.category, self.name, self.version, self.slot)
    }
}

/// One term of a gate expression: an option name, possibly negated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateTerm {
    pub option: String,
    pub negated: bool,
}

impl GateTerm {
    fn parse(term: &str) -> Self {
        match term.strip_prefix('!') {
            Some(option) => Self {
                option: option.to_string(),
                negated: true,
            },
            None => Self {
                option: term.to_string(),
                negated: false,
            },
        }
    }
}

/// Gate expression: option names joined by AND, each possibly negated.
///
/// Serialized as a list of term strings (`["x", "!y"]`) in snapshot files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Gate {
    pub terms: Vec<GateTerm>,
}

impl Gate {
    /// Parse a whitespace-separated gate expression like `"x !y"`
    pub fn parse(expr: &str) -> Self {
        Self {
            terms: expr.split_whitespace().map(GateTerm::parse).collect(),
        }
    }

    /// Evaluate the gate against an option set. An empty gate is satisfied.
    pub fn satisfied(&self, options: &IndexSet<String>) -> bool {
        self.terms
            .iter()
            .all(|term| options.contains(&term.option) != term.negated)
    }
}

impl From<Vec<String>> for Gate {
    fn from(terms: Vec<String>) -> Self {
        Self {
            terms: terms.iter().map(|t| GateTerm::parse(t)).collect(),
        }
    }
}

impl From<Gate> for Vec<String> {
    fn from(gate: Gate) -> Self {
        gate.terms
            .into_iter()
            .map(|t| {
                if t.negated {
                    format!("!{}", t.option)
                } else {
                    t.option
                }
            })
            .collect()
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.terms.iter().map(|t| {
            if t.negated {
                format!("!{}", t.option)
            } else {
                t.option.clone()
            }
        }).collect();
        f.write_str(&rendered.join(" "))
    }
}

/// One entry in a conditional bundle's sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleEntry {
    /// A plain dependency atom.
    Atom(String),
    /// A nested sub-gate with its atoms. Contiguous runs of branches form an
    /// else-if chain: the first satisfied branch in a run wins.
    Branch { gate: Gate, atoms: Vec<String> },
    /// Sentinel: entries after this point form the explicit else continuation,
    /// taken when the bundle's top-level gate is not satisfied.
    Else,
}

/// An option-gated dependency bundle from one of the conditional buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepBundle {
    pub gate: Gate,
    pub entries: Vec<BundleEntry>,
}

impl DepBundle {
    /// Bundle whose gate guards a flat list of atoms
    pub fn when(gate: &str, atoms: &[&str]) -> Self {
        Self {
            gate: Gate::parse(gate),
            entries: atoms.iter().map(|a| BundleEntry::Atom(a.to_string())).collect(),
        }
    }

    /// Append a sub-gated branch to the sequence
    pub fn with_branch(mut self, gate: &str, atoms: &[&str]) -> Self {
        self.entries.push(BundleEntry::Branch {
            gate: Gate::parse(gate),
            atoms: atoms.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    /// Append the else sentinel followed by the else continuation's atoms
    pub fn with_else(mut self, atoms: &[&str]) -> Self {
        self.entries.push(BundleEntry::Else);
        self.entries
            .extend(atoms.iter().map(|a| BundleEntry::Atom(a.to_string())));
        self
    }
}
