//! The capability lattice: `AccessLevel`, `Capability`, `CapabilitySet`.
//!
//! A finite lattice of `(resource, access)` pairs with subsumption, join/meet,
//! and set operations. Every operation here is total and pure.

use std::collections::BTreeMap;

/// Ordered access levels, `NONE < READ < WRITE < ADMIN`.
///
/// SAFETY (not unsafe code, but security-relevant): the discriminant order
/// below is load-bearing. `join`/`meet` and every `<`/`>=` comparison in this
/// crate rely on the derived `Ord` matching declaration order. Reordering
/// these variants silently changes which capability subsumes which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum AccessLevel {
    None = 0,
    Read = 1,
    Write = 2,
    Admin = 3,
}

impl AccessLevel {
    /// The lattice bottom: identity for `join`, absorbing for `meet`.
    pub const fn bottom() -> Self {
        AccessLevel::None
    }

    /// The lattice top: identity for `meet`, absorbing for `join`.
    pub const fn top() -> Self {
        AccessLevel::Admin
    }

    pub fn join(a: AccessLevel, b: AccessLevel) -> AccessLevel {
        a.max(b)
    }

    pub fn meet(a: AccessLevel, b: AccessLevel) -> AccessLevel {
        a.min(b)
    }

    /// Parse a level name, case-insensitively. Returns `None` on an unknown
    /// token (unparsable declared-capability levels are skipped, not errored).
    pub fn parse(s: &str) -> Option<AccessLevel> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(AccessLevel::None),
            "READ" => Some(AccessLevel::Read),
            "WRITE" => Some(AccessLevel::Write),
            "ADMIN" => Some(AccessLevel::Admin),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AccessLevel::None => "NONE",
            AccessLevel::Read => "READ",
            AccessLevel::Write => "WRITE",
            AccessLevel::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable `(resource, access)` pair.
///
/// Resource names are canonicalized to lowercase on construction per the
/// case-handling rule: resource names are lowercased on entry to the model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability {
    pub resource: String,
    pub access: AccessLevel,
}

impl Capability {
    pub fn new(resource: impl Into<String>, access: AccessLevel) -> Self {
        Capability {
            resource: resource.into().to_lowercase(),
            access,
        }
    }

    /// `self.subsumes(other)` iff same resource and `self.access >= other.access`.
    pub fn subsumes(&self, other: &Capability) -> bool {
        self.resource == other.resource && self.access >= other.access
    }

    /// Parse a `"resource:LEVEL"` string. Strings without a colon, or with an
    /// unknown LEVEL token, return `None` (skipped silently by callers).
    pub fn parse(s: &str) -> Option<Capability> {
        let (resource, level) = s.split_once(':')?;
        let access = AccessLevel::parse(level)?;
        Some(Capability::new(resource, access))
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.resource, self.access)
    }
}

/// A keyed collection mapping each resource to its highest observed
/// `AccessLevel`. Backed by a `BTreeMap` so iteration is already
/// lexicographically sorted by resource name for any user-visible output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    entries: BTreeMap<String, AccessLevel>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        CapabilitySet::default()
    }

    /// Upserts `cap` to `max(current, cap.access)` for its resource. Never
    /// downgrades an existing entry.
    pub fn add(&mut self, cap: Capability) {
        self.entries
            .entry(cap.resource)
            .and_modify(|lvl| *lvl = AccessLevel::join(*lvl, cap.access))
            .or_insert(cap.access);
    }

    pub fn from_list(caps: impl IntoIterator<Item = Capability>) -> CapabilitySet {
        let mut set = CapabilitySet::new();
        for cap in caps {
            set.add(cap);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, resource: &str) -> Option<AccessLevel> {
        self.entries.get(&resource.to_lowercase()).copied()
    }

    /// True iff some member of `self` subsumes `cap`.
    pub fn permits(&self, cap: &Capability) -> bool {
        self.entries
            .get(&cap.resource)
            .is_some_and(|&lvl| lvl >= cap.access)
    }

    /// True iff every member of `self` is permitted by `other`. The empty
    /// set is a subset of every set; any set is a subset of itself.
    pub fn is_subset_of(&self, other: &CapabilitySet) -> bool {
        self.iter().all(|cap| other.permits(&cap))
    }

    /// Members of `self` not permitted by `declared`.
    pub fn violations_against(&self, declared: &CapabilitySet) -> Vec<Capability> {
        self.iter().filter(|cap| !declared.permits(cap)).collect()
    }

    /// Iterate capabilities in lexicographic resource order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.entries
            .iter()
            .map(|(resource, &access)| Capability {
                resource: resource.clone(),
                access,
            })
    }
}

impl IntoIterator for CapabilitySet {
    type Item = Capability;
    type IntoIter = std::vec::IntoIter<Capability>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .into_iter()
            .map(|(resource, access)| Capability { resource, access })
            .collect::<Vec<_>>()
            .into_iter()
    }
}
