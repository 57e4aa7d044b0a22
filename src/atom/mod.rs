//! Package atoms: parsed query and dependency specifiers
//!
//! An atom names a `category/name` and optionally constrains version
//! (operator prefix), slot (`:slot` or `:slot/subslot`), USE state
//! (`[flag,-flag]`), and origin repository (`::repo`):
//!
//! ```text
//! [op]category/name[-version[*]][:slot[/subslot]][[use,...]][::repo]
//! ```
//!
//! Examples: `dev-libs/openssl`, `>=dev-lang/python-3.12`,
//! `=dev-libs/F-1:1::repo1`, `dev-libs/A[-foo]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::PackageInstance;
use crate::error::{Error, Result};
use crate::version::{Operator, Version};

/// Package identity: category plus name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageId {
    pub category: String,
    pub name: String,
}

impl PackageId {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// Slot identifier with optional sub-slot
///
/// Two instances of the same package may coexist when their slots
/// differ. On an atom, a missing sub-slot leaves the sub-slot
/// unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub slot: String,
    pub subslot: Option<String>,
}

impl Slot {
    pub fn new(slot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            subslot: None,
        }
    }

    pub fn with_subslot(slot: impl Into<String>, subslot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            subslot: Some(subslot.into()),
        }
    }

    /// Parse `slot` or `slot/subslot` (without the leading `:`).
    pub fn parse(input: &str) -> Result<Self> {
        let (slot, subslot) = match input.split_once('/') {
            Some((slot, subslot)) => (slot, Some(subslot)),
            None => (input, None),
        };
        if !valid_slot_name(slot) || !subslot.map_or(true, valid_slot_name) {
            return Err(Error::InvalidSlot(input.to_string()));
        }
        Ok(Self {
            slot: slot.to_string(),
            subslot: subslot.map(str::to_string),
        })
    }
}

fn valid_slot_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.'))
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slot)?;
        if let Some(ref subslot) = self.subslot {
            write!(f, "/{}", subslot)?;
        }
        Ok(())
    }
}

/// A single USE flag requirement inside an atom
///
/// `[foo]` requires the flag enabled on the candidate, `[-foo]` requires
/// it disabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UseDep {
    pub flag: String,
    pub enabled: bool,
}

impl UseDep {
    pub fn parse(input: &str) -> Result<Self> {
        let (flag, enabled) = match input.strip_prefix('-') {
            Some(flag) => (flag, false),
            None => (input, true),
        };
        if flag.is_empty()
            || !flag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '@'))
        {
            return Err(Error::MalformedAtom(format!("bad use dep: {}", input)));
        }
        Ok(Self {
            flag: flag.to_string(),
            enabled,
        })
    }
}

impl fmt::Display for UseDep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.enabled {
            write!(f, "-")?;
        }
        write!(f, "{}", self.flag)
    }
}

/// Parsed package specifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub id: PackageId,
    /// Version operator; present iff `version` is present.
    pub op: Option<Operator>,
    pub version: Option<Version>,
    pub slot: Option<Slot>,
    pub use_deps: Vec<UseDep>,
    /// Origin-repository constraint (`::repo`). Absent means any
    /// repository is eligible.
    pub repo: Option<String>,
}

impl Atom {
    /// An unconstrained atom for a package identity.
    pub fn unversioned(id: PackageId) -> Self {
        Self {
            id,
            op: None,
            version: None,
            slot: None,
            use_deps: Vec::new(),
            repo: None,
        }
    }

    /// Parse a textual specifier.
    pub fn parse(input: &str) -> Result<Self> {
        let err = || Error::MalformedAtom(input.to_string());

        let spec = input.trim();
        if spec.is_empty() {
            return Err(err());
        }

        let (op, rest) = Operator::strip(spec);

        let (rest, repo) = match rest.rfind("::") {
            Some(idx) => {
                let repo = &rest[idx + 2..];
                if repo.is_empty() {
                    return Err(err());
                }
                (&rest[..idx], Some(repo.to_string()))
            }
            None => (rest, None),
        };

        let (rest, use_deps) = match rest.find('[') {
            Some(idx) => {
                let inner = rest[idx..]
                    .strip_prefix('[')
                    .and_then(|tail| tail.strip_suffix(']'))
                    .ok_or_else(&err)?;
                let mut deps = Vec::new();
                for part in inner.split(',') {
                    let part = part.trim();
                    if part.is_empty() {
                        continue;
                    }
                    deps.push(UseDep::parse(part)?);
                }
                (&rest[..idx], deps)
            }
            None => (rest, Vec::new()),
        };

        let (rest, slot) = match rest.find(':') {
            Some(idx) => (&rest[..idx], Some(Slot::parse(&rest[idx + 1..])?)),
            None => (rest, None),
        };

        let (category, name_version) = rest.split_once('/').ok_or_else(&err)?;
        if category.is_empty() || name_version.is_empty() {
            return Err(err());
        }

        // A version is only recognized when an operator demands one; a
        // bare atom keeps dashes and digits as part of the name.
        let (name, version) = if op.is_some() {
            let (name, version) = split_name_version(name_version).ok_or_else(&err)?;
            (name, Some(Version::parse(version)?))
        } else {
            (name_version, None)
        };
        if !valid_package_name(category) || !valid_package_name(name) {
            return Err(err());
        }
        if let Some(ref version) = version {
            if version.glob && op != Some(Operator::Equal) {
                return Err(err());
            }
        }

        Ok(Self {
            id: PackageId::new(category, name),
            op,
            version,
            slot,
            use_deps,
            repo,
        })
    }

    /// Check category and name.
    pub fn matches_id(&self, instance: &PackageInstance) -> bool {
        self.id == instance.id
    }

    /// Check the version constraint, if any, against a version.
    pub fn matches_version(&self, version: &Version) -> bool {
        let (op, want) = match (self.op, &self.version) {
            (Some(op), Some(want)) => (op, want),
            _ => return true,
        };
        match op {
            Operator::Equal if want.glob => want.prefix_matches(version),
            Operator::Equal => version == want,
            Operator::Approximate => version.base() == want.base(),
            Operator::Less => version < want,
            Operator::LessOrEqual => version <= want,
            Operator::Greater => version > want,
            Operator::GreaterOrEqual => version >= want,
        }
    }

    /// Check the slot constraint, if any, against an instance slot.
    pub fn matches_slot(&self, slot: &Slot) -> bool {
        match self.slot {
            Some(ref want) => {
                want.slot == slot.slot
                    && (want.subslot.is_none() || want.subslot == slot.subslot)
            }
            None => true,
        }
    }

    /// Check the repository constraint, if any.
    pub fn matches_repository(&self, repository: &str) -> bool {
        match self.repo {
            Some(ref want) => want == repository,
            None => true,
        }
    }

    /// Full structural match: identity, version, slot, and repository.
    ///
    /// USE requirements are not checked here; they depend on override
    /// state and are evaluated separately.
    pub fn matches(&self, instance: &PackageInstance) -> bool {
        self.matches_id(instance)
            && self.matches_version(&instance.version)
            && self.matches_slot(&instance.slot)
            && self.matches_repository(&instance.repository)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = self.op {
            write!(f, "{}", op)?;
        }
        write!(f, "{}", self.id)?;
        if let Some(ref version) = self.version {
            write!(f, "-{}", version)?;
        }
        if let Some(ref slot) = self.slot {
            write!(f, ":{}", slot)?;
        }
        if !self.use_deps.is_empty() {
            write!(f, "[")?;
            for (i, dep) in self.use_deps.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", dep)?;
            }
            write!(f, "]")?;
        }
        if let Some(ref repo) = self.repo {
            write!(f, "::{}", repo)?;
        }
        Ok(())
    }
}

impl FromStr for Atom {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn valid_package_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.'))
}

/// Split `name-version` at the last dash that is followed by a digit.
pub(crate) fn split_name_version(s: &str) -> Option<(&str, &str)> {
    let mut split = None;
    for (i, c) in s.char_indices() {
        if c == '-'
            && s[i + 1..]
                .chars()
                .next()
                .map(|next| next.is_ascii_digit())
                .unwrap_or(false)
        {
            split = Some(i);
        }
    }
    split.map(|i| (&s[..i], &s[i + 1..]))
}
