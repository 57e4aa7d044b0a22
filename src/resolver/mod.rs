//! Instance selection
//!
//! The selector filters a package's candidate instances by atom match,
//! USE requirements, and visibility, then picks the best survivor by
//! the composite key `(version, repository priority)`: highest version
//! wins, repository priority breaks ties among equal versions. The
//! result never depends on catalog iteration order - a full tie on the
//! composite key is surfaced as an invariant violation instead of being
//! resolved arbitrarily.

use std::cmp::Ordering;
use std::fmt;

use tracing::debug;

use crate::atom::Atom;
use crate::catalog::{Catalog, PackageInstance};
use crate::error::{Error, Result};
use crate::policy::OverrideConfig;
use crate::repos::Repositories;
use crate::useflags;
use crate::visibility::{self, Acceptance, RejectReason};

/// Why one candidate dropped out of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    RepositoryMismatch,
    VersionMismatch,
    SlotMismatch,
    UseDepMismatch,
    Masked,
    KeywordRejected,
    LicenseRejected,
    PropertyRejected,
}

impl From<RejectReason> for Reason {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::Masked => Reason::Masked,
            RejectReason::KeywordRejected => Reason::KeywordRejected,
            RejectReason::LicenseRejected => Reason::LicenseRejected,
            RejectReason::PropertyRejected => Reason::PropertyRejected,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::RepositoryMismatch => write!(f, "repository mismatch"),
            Reason::VersionMismatch => write!(f, "version mismatch"),
            Reason::SlotMismatch => write!(f, "slot mismatch"),
            Reason::UseDepMismatch => write!(f, "use requirement not met"),
            Reason::Masked => write!(f, "masked"),
            Reason::KeywordRejected => write!(f, "keyword rejected"),
            Reason::LicenseRejected => write!(f, "license rejected"),
            Reason::PropertyRejected => write!(f, "property rejected"),
        }
    }
}

/// One rejected candidate with its reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Display form of the rejected instance (`cat/name-ver::repo`).
    pub instance: String,
    pub reason: Reason,
}

/// Aggregated diagnostics for a failed selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionFailure {
    /// Display form of the query atom.
    pub atom: String,
    /// Every candidate that was considered and rejected.
    pub rejections: Vec<Rejection>,
}

impl fmt::Display for SelectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no matching instance for '{}'", self.atom)?;
        if !self.rejections.is_empty() {
            write!(f, " (")?;
            for (i, rejection) in self.rejections.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", rejection.instance, rejection.reason)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Select the single best instance for an atom, or fail with the
/// aggregated per-candidate rejection reasons.
pub fn select<'a>(
    atom: &Atom,
    catalog: &'a Catalog,
    repos: &Repositories,
    policy: &OverrideConfig,
) -> Result<&'a PackageInstance> {
    let mut rejections = Vec::new();
    let mut survivors: Vec<&PackageInstance> = Vec::new();

    for instance in catalog.candidates_for(&atom.id) {
        let reason = if !atom.matches_repository(&instance.repository) {
            Some(Reason::RepositoryMismatch)
        } else if !atom.matches_version(&instance.version) {
            Some(Reason::VersionMismatch)
        } else if !atom.matches_slot(&instance.slot) {
            Some(Reason::SlotMismatch)
        } else if !useflags::satisfies_use_deps(atom, instance, policy) {
            Some(Reason::UseDepMismatch)
        } else {
            match visibility::check(policy, instance) {
                Acceptance::Accepted => None,
                Acceptance::Rejected(reason) => Some(reason.into()),
            }
        };

        match reason {
            Some(reason) => rejections.push(Rejection {
                instance: instance.to_string(),
                reason,
            }),
            None => survivors.push(instance),
        }
    }

    let mut best = match survivors.first() {
        Some(first) => *first,
        None => {
            return Err(Error::NoMatchingInstance(SelectionFailure {
                atom: atom.to_string(),
                rejections,
            }));
        }
    };
    for candidate in &survivors[1..] {
        if selection_key_cmp(candidate, best, repos) == Ordering::Greater {
            best = *candidate;
        }
    }

    let tied = survivors
        .iter()
        .filter(|candidate| selection_key_cmp(candidate, best, repos) == Ordering::Equal)
        .count();
    if tied > 1 {
        return Err(Error::InternalInvariantViolation(format!(
            "{} candidates tie on (version, repository priority) for '{}'",
            tied, atom
        )));
    }

    debug!(atom = %atom, selected = %best, "selected instance");
    Ok(best)
}

fn selection_key_cmp(
    a: &PackageInstance,
    b: &PackageInstance,
    repos: &Repositories,
) -> Ordering {
    a.version.cmp(&b.version).then_with(|| {
        repos
            .priority_of(&a.repository)
            .cmp(&repos.priority_of(&b.repository))
    })
}
