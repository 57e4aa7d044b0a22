//! portsel - multi-repository package atom resolver
//!
//! Given a query atom (package identity plus optional version, slot,
//! and repository constraints) and a universe of candidate package
//! instances spread across ranked repositories, `portsel` selects
//! exactly one correct instance, honoring repository priority, slot
//! semantics, and a stack of user override rules (masking,
//! keyword/license/property acceptance, USE forcing) that can
//! themselves be scoped to a single repository.
//!
//! # Architecture
//!
//! - **atom / version**: parsed specifiers and the version total order
//! - **catalog**: the immutable index of known package instances
//! - **repos**: the repository priority order used as a tie-break
//! - **policy**: the parsed override-rule store
//! - **useflags**: effective USE state per instance
//! - **visibility**: mask/keyword/license/property acceptance
//! - **resolver**: the selection algorithm itself
//! - **sets**: named, ordered atom sequences
//!
//! All inputs are built once and treated as read-only for the lifetime
//! of a resolution pass; a [`Resolver`] snapshot can be shared by
//! reference across threads, and configuration changes are handled by
//! building a new snapshot rather than mutating in place.
//!
//! ```
//! use portsel::{Catalog, OverrideConfig, PackageInstance, Repositories, Resolver, SetRegistry};
//!
//! let mut catalog = Catalog::new();
//! for spec in ["dev-libs/A-1", "dev-libs/A-1::repo1", "dev-libs/A-2::repo1"] {
//!     catalog.add(
//!         PackageInstance::parse(spec, "gentoo").unwrap().with_keywords(&["x86"]),
//!     );
//! }
//!
//! let mut repos = Repositories::new("gentoo");
//! repos.add("repo1", 1);
//!
//! let resolver = Resolver::new(catalog, repos, OverrideConfig::new("x86"), SetRegistry::new());
//! let best = resolver.select_str("dev-libs/A").unwrap();
//! assert_eq!(best.to_string(), "dev-libs/A-2::repo1");
//! ```

pub mod atom;
pub mod catalog;
pub mod error;
pub mod policy;
pub mod repos;
pub mod resolver;
pub mod sets;
pub mod useflags;
pub mod version;
pub mod visibility;

pub use atom::{Atom, PackageId, Slot, UseDep};
pub use catalog::{Catalog, PackageInstance};
pub use error::{Error, Result};
pub use policy::{MaskAction, MaskRule, OverrideConfig, OverrideRule};
pub use repos::{Repositories, Repository};
pub use resolver::{Reason, Rejection, SelectionFailure};
pub use sets::{PackageSet, SetRegistry};
pub use version::{Operator, Version};
pub use visibility::{Acceptance, RejectReason};

/// One immutable resolution snapshot
///
/// Bundles the catalog, repository order, override policy, and set
/// registry behind a `&self`-only API. Selection is a pure function of
/// the snapshot; concurrent callers may share one snapshot freely.
#[derive(Debug, Clone)]
pub struct Resolver {
    catalog: Catalog,
    repos: Repositories,
    policy: OverrideConfig,
    sets: SetRegistry,
}

impl Resolver {
    pub fn new(
        catalog: Catalog,
        repos: Repositories,
        policy: OverrideConfig,
        sets: SetRegistry,
    ) -> Self {
        Self {
            catalog,
            repos,
            policy,
            sets,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn repos(&self) -> &Repositories {
        &self.repos
    }

    pub fn policy(&self) -> &OverrideConfig {
        &self.policy
    }

    pub fn sets(&self) -> &SetRegistry {
        &self.sets
    }

    /// Select the single best instance for an atom.
    pub fn select(&self, atom: &Atom) -> Result<&PackageInstance> {
        resolver::select(atom, &self.catalog, &self.repos, &self.policy)
    }

    /// Parse a specifier and select the best instance for it.
    pub fn select_str(&self, spec: &str) -> Result<&PackageInstance> {
        self.select(&Atom::parse(spec)?)
    }

    /// Expand a named set into its member atoms.
    pub fn expand(&self, set_name: &str) -> Result<Vec<Atom>> {
        self.sets.expand(set_name)
    }

    /// Expand a named set and select an instance for each member atom
    /// in order.
    pub fn select_set(&self, set_name: &str) -> Result<Vec<&PackageInstance>> {
        self.expand(set_name)?
            .iter()
            .map(|atom| self.select(atom))
            .collect()
    }
}
