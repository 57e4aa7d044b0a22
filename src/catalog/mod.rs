//! Package instance catalog
//!
//! Holds every known package instance together with its declared
//! metadata and origin repository, indexed by package identity. The
//! catalog is built once during load and read-only afterwards; on
//! external change the caller builds a fresh snapshot instead of
//! mutating in place.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use tracing::warn;

use crate::atom::{split_name_version, Atom, PackageId, Slot};
use crate::error::{Error, Result};
use crate::version::Version;

/// One concrete package instance in one repository
///
/// Identity is `(id, version, repository)`; the same package and version
/// may appear in several repositories as distinct instances.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct PackageInstance {
    pub id: PackageId,
    pub version: Version,
    /// Name of the origin repository.
    pub repository: String,
    pub slot: Slot,
    /// Declared stability keywords (e.g. `x86`, `~x86`).
    pub keywords: Vec<String>,
    /// Whitespace-separated license tokens; all must be accepted.
    pub license: String,
    /// Declared properties (e.g. `interactive`, `live`).
    pub properties: Vec<String>,
    /// Declared USE flags; a `+` prefix marks a default-enabled flag.
    pub iuse: Vec<String>,
    /// Dependency atoms declared by this instance.
    pub dependencies: Vec<Atom>,
}

impl PackageInstance {
    pub fn new(id: PackageId, version: Version, repository: impl Into<String>) -> Self {
        Self {
            id,
            version,
            repository: repository.into(),
            slot: Slot::new("0"),
            keywords: Vec::new(),
            license: String::new(),
            properties: Vec::new(),
            iuse: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Parse `category/name-version` with an optional `::repo` suffix;
    /// an unqualified spec lands in `default_repo`.
    pub fn parse(spec: &str, default_repo: &str) -> Result<Self> {
        let err = || Error::MalformedAtom(spec.to_string());

        let (cpv, repo) = match spec.rfind("::") {
            Some(idx) => (&spec[..idx], Some(&spec[idx + 2..])),
            None => (spec, None),
        };
        let (category, name_version) = cpv.split_once('/').ok_or_else(&err)?;
        let (name, version) = split_name_version(name_version).ok_or_else(&err)?;
        if category.is_empty() || name.is_empty() {
            return Err(err());
        }
        Ok(Self::new(
            PackageId::new(category, name),
            Version::parse(version)?,
            repo.unwrap_or(default_repo),
        ))
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    pub fn with_properties(mut self, properties: &[&str]) -> Self {
        self.properties = properties.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_iuse(mut self, iuse: &[&str]) -> Self {
        self.iuse = iuse.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Atom>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// `category/name-version` without the repository qualifier.
    pub fn cpv(&self) -> String {
        format!("{}-{}", self.id, self.version)
    }
}

impl fmt::Display for PackageInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}::{}", self.id, self.version, self.repository)
    }
}

/// Candidate index over all known package instances
///
/// Append-only: instances are added during catalog construction and
/// never removed or mutated. Lookup order is irrelevant; the selector
/// re-orders candidates itself.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    instances: HashMap<PackageId, Vec<PackageInstance>>,
    count: usize,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance to the index.
    pub fn add(&mut self, instance: PackageInstance) {
        self.instances
            .entry(instance.id.clone())
            .or_default()
            .push(instance);
        self.count += 1;
    }

    /// All instances of a package identity, in no particular order.
    pub fn candidates_for(&self, id: &PackageId) -> &[PackageInstance] {
        self.instances.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Load a catalog from a JSON snapshot: an array of instance
    /// records. Records that fail to parse are skipped with a warning
    /// so one bad entry does not poison the snapshot.
    pub fn from_json(data: &str, default_repo: &str) -> Result<Self> {
        let records: Vec<InstanceRecord> =
            serde_json::from_str(data).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        let mut catalog = Catalog::new();
        for record in records {
            match record.into_instance(default_repo) {
                Ok(instance) => catalog.add(instance),
                Err(e) => {
                    warn!("skipping invalid catalog record: {}", e);
                }
            }
        }
        Ok(catalog)
    }
}

/// On-disk shape of one catalog snapshot entry
#[derive(Debug, Deserialize)]
struct InstanceRecord {
    category: String,
    name: String,
    version: String,
    #[serde(default)]
    repository: Option<String>,
    #[serde(default = "default_slot")]
    slot: String,
    #[serde(default)]
    subslot: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    license: String,
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default)]
    iuse: Vec<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

fn default_slot() -> String {
    "0".to_string()
}

impl InstanceRecord {
    fn into_instance(self, default_repo: &str) -> Result<PackageInstance> {
        let slot = match self.subslot {
            Some(subslot) => Slot::with_subslot(self.slot, subslot),
            None => Slot::new(self.slot),
        };
        let mut dependencies = Vec::with_capacity(self.dependencies.len());
        for dep in &self.dependencies {
            dependencies.push(Atom::parse(dep)?);
        }
        Ok(PackageInstance {
            id: PackageId::new(self.category, self.name),
            version: Version::parse(&self.version)?,
            repository: self.repository.unwrap_or_else(|| default_repo.to_string()),
            slot,
            keywords: self.keywords,
            license: self.license,
            properties: self.properties,
            iuse: self.iuse,
            dependencies,
        })
    }
}
