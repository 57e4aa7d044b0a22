//! Named package sets
//!
//! A set is a named, ordered sequence of atoms. Expansion returns the
//! member atoms verbatim - each one is then selected independently by
//! the caller; there is no recursive set resolution here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::atom::Atom;
use crate::error::{Error, Result};

/// One named set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSet {
    pub name: String,
    atoms: Vec<Atom>,
}

impl PackageSet {
    pub fn new(name: impl Into<String>, atoms: Vec<Atom>) -> Self {
        Self {
            name: name.into(),
            atoms,
        }
    }

    /// Parse a set file: one atom per line, `#` comments and blank
    /// lines skipped. Unparsable lines are dropped with a warning.
    pub fn parse(name: impl Into<String>, content: &str) -> Self {
        let mut atoms = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Atom::parse(line) {
                Ok(atom) => atoms.push(atom),
                Err(e) => warn!("skipping set entry '{}': {}", line, e),
            }
        }
        Self::new(name, atoms)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Registry of named sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetRegistry {
    sets: HashMap<String, PackageSet>,
}

impl SetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, set: PackageSet) {
        self.sets.insert(set.name.clone(), set);
    }

    /// Look up a set; a leading `@` on the name is tolerated.
    pub fn get(&self, name: &str) -> Option<&PackageSet> {
        self.sets.get(name.strip_prefix('@').unwrap_or(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sets.keys().map(String::as_str).collect()
    }

    /// Expand a set into its member atoms, preserving declaration
    /// order.
    pub fn expand(&self, name: &str) -> Result<Vec<Atom>> {
        self.get(name)
            .map(|set| set.atoms.to_vec())
            .ok_or_else(|| Error::UnknownSet(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_preserves_order() {
        let mut registry = SetRegistry::new();
        registry.register(PackageSet::new(
            "toolchain",
            vec![
                Atom::parse("sys-devel/gcc").unwrap(),
                Atom::parse("sys-devel/binutils").unwrap(),
                Atom::parse("sys-libs/glibc").unwrap(),
            ],
        ));

        let first = registry.expand("toolchain").unwrap();
        let second = registry.expand("@toolchain").unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].id.name, "gcc");
        assert_eq!(first[2].id.name, "glibc");
    }

    #[test]
    fn test_unknown_set() {
        let registry = SetRegistry::new();
        assert!(matches!(
            registry.expand("@nope"),
            Err(Error::UnknownSet(_))
        ));
    }

    #[test]
    fn test_parse_set_file() {
        let set = PackageSet::parse(
            "custom",
            "# my packages\napp-editors/vim\n\nnot an atom!!\ndev-vcs/git\n",
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.atoms()[0].id.name, "vim");
    }
}
