//! Effective USE state
//!
//! Computes the boolean state of each declared USE flag for one
//! instance: IUSE defaults folded with the matching `use` override
//! rules in declaration order. Because rules are scoped by atom
//! matching, a repository-qualified rule changes the state only for
//! instances of that repository - the same package name resolved from
//! different repositories can carry different states for the same flag.

use std::collections::HashSet;

use crate::atom::Atom;
use crate::catalog::PackageInstance;
use crate::policy::OverrideConfig;

/// The set of enabled flags for an instance under the given policy.
pub fn effective_use(policy: &OverrideConfig, instance: &PackageInstance) -> HashSet<String> {
    let mut enabled = HashSet::new();
    for declared in &instance.iuse {
        if let Some(flag) = declared.strip_prefix('+') {
            enabled.insert(flag.to_string());
        }
    }

    for rule in policy.use_rules() {
        if !rule.atom.matches(instance) {
            continue;
        }
        for token in &rule.tokens {
            match token.strip_prefix('-') {
                Some(flag) => {
                    enabled.remove(flag);
                }
                None => {
                    enabled.insert(token.clone());
                }
            }
        }
    }

    enabled
}

/// Whether an instance satisfies the USE requirements of an atom.
///
/// Each requirement needs the flag declared in IUSE with an effective
/// state equal to the required polarity; an undeclared flag fails the
/// requirement for either polarity.
pub fn satisfies_use_deps(
    atom: &Atom,
    instance: &PackageInstance,
    policy: &OverrideConfig,
) -> bool {
    if atom.use_deps.is_empty() {
        return true;
    }

    let declared: HashSet<&str> = instance
        .iuse
        .iter()
        .map(|flag| flag.trim_start_matches(['+', '-']))
        .collect();
    let enabled = effective_use(policy, instance);

    atom.use_deps.iter().all(|dep| {
        declared.contains(dep.flag.as_str()) && enabled.contains(&dep.flag) == dep.enabled
    })
}
