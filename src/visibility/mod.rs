//! Visibility and acceptance evaluation
//!
//! Decides, per instance, whether it may be offered to the selector.
//! Four independent vetoes are checked in order: mask state, keyword
//! acceptance, license acceptance, and property acceptance. Any single
//! veto rejects the instance with a reason.

use std::fmt;

use crate::catalog::PackageInstance;
use crate::policy::{MaskAction, OverrideConfig};

/// Why an instance was rejected by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Masked,
    KeywordRejected,
    LicenseRejected,
    PropertyRejected,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Masked => write!(f, "masked"),
            RejectReason::KeywordRejected => write!(f, "keyword rejected"),
            RejectReason::LicenseRejected => write!(f, "license rejected"),
            RejectReason::PropertyRejected => write!(f, "property rejected"),
        }
    }
}

/// Result of evaluating one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Accepted,
    Rejected(RejectReason),
}

/// Evaluate all vetoes for one instance.
pub fn check(policy: &OverrideConfig, instance: &PackageInstance) -> Acceptance {
    if is_masked(policy, instance) {
        return Acceptance::Rejected(RejectReason::Masked);
    }
    if !keywords_accepted(policy, instance) {
        return Acceptance::Rejected(RejectReason::KeywordRejected);
    }
    if !license_accepted(policy, instance) {
        return Acceptance::Rejected(RejectReason::LicenseRejected);
    }
    if !properties_accepted(policy, instance) {
        return Acceptance::Rejected(RejectReason::PropertyRejected);
    }
    Acceptance::Accepted
}

/// Fold the mask state for one instance.
///
/// Profile masks form the baseline; the user mask/unmask sequence is
/// then applied in declaration order and the last matching entry wins.
/// A repository-scoped unmask therefore clears a broader mask only for
/// instances of that repository, leaving the rest masked.
pub fn is_masked(policy: &OverrideConfig, instance: &PackageInstance) -> bool {
    let mut masked = policy
        .profile_masks()
        .iter()
        .any(|atom| atom.matches(instance));

    for rule in policy.mask_rules() {
        if rule.atom.matches(instance) {
            masked = rule.action == MaskAction::Mask;
        }
    }

    masked
}

/// Keyword acceptance: the baseline token set must accept one of the
/// instance's declared keywords, or a matching keywords rule must
/// explicitly accept one of them.
pub fn keywords_accepted(policy: &OverrideConfig, instance: &PackageInstance) -> bool {
    for token in policy.accept_keywords() {
        if keyword_token_accepts(token, &instance.keywords) {
            return true;
        }
    }

    for rule in policy.keyword_rules() {
        if !rule.atom.matches(instance) {
            continue;
        }
        for token in &rule.tokens {
            if keyword_token_accepts(token, &instance.keywords) {
                return true;
            }
        }
    }

    false
}

/// Whether an accepted-keyword token covers any declared keyword.
///
/// `**` accepts anything, `*` any stable keyword, `~*` any testing
/// keyword; `~arch` also accepts a stable `arch` keyword.
fn keyword_token_accepts(token: &str, declared: &[String]) -> bool {
    match token {
        "**" => true,
        "*" => declared
            .iter()
            .any(|k| !k.starts_with('~') && !k.starts_with('-')),
        "~*" => declared.iter().any(|k| k.starts_with('~')),
        _ => match token.strip_prefix('~') {
            Some(arch) => declared.iter().any(|k| k == token || k == arch),
            None => declared.iter().any(|k| k == token),
        },
    }
}

/// License acceptance: every token of the instance's license expression
/// must survive the effective accepted-license set (baseline plus the
/// payloads of matching license rules).
pub fn license_accepted(policy: &OverrideConfig, instance: &PackageInstance) -> bool {
    let mut accepted: Vec<&str> = policy
        .accept_licenses()
        .iter()
        .map(String::as_str)
        .collect();
    for rule in policy.license_rules() {
        if rule.atom.matches(instance) {
            accepted.extend(rule.tokens.iter().map(String::as_str));
        }
    }

    instance
        .license
        .split_whitespace()
        .all(|token| token_allowed(token, &accepted))
}

/// Property acceptance: every declared property must survive the
/// effective accepted-property set. A scoped `-property` rule removes
/// the token for that repository's instances only.
pub fn properties_accepted(policy: &OverrideConfig, instance: &PackageInstance) -> bool {
    let mut accepted: Vec<&str> = policy
        .accept_properties()
        .iter()
        .map(String::as_str)
        .collect();
    for rule in policy.property_rules() {
        if rule.atom.matches(instance) {
            accepted.extend(rule.tokens.iter().map(String::as_str));
        }
    }

    instance
        .properties
        .iter()
        .all(|property| token_allowed(property, &accepted))
}

/// Last-wins scan over an accepted-token list with `*` wildcard and `-`
/// negation.
fn token_allowed(token: &str, accepted: &[&str]) -> bool {
    let mut allowed = false;
    for entry in accepted {
        if let Some(negated) = entry.strip_prefix('-') {
            if negated == "*" || negated == token {
                allowed = false;
            }
        } else if *entry == "*" || *entry == token {
            allowed = true;
        }
    }
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::catalog::PackageInstance;

    fn stable(spec: &str) -> PackageInstance {
        PackageInstance::parse(spec, "test-repo")
            .unwrap()
            .with_keywords(&["x86"])
    }

    #[test]
    fn test_token_allowed() {
        assert!(token_allowed("MIT", &["*"]));
        assert!(token_allowed("MIT", &["MIT"]));
        assert!(!token_allowed("MIT", &[]));
        assert!(!token_allowed("bar", &["*", "-bar"]));
        assert!(token_allowed("bar", &["-bar", "*"]));
        assert!(!token_allowed("MIT", &["*", "-*"]));
    }

    #[test]
    fn test_last_matching_mask_rule_wins() {
        let mut policy = OverrideConfig::new("x86");
        policy.add_mask(Atom::parse("dev-libs/G").unwrap());
        policy.add_unmask(Atom::parse("dev-libs/G::test-repo").unwrap());

        assert!(!is_masked(&policy, &stable("dev-libs/G-1")));
        assert!(is_masked(&policy, &stable("dev-libs/G-1::repo1")));
    }

    #[test]
    fn test_profile_mask_user_unmask() {
        let mut policy = OverrideConfig::new("x86");
        policy.add_profile_mask(Atom::parse("dev-libs/P").unwrap());
        assert!(is_masked(&policy, &stable("dev-libs/P-1")));

        policy.add_unmask(Atom::parse("dev-libs/P").unwrap());
        assert!(!is_masked(&policy, &stable("dev-libs/P-1")));
    }

    #[test]
    fn test_testing_keywords_need_a_rule() {
        let mut policy = OverrideConfig::new("x86");
        let testing = PackageInstance::parse("dev-libs/C-1", "test-repo")
            .unwrap()
            .with_keywords(&["~x86"]);
        assert!(!keywords_accepted(&policy, &testing));

        policy.add_keywords_line("=dev-libs/C-1::test-repo").unwrap();
        assert!(keywords_accepted(&policy, &testing));

        // The rule is scoped; the same package from elsewhere stays out.
        let elsewhere = PackageInstance::parse("dev-libs/C-1::repo1", "test-repo")
            .unwrap()
            .with_keywords(&["~x86"]);
        assert!(!keywords_accepted(&policy, &elsewhere));
    }

    #[test]
    fn test_license_rule_scoped() {
        let mut policy = OverrideConfig::new("x86");
        policy.set_accept_licenses(vec![]);
        policy
            .add_license_line("=dev-libs/D-1::test-repo TEST")
            .unwrap();

        let accepted = stable("dev-libs/D-1").with_license("TEST");
        let rejected = stable("dev-libs/D-1::repo1").with_license("TEST");
        assert!(license_accepted(&policy, &accepted));
        assert!(!license_accepted(&policy, &rejected));
    }

    #[test]
    fn test_property_negation_scoped() {
        let mut policy = OverrideConfig::new("x86");
        policy.add_properties_line("dev-libs/F::repo1 -bar").unwrap();

        let in_default = stable("dev-libs/F-1").with_properties(&["bar"]);
        let in_repo1 = stable("dev-libs/F-1::repo1").with_properties(&["bar"]);
        assert!(properties_accepted(&policy, &in_default));
        assert!(!properties_accepted(&policy, &in_repo1));
    }

    #[test]
    fn test_check_order() {
        let mut policy = OverrideConfig::new("x86");
        policy.set_accept_licenses(vec![]);
        policy.add_mask(Atom::parse("dev-libs/X").unwrap());

        // Masked instance reports the mask even though its license
        // would also be rejected.
        let inst = stable("dev-libs/X-1").with_license("TEST");
        assert_eq!(
            check(&policy, &inst),
            Acceptance::Rejected(RejectReason::Masked)
        );
    }
}
