//! Repository-scoped override rules: use, keywords, license, mask,
//! unmask, properties

use assert_matches::assert_matches;
use portsel::{
    Catalog, Error, OverrideConfig, PackageInstance, Reason, Repositories, Resolver, SetRegistry,
};
use pretty_assertions::assert_eq;

const DEFAULT_REPO: &str = "test-repo";

fn ebuild(spec: &str) -> PackageInstance {
    PackageInstance::parse(spec, DEFAULT_REPO)
        .unwrap()
        .with_keywords(&["x86"])
}

fn repositories() -> Repositories {
    let mut repos = Repositories::new(DEFAULT_REPO);
    repos.add("repo1", 1);
    repos.add("repo2", 2);
    repos
}

fn resolver(instances: Vec<PackageInstance>, policy: OverrideConfig) -> Resolver {
    let mut catalog = Catalog::new();
    for instance in instances {
        catalog.add(instance);
    }
    Resolver::new(catalog, repositories(), policy, SetRegistry::new())
}

fn selected(resolver: &Resolver, spec: &str) -> String {
    resolver.select_str(spec).unwrap().to_string()
}

mod use_rule_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// `dev-libs/A` in three repositories; only the repo1 instance has
    /// `foo` forced on, via a repository-scoped rule.
    fn fixture() -> Resolver {
        let mut policy = OverrideConfig::new("x86");
        policy.add_use_line("dev-libs/A::repo1 foo").unwrap();

        resolver(
            vec![
                ebuild("dev-libs/A-1").with_iuse(&["foo"]),
                ebuild("dev-libs/A-2::repo1").with_iuse(&["foo"]),
                ebuild("dev-libs/A-3::repo2"),
            ],
            policy,
        )
    }

    #[test]
    fn test_plain_dependency_takes_highest_version() {
        let resolver = fixture();
        let provider = resolver.select_str("dev-libs/A").unwrap();
        assert_eq!(provider.to_string(), "dev-libs/A-3::repo2");
    }

    #[test]
    fn test_use_dep_picks_the_forced_repo() {
        // Only the repo1 instance has foo enabled, so the otherwise
        // higher-ranked A-3 loses.
        let resolver = fixture();
        let provider = resolver.select_str("dev-libs/A[foo]").unwrap();
        assert_eq!(provider.to_string(), "dev-libs/A-2::repo1");
    }

    #[test]
    fn test_negative_use_dep_requires_declared_flag() {
        // A-3 does not declare foo at all, which fails [-foo] just like
        // [foo]; A-1 declares it default-off and wins.
        let resolver = fixture();
        let provider = resolver.select_str("dev-libs/A[-foo]").unwrap();
        assert_eq!(provider.to_string(), "dev-libs/A-1::test-repo");
    }

    #[test]
    fn test_providers_follow_declared_dependencies() {
        let depender = ebuild("dev-libs/B-2")
            .with_dependencies(vec!["dev-libs/A[foo]".parse().unwrap()]);
        let resolver = fixture();

        let dep = depender.dependencies[0].clone();
        let provider = resolver.select(&dep).unwrap();
        assert_eq!(provider.to_string(), "dev-libs/A-2::repo1");
    }
}

mod keyword_rule_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scoped_keyword_rule_leaves_other_repos_unstable() {
        let mut policy = OverrideConfig::new("x86");
        policy.add_keywords_line("=dev-libs/C-1::test-repo").unwrap();

        let resolver = resolver(
            vec![
                PackageInstance::parse("dev-libs/C-1", DEFAULT_REPO)
                    .unwrap()
                    .with_keywords(&["~x86"]),
                PackageInstance::parse("dev-libs/C-1::repo1", DEFAULT_REPO)
                    .unwrap()
                    .with_keywords(&["~x86"]),
            ],
            policy,
        );

        // repo1 would win the tie-break, but only the default-repo
        // instance is keyword-accepted.
        assert_eq!(selected(&resolver, "dev-libs/C"), "dev-libs/C-1::test-repo");
    }

    #[test]
    fn test_without_rule_testing_keywords_reject() {
        let resolver = resolver(
            vec![PackageInstance::parse("dev-libs/C-1", DEFAULT_REPO)
                .unwrap()
                .with_keywords(&["~x86"])],
            OverrideConfig::new("x86"),
        );

        let err = resolver.select_str("dev-libs/C").unwrap_err();
        assert_matches!(err, Error::NoMatchingInstance(failure) => {
            assert_eq!(failure.rejections[0].reason, Reason::KeywordRejected);
        });
    }
}

mod license_rule_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scoped_license_rule() {
        let mut policy = OverrideConfig::new("x86");
        policy.set_accept_licenses(vec!["*".to_string(), "-TEST".to_string()]);
        policy
            .add_license_line("=dev-libs/D-1::test-repo TEST")
            .unwrap();

        let resolver = resolver(
            vec![
                ebuild("dev-libs/D-1").with_license("TEST"),
                ebuild("dev-libs/D-1::repo1").with_license("TEST"),
            ],
            policy,
        );

        assert_eq!(selected(&resolver, "dev-libs/D"), "dev-libs/D-1::test-repo");
    }

    #[test]
    fn test_unaccepted_license_rejects_everywhere() {
        let mut policy = OverrideConfig::new("x86");
        policy.set_accept_licenses(vec!["*".to_string(), "-TEST".to_string()]);

        let resolver = resolver(
            vec![
                ebuild("dev-libs/D-1").with_license("TEST"),
                ebuild("dev-libs/D-1::repo1").with_license("TEST"),
            ],
            policy,
        );

        let err = resolver.select_str("dev-libs/D").unwrap_err();
        assert_matches!(err, Error::NoMatchingInstance(failure) => {
            assert!(failure
                .rejections
                .iter()
                .all(|r| r.reason == Reason::LicenseRejected));
        });
    }
}

mod mask_rule_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scoped_mask_prefers_other_repo() {
        let mut policy = OverrideConfig::new("x86");
        policy.add_mask_line("dev-libs/E::repo1").unwrap();

        let resolver = resolver(
            vec![ebuild("dev-libs/E-1"), ebuild("dev-libs/E-1::repo1")],
            policy,
        );
        assert_eq!(selected(&resolver, "dev-libs/E"), "dev-libs/E-1::test-repo");
    }

    #[test]
    fn test_unscoped_mask_rejects_everything() {
        let mut policy = OverrideConfig::new("x86");
        policy.add_mask_line("dev-libs/H").unwrap();

        let resolver = resolver(
            vec![ebuild("dev-libs/H-1"), ebuild("dev-libs/H-1::repo1")],
            policy,
        );

        let err = resolver.select_str("dev-libs/H").unwrap_err();
        assert_matches!(err, Error::NoMatchingInstance(failure) => {
            assert_eq!(failure.rejections.len(), 2);
            assert!(failure.rejections.iter().all(|r| r.reason == Reason::Masked));
        });
    }

    #[test]
    fn test_scoped_unmask_narrows_a_broad_mask() {
        let mut policy = OverrideConfig::new("x86");
        policy.add_mask_line("dev-libs/G").unwrap();
        policy.add_unmask_line("dev-libs/G::test-repo").unwrap();

        let resolver = resolver(
            vec![ebuild("dev-libs/G-1"), ebuild("dev-libs/G-1::repo1")],
            policy,
        );

        // Only the default-repo instance is unmasked; repo1 stays
        // behind the broad mask.
        assert_eq!(selected(&resolver, "dev-libs/G"), "dev-libs/G-1::test-repo");
        let err = resolver.select_str("dev-libs/G::repo1").unwrap_err();
        assert_matches!(err, Error::NoMatchingInstance(failure) => {
            assert!(failure.rejections.iter().any(|r| r.reason == Reason::Masked));
        });
    }

    #[test]
    fn test_unmask_for_other_repo_does_not_leak() {
        let mut policy = OverrideConfig::new("x86");
        policy.add_mask_line("dev-libs/G").unwrap();
        policy.add_unmask_line("dev-libs/G::repo1").unwrap();

        let resolver = resolver(
            vec![ebuild("dev-libs/G-1"), ebuild("dev-libs/G-1::repo1")],
            policy,
        );

        assert_eq!(selected(&resolver, "dev-libs/G"), "dev-libs/G-1::repo1");
        assert_matches!(
            resolver.select_str("dev-libs/G::test-repo"),
            Err(Error::NoMatchingInstance(_))
        );
    }
}

mod property_rule_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scoped_property_negation() {
        let mut policy = OverrideConfig::new("x86");
        policy.add_properties_line("dev-libs/F::repo1 -bar").unwrap();

        let resolver = resolver(
            vec![
                ebuild("dev-libs/F-1").with_properties(&["bar"]),
                ebuild("dev-libs/F-1::repo1").with_properties(&["bar"]),
            ],
            policy,
        );

        // The repo1 instance loses its property acceptance; the
        // default-repo instance keeps the baseline and wins.
        assert_eq!(selected(&resolver, "dev-libs/F"), "dev-libs/F-1::test-repo");
    }

    #[test]
    fn test_property_rejection_reason() {
        let mut policy = OverrideConfig::new("x86");
        policy.set_accept_properties(vec![]);

        let resolver = resolver(
            vec![ebuild("dev-libs/F-1").with_properties(&["interactive"])],
            policy,
        );

        let err = resolver.select_str("dev-libs/F").unwrap_err();
        assert_matches!(err, Error::NoMatchingInstance(failure) => {
            assert_eq!(failure.rejections[0].reason, Reason::PropertyRejected);
        });
    }
}

mod profile_mask_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile_mask_unioned_with_user_rules() {
        let mut policy = OverrideConfig::new("x86");
        policy.add_profile_mask("dev-libs/E".parse().unwrap());
        policy.add_unmask_line("dev-libs/E::repo1").unwrap();

        let resolver = resolver(
            vec![ebuild("dev-libs/E-1"), ebuild("dev-libs/E-1::repo1")],
            policy,
        );

        // The user unmask lifts the profile mask for repo1 only.
        assert_eq!(selected(&resolver, "dev-libs/E"), "dev-libs/E-1::repo1");
    }
}
