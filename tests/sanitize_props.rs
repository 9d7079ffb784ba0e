use proptest::prelude::*;
use sfserve::error::Rejection;
use sfserve::http::sanitize;
use sfserve::http::sanitize::contains_traversal;

const SAFE: &str = "[a-zA-Z0-9/._%-]{0,40}";

proptest! {
    #[test]
    fn traversal_is_always_rejected(
        prefix in SAFE,
        marker in prop::sample::select(vec!["../", "/..", "/../"]),
        suffix in SAFE,
    ) {
        let raw = format!("{prefix}{marker}{suffix}");
        prop_assert_eq!(sanitize(&raw), Err(Rejection::Traversal));
    }

    #[test]
    fn whitelisted_paths_pass_collapsed(raw in SAFE.prop_filter("no traversal", |s| !contains_traversal(s))) {
        let path = sanitize(&raw).unwrap();
        prop_assert!(!path.as_str().contains("//"));
        prop_assert!(path.as_str().len() <= raw.len());
        // a second pass changes nothing
        prop_assert_eq!(sanitize(path.as_str()).unwrap(), path);
    }

    #[test]
    fn query_and_fragment_never_matter(
        path in SAFE.prop_filter("no traversal", |s| !contains_traversal(s)),
        sep in prop::sample::select(vec!['?', '#']),
        tail in ".{0,20}",
    ) {
        let raw = format!("{path}{sep}{tail}");
        prop_assert_eq!(sanitize(&raw).unwrap(), sanitize(&path).unwrap());
    }

    #[test]
    fn foreign_characters_are_rejected(
        prefix in "[a-z/]{0,10}",
        bad in prop::sample::select(vec![' ', '<', '>', '"', '\'', '\\', '|', '*', ':', '~', '!', 'é']),
        suffix in "[a-z/]{0,10}",
    ) {
        let raw = format!("{prefix}{bad}{suffix}");
        prop_assert_eq!(sanitize(&raw), Err(Rejection::InvalidCharacter(bad)));
    }
}
