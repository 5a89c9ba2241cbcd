//! Version string normalization and ordering

use std::cmp::Ordering;

use semver::Version;

/// Strips a single leading `v` from a release tag or requested version.
pub fn normalize_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros.
/// Does NOT strip 'v' prefix (use `normalize_version` first if needed).
pub fn parse_version(version: &str) -> Option<Version> {
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Orders two normalized versions semantically.
///
/// Valid semver sorts above anything unparsable; two unparsable
/// versions compare lexically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Sorts items newest first by the version returned from `key`.
pub fn sort_newest_first<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| compare_versions(key(b), key(a)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("v1.2.0", "1.2.0")]
    #[case("1.2.0", "1.2.0")]
    #[case("vv1.0.0", "v1.0.0")]
    #[case("", "")]
    fn normalize_version_strips_exactly_one_leading_v(
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(normalize_version(input), expected);
    }

    #[rstest]
    #[case("1.10.0", "1.9.0", Ordering::Greater)]
    #[case("2.0.0-rc1", "2.0.0", Ordering::Less)]
    #[case("1.2", "1.2.0", Ordering::Equal)]
    #[case("1.0.0", "nightly", Ordering::Greater)]
    #[case("alpha", "beta", Ordering::Less)]
    fn compare_versions_returns_expected(
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_versions(a, b), expected);
    }

    #[test]
    fn sort_newest_first_orders_semantically() {
        let mut versions = vec!["1.9.0", "1.10.0", "0.1.0", "1.10.0-beta"];
        sort_newest_first(&mut versions, |v| v);
        assert_eq!(versions, vec!["1.10.0", "1.10.0-beta", "1.9.0", "0.1.0"]);
    }
}
