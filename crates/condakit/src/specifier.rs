//! Package specifier normalization.
//!
//! A specifier is a package name optionally qualified with a channel
//! prefix and a version or build constraint, e.g. `flask=1.0`,
//! `numpy>=1.20` or `conda-forge::python=3.11`.

use std::collections::HashSet;

/// Characters that end the name part of a specifier.
const NAME_TERMINATORS: &[char] = &['=', '<', '>', '!', '~', '[', ' ', '\t'];

/// Reduce a specifier to its bare, lowercase package name.
pub fn bare_name(spec: &str) -> String {
    let spec = spec.rsplit_once("::").map_or(spec, |(_, rest)| rest);
    let end = spec.find(NAME_TERMINATORS).unwrap_or(spec.len());
    spec[..end].trim().to_lowercase()
}

/// Bare names of the requested packages that are actually installed.
///
/// Both sides are normalized before comparing. The result keeps request
/// order and contains each name once.
pub fn removal_set<S: AsRef<str>>(requested: &[S], installed: &[String]) -> Vec<String> {
    let installed: HashSet<String> = installed.iter().map(|n| bare_name(n)).collect();
    let mut seen = HashSet::new();

    requested
        .iter()
        .map(|s| bare_name(s.as_ref()))
        .filter(|name| installed.contains(name) && seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name() {
        assert_eq!(bare_name("foo"), "foo");
        assert_eq!(bare_name("Python"), "python");
        assert_eq!(bare_name("flask=1.0"), "flask");
        assert_eq!(bare_name("flask==1.0=py_0"), "flask");
        assert_eq!(bare_name("numpy>=1.20,<2"), "numpy");
        assert_eq!(bare_name("scipy 1.11"), "scipy");
        assert_eq!(bare_name("conda-forge::Flask>=1"), "flask");
        assert_eq!(bare_name("pytorch[build=cuda*]"), "pytorch");
    }

    #[test]
    fn test_removal_set_nothing_installed() {
        let installed = vec!["flask".to_string(), "bar".to_string()];
        assert!(removal_set(&["foo", "Python"], &installed).is_empty());
    }

    #[test]
    fn test_removal_set_normalizes_request() {
        let installed = vec!["python".to_string(), "bar".to_string()];
        assert_eq!(removal_set(&["foo", "Python"], &installed), vec!["python"]);
    }

    #[test]
    fn test_removal_set_dedupes_and_keeps_order() {
        let installed = vec!["bar".to_string(), "flask".to_string()];
        assert_eq!(
            removal_set(&["Flask=1.0", "bar", "flask"], &installed),
            vec!["flask", "bar"]
        );
    }
}
