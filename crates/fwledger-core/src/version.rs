//! Firmware version ordering.

use std::cmp::Ordering;

/// Returns true iff `v1` is strictly greater than `v2`.
///
/// Versions are dot-separated integer components compared left to right.
/// Missing trailing components count as zero, so `"1.2"` equals `"1.2.0"`.
/// A component that is not a number counts as zero as well.
#[must_use]
pub fn is_version_greater(v1: &str, v2: &str) -> bool {
    compare_versions(v1, v2) == Ordering::Greater
}

fn compare_versions(v1: &str, v2: &str) -> Ordering {
    let a = components(v1);
    let b = components(v2);

    for i in 0..a.len().max(b.len()) {
        let left = a.get(i).copied().unwrap_or(0);
        let right = b.get(i).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}

fn components(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greater_minor_beats_patch() {
        assert!(is_version_greater("1.2.0", "1.1.9"));
        assert!(!is_version_greater("1.1.9", "1.2.0"));
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert!(!is_version_greater("1.2", "1.2.0"));
        assert!(!is_version_greater("1.2.0", "1.2"));
        assert!(is_version_greater("1.2.0.1", "1.2"));
    }

    #[test]
    fn test_shorter_major_wins() {
        assert!(is_version_greater("2", "1.9.9"));
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert!(is_version_greater("1.10.0", "1.9.0"));
        assert!(!is_version_greater("1.9.0", "1.10.0"));
    }

    #[test]
    fn test_equal_is_not_greater() {
        assert!(!is_version_greater("3.0.1", "3.0.1"));
    }

    #[test]
    fn test_non_numeric_component_counts_as_zero() {
        assert!(!is_version_greater("1.x", "1.0"));
        assert!(is_version_greater("1.1", "1.beta"));
    }
}
