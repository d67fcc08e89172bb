//! Unique test data generators.
//!
//! Integration tests may share one store across runs, so anything that hits
//! a uniqueness constraint (usernames) gets a ULID suffix.

use ulid::Ulid;

/// Generate a unique string in the format `{prefix}-{ulid}`.
///
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let a = unique_str("user");
/// let b = unique_str("user");
/// assert_ne!(a, b);
/// assert!(a.starts_with("user-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Generate a username that will not collide with any earlier test run.
pub fn unique_username(prefix: &str) -> String {
    unique_str(prefix).to_lowercase()
}

/// Generate a unique email address in the format `{prefix}-{ulid}@example.test`.
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.test", prefix, Ulid::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_lowercase_and_distinct() {
        let a = unique_username("Alice");
        let b = unique_username("Alice");
        assert_ne!(a, b);
        assert!(a.starts_with("alice-"));
        assert_eq!(a, a.to_lowercase());
    }

    #[test]
    fn emails_use_reserved_test_domain() {
        assert!(unique_email("bob").ends_with("@example.test"));
    }
}
