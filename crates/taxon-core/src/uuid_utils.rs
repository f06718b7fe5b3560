//! UUID v7 utilities for time-ordered identifiers.
//!
//! Every entity id in taxon is a UUIDv7, so ordering by id equals ordering
//! by creation time. Repositories rely on this for "creation order" lists.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use taxon_core::uuid_utils::new_v7;
///
/// let a = new_v7();
/// let b = new_v7();
/// assert!(b > a);
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v7_is_version_7() {
        let id = new_v7();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_v7_ordering() {
        let id1 = new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = new_v7();
        assert!(id2 > id1);
    }
}
