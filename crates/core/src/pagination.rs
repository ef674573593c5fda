//! Page-size clamping for response listings.

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Resolve a requested page size: absent means [`MAX_PAGE_SIZE`], anything
/// larger is clamped down to it, and the floor is one row.
pub fn page_size(requested: Option<i64>) -> i64 {
    match requested {
        None => MAX_PAGE_SIZE,
        Some(n) => n.clamp(1, MAX_PAGE_SIZE),
    }
}

/// Row offset for a 1-based page number. Pages below 1 are treated as page 1;
/// offsets past `i64::MAX` saturate (the page is simply empty).
pub fn page_offset(page: Option<i64>, page_size: i64) -> i64 {
    (page.unwrap_or(1).max(1) - 1).saturating_mul(page_size.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_page_size_defaults_to_max() {
        assert_eq!(page_size(None), 50);
    }

    #[test]
    fn small_page_size_passes_through() {
        assert_eq!(page_size(Some(10)), 10);
    }

    #[test]
    fn large_page_size_is_clamped() {
        assert_eq!(page_size(Some(51)), 50);
        assert_eq!(page_size(Some(999)), 50);
    }

    #[test]
    fn non_positive_page_size_floors_at_one() {
        assert_eq!(page_size(Some(0)), 1);
        assert_eq!(page_size(Some(-3)), 1);
    }

    #[test]
    fn offset_for_first_page_is_zero() {
        assert_eq!(page_offset(None, 50), 0);
        assert_eq!(page_offset(Some(1), 50), 0);
        assert_eq!(page_offset(Some(0), 50), 0);
    }

    #[test]
    fn offset_advances_by_page_size() {
        assert_eq!(page_offset(Some(3), 10), 20);
    }

    #[test]
    fn huge_page_saturates_instead_of_overflowing() {
        assert_eq!(page_offset(Some(i64::MAX), 50), i64::MAX);
        assert_eq!(page_offset(Some(i64::MAX), page_size(Some(999))), i64::MAX);
    }
}
