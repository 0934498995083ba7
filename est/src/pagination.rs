//! Page/offset arithmetic for search requests

use serde::{Deserialize, Serialize};

/// Page size used until paging is requested
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Page size that oversized requests are clamped down to once paging is on
pub const PAGED_PAGE_SIZE: u32 = 10;

/// Requested page. `page == 0` means unpaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Select a 1-based page. `0` is raised to `1`; a page size still at the
    /// unpaged default is clamped to [`PAGED_PAGE_SIZE`].
    pub fn set_page(&mut self, page: u32) {
        if self.page_size >= DEFAULT_PAGE_SIZE {
            self.page_size = PAGED_PAGE_SIZE;
        }
        self.page = page.max(1);
    }

    /// Set the page size; anything `>= DEFAULT_PAGE_SIZE` becomes
    /// [`PAGED_PAGE_SIZE`]
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = if page_size >= DEFAULT_PAGE_SIZE {
            PAGED_PAGE_SIZE
        } else {
            page_size
        };
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn is_paged(&self) -> bool {
        self.page != 0
    }

    /// Index of the first hit to fetch
    pub fn offset(&self) -> u64 {
        if self.page == 0 {
            0
        } else {
            u64::from(self.page - 1) * u64::from(self.page_size)
        }
    }

    /// Paging metadata for a result set of `total` hits, `None` when unpaged
    pub fn paginate(&self, total: u64) -> Option<PageMeta> {
        if !self.is_paged() {
            return None;
        }
        Some(PageMeta {
            page: self.page,
            page_size: self.page_size,
            page_count: page_count(total, self.page_size),
        })
    }
}

/// Paging metadata attached to an enveloped result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u64,
}

/// `ceil(total / page_size)`, or 0 when `page_size` is 0
pub fn page_count(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(u64::from(page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unpaged() {
        let p = PageRequest::default();
        assert!(!p.is_paged());
        assert_eq!(p.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.paginate(50), None);
    }

    #[test]
    fn test_set_page_clamps_default_size() {
        let mut p = PageRequest::default();
        p.set_page(3);
        assert_eq!(p.page(), 3);
        assert_eq!(p.page_size(), PAGED_PAGE_SIZE);
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn test_set_page_zero_becomes_one() {
        let mut p = PageRequest::default();
        p.set_page(0);
        assert_eq!(p.page(), 1);
        assert!(p.is_paged());
    }

    #[test]
    fn test_explicit_size_kept_when_paging() {
        let mut p = PageRequest::default();
        p.set_page_size(25);
        p.set_page(2);
        assert_eq!(p.page_size(), 25);
        assert_eq!(p.offset(), 25);
    }

    #[test]
    fn test_set_page_size_clamps_large() {
        let mut p = PageRequest::default();
        p.set_page_size(5000);
        assert_eq!(p.page_size(), PAGED_PAGE_SIZE);
        p.set_page_size(999);
        assert_eq!(p.page_size(), 999);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(11, 0), 0);
    }

    #[test]
    fn test_paginate() {
        let mut p = PageRequest::default();
        p.set_page(2);
        assert_eq!(
            p.paginate(35),
            Some(PageMeta {
                page: 2,
                page_size: 10,
                page_count: 4
            })
        );
    }

    #[test]
    fn test_zero_page_size_offset() {
        let mut p = PageRequest::default();
        p.set_page_size(0);
        p.set_page(4);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.paginate(100).map(|m| m.page_count), Some(0));
    }
}
