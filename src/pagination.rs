use serde::Serialize;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 20;

/// A validated `page`/`per_page` pair. Pages are 1-based.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);

        if page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::validation(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }

        Ok(Self { page, per_page })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PageLinks {
    pub total_pages: u64,
    pub previous: Option<String>,
    pub next: Option<String>,
}

pub fn total_pages(total_items: u64, per_page: u64) -> u64 {
    total_items.div_ceil(per_page.max(1))
}

/// Navigation for `page` of a collection at `path`. A link is only produced
/// when it points at a page in `1..=total_pages`.
pub fn links(path: &str, req: PageRequest, total_items: u64) -> PageLinks {
    let total_pages = total_pages(total_items, req.per_page);
    let link = |page: u64| format!("{path}?page={page}&per_page={}", req.per_page);

    let previous = (req.page > 1 && req.page - 1 <= total_pages).then(|| link(req.page - 1));
    let next = (req.page < total_pages).then(|| link(req.page + 1));

    PageLinks { total_pages, previous, next }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(page: u64, per_page: u64) -> PageRequest {
        PageRequest::new(Some(page), Some(per_page)).unwrap()
    }

    #[test]
    fn defaults_apply() {
        assert_eq!(PageRequest::new(None, None).unwrap(), PageRequest { page: 1, per_page: 10 });
    }

    #[test]
    fn rejects_out_of_range_params() {
        assert!(matches!(PageRequest::new(Some(0), None), Err(AppError::Validation(_))));
        assert!(matches!(PageRequest::new(None, Some(0)), Err(AppError::Validation(_))));
        assert!(matches!(PageRequest::new(None, Some(21)), Err(AppError::Validation(_))));
        assert!(PageRequest::new(None, Some(20)).is_ok());
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(req(1, 10).offset(), 0);
        assert_eq!(req(3, 7).offset(), 14);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(41, 20), 3);
    }

    #[test]
    fn empty_collection_has_no_links() {
        let links = links("/movies/", req(1, 10), 0);
        assert_eq!(links, PageLinks { total_pages: 0, previous: None, next: None });
    }

    #[test]
    fn first_middle_and_last_page() {
        let first = links("/movies/", req(1, 5), 12);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.previous, None);
        assert_eq!(first.next.as_deref(), Some("/movies/?page=2&per_page=5"));

        let middle = links("/movies/", req(2, 5), 12);
        assert_eq!(middle.previous.as_deref(), Some("/movies/?page=1&per_page=5"));
        assert_eq!(middle.next.as_deref(), Some("/movies/?page=3&per_page=5"));

        let last = links("/movies/", req(3, 5), 12);
        assert_eq!(last.previous.as_deref(), Some("/movies/?page=2&per_page=5"));
        assert_eq!(last.next, None);
    }

    #[test]
    fn links_stay_inside_valid_range() {
        for total in 0..=45u64 {
            for per_page in 1..=MAX_PER_PAGE {
                let pages = total_pages(total, per_page);
                for page in 1..=pages.max(1) {
                    let l = links("/m", req(page, per_page), total);
                    assert_eq!(l.previous.is_none(), page == 1);
                    assert_eq!(l.next.is_none(), page >= pages);
                }
            }
        }
        let beyond = links("/m", req(9, 10), 15);
        assert_eq!(beyond.previous, None);
        assert_eq!(beyond.next, None);
    }
}
