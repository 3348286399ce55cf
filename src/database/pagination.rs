use serde::{Deserialize, Serialize};

/// One page of an offset-paginated listing, with enough context for the
/// server to render prev/next links.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub offset: i64,
    pub next_offset: Option<i64>,
    pub prev_offset: Option<i64>,
    pub page_count: i64,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, offset: i64) -> Self {
        if rows.is_empty() {
            return Self::empty();
        }

        let page_count = (total_rows + page_size - 1) / page_size;
        let next_offset = (offset + page_size < total_rows).then_some(offset + page_size);
        let prev_offset = (offset > 0).then(|| (offset - page_size).max(0));

        Self {
            rows,
            total_rows,
            offset,
            next_offset,
            prev_offset,
            page_count,
        }
    }

    pub fn empty() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            offset: 0,
            next_offset: None,
            prev_offset: None,
            page_count: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageContext<U> {
        PageContext {
            rows: self.rows.into_iter().map(f).collect(),
            total_rows: self.total_rows,
            offset: self.offset,
            next_offset: self.next_offset,
            prev_offset: self.prev_offset,
            page_count: self.page_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_page() {
        let page = PageContext::<i32>::from_rows(vec![], 0, 10, 0);
        assert_eq!(page, PageContext::empty());
    }

    #[test]
    fn test_first_page() {
        let page = PageContext::from_rows(vec![1, 2, 3], 25, 10, 0);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.next_offset, Some(10));
        assert_eq!(page.prev_offset, None);
    }

    #[test]
    fn test_middle_page() {
        let page = PageContext::from_rows(vec![1], 25, 10, 10);
        assert_eq!(page.next_offset, Some(20));
        assert_eq!(page.prev_offset, Some(0));
    }

    #[test]
    fn test_last_page() {
        let page = PageContext::from_rows(vec![1], 25, 10, 20);
        assert_eq!(page.next_offset, None);
        assert_eq!(page.prev_offset, Some(10));
    }

    #[test]
    fn test_map_keeps_paging() {
        let page = PageContext::from_rows(vec![1, 2], 12, 10, 0).map(|n| n * 2);
        assert_eq!(page.rows, vec![2, 4]);
        assert_eq!(page.total_rows, 12);
        assert_eq!(page.next_offset, Some(10));
    }
}
