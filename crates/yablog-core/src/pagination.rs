//! Page-number pagination for list views.
//!
//! An empty result set still has one (empty) first page. `page=last`
//! selects the final page; anything that is not a positive page number
//! inside the range is rejected.

use serde::Serialize;

/// Posts shown per list page.
pub const POSTS_PER_PAGE: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(u64),
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("Page is not 'last', nor can it be converted to an int: {0}")]
    Invalid(String),

    #[error("That page number is less than 1")]
    LessThanOne,

    #[error("That page contains no results")]
    Empty,
}

/// A requested page, before the total item count is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: PageNumber,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: PageNumber, per_page: u64) -> Self {
        Self { page, per_page }
    }

    pub fn first(per_page: u64) -> Self {
        Self::new(PageNumber::Number(1), per_page)
    }

    /// Parse the raw `page` query value. A missing or blank value is page 1.
    pub fn parse(raw: Option<&str>, per_page: u64) -> Result<Self, PageError> {
        let page = match raw.map(str::trim) {
            None | Some("") => PageNumber::Number(1),
            Some("last") => PageNumber::Last,
            Some(value) => value
                .parse::<u64>()
                .map(PageNumber::Number)
                .map_err(|_| PageError::Invalid(value.to_string()))?,
        };

        Ok(Self::new(page, per_page))
    }

    /// Number of pages for `total` items, never less than one.
    pub fn page_count(&self, total: u64) -> u64 {
        if total == 0 {
            return 1;
        }
        total.div_ceil(self.per_page.max(1))
    }

    /// Resolve to a concrete 1-based page number.
    pub fn resolve(&self, total: u64) -> Result<u64, PageError> {
        let page_count = self.page_count(total);
        match self.page {
            PageNumber::Last => Ok(page_count),
            PageNumber::Number(0) => Err(PageError::LessThanOne),
            PageNumber::Number(n) if n > page_count => Err(PageError::Empty),
            PageNumber::Number(n) => Ok(n),
        }
    }

    /// Row offset of a resolved page.
    pub fn offset(&self, number: u64) -> u64 {
        (number - 1) * self.per_page
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn num_pages(&self) -> u64 {
        if self.total_items == 0 {
            return 1;
        }
        self.total_items.div_ceil(self.per_page.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
        }
    }
}

/// Slice an already ordered list into the requested page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Result<Page<T>, PageError> {
    let total_items = items.len() as u64;
    let number = request.resolve(total_items)?;
    let offset = request.offset(number) as usize;

    let items = items
        .into_iter()
        .skip(offset)
        .take(request.per_page as usize)
        .collect();

    Ok(Page {
        items,
        number,
        per_page: request.per_page,
        total_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_case() {
        let items: Vec<u32> = (1..=7).collect();

        let page = paginate(items.clone(), PageRequest::first(3)).unwrap();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.num_pages(), 3);
        assert!(page.has_next());
        assert!(!page.has_previous());

        let req = PageRequest::parse(Some("3"), 3).unwrap();
        let page = paginate(items, req).unwrap();
        assert_eq!(page.items, vec![7]);
        assert_eq!(page.previous_number(), Some(2));
        assert_eq!(page.next_number(), None);
    }

    #[test]
    fn test_last_page() {
        let items: Vec<u32> = (1..=10).collect();
        let req = PageRequest::parse(Some("last"), 3).unwrap();
        let page = paginate(items, req).unwrap();
        assert_eq!(page.number, 4);
        assert_eq!(page.items, vec![10]);
    }

    #[test]
    fn test_empty_list_has_first_page() {
        let items: Vec<u32> = vec![];
        let page = paginate(items, PageRequest::first(3)).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.num_pages(), 1);
        assert!(!page.has_next());
    }

    #[test]
    fn test_invalid_pages() {
        assert_eq!(
            PageRequest::parse(Some("abc"), 3),
            Err(PageError::Invalid("abc".to_string()))
        );
        assert!(PageRequest::parse(Some("-1"), 3).is_err());

        let items: Vec<u32> = (1..=4).collect();
        let zero = PageRequest::parse(Some("0"), 3).unwrap();
        assert_eq!(paginate(items.clone(), zero).unwrap_err(), PageError::LessThanOne);

        let past_end = PageRequest::parse(Some("3"), 3).unwrap();
        assert_eq!(paginate(items, past_end).unwrap_err(), PageError::Empty);
    }

    #[test]
    fn test_missing_page_is_first() {
        assert_eq!(PageRequest::parse(None, 3).unwrap(), PageRequest::first(3));
        assert_eq!(PageRequest::parse(Some(""), 3).unwrap(), PageRequest::first(3));
    }
}
