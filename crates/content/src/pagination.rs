//! Paged listings of a collection, newest first.

use crate::collection::Collection;
use crate::document::Document;
use crate::error::PaginationError;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'c> {
    /// Documents on this page, newest first.
    pub documents: Vec<&'c Document>,
    /// 1-indexed page number.
    pub page_number: usize,
    /// Number of pages in the listing.
    pub total_pages: usize,
    /// Whether a newer page exists.
    pub has_previous: bool,
    /// Whether an older page exists.
    pub has_next: bool,
    /// Link to the newer page: `/` for the first page, `/page/<n>` otherwise.
    pub previous_href: Option<String>,
    /// Link to the older page.
    pub next_href: Option<String>,
}

/// Result of paginating a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<'c> {
    /// The collection has no documents; every page number yields this.
    Empty,
    /// A valid page.
    Page(Page<'c>),
}

impl<'c> Listing<'c> {
    /// The page, unless the listing is empty.
    pub fn page(&self) -> Option<&Page<'c>> {
        match self {
            Listing::Empty => None,
            Listing::Page(page) => Some(page),
        }
    }
}

/// Slices collections into fixed-size pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    date_field: String,
}

impl Paginator {
    /// Creates a paginator; `page_size` must be positive.
    pub fn new(page_size: usize, date_field: impl Into<String>) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::InvalidPageSize);
        }
        Ok(Self {
            page_size,
            date_field: date_field.into(),
        })
    }

    /// Documents per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Pages needed for `len` documents.
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// Every valid page number for `len` documents, for static generation.
    pub fn page_params(&self, len: usize) -> Vec<usize> {
        (1..=self.total_pages(len)).collect()
    }

    /// Returns page `page_number` (1-indexed) of the collection.
    pub fn paginate<'c>(
        &self,
        collection: &'c Collection,
        page_number: usize,
    ) -> Result<Listing<'c>, PaginationError> {
        if collection.is_empty() {
            return Ok(Listing::Empty);
        }

        let total_pages = self.total_pages(collection.len());
        if page_number == 0 || page_number > total_pages {
            return Err(PaginationError::InvalidPage {
                requested: page_number.to_string(),
                total_pages,
            });
        }

        let sorted = collection.sorted_by_date(&self.date_field);
        let start = (page_number - 1) * self.page_size;
        let documents = sorted
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect();

        let has_previous = page_number > 1;
        let has_next = page_number < total_pages;
        Ok(Listing::Page(Page {
            documents,
            page_number,
            total_pages,
            has_previous,
            has_next,
            previous_href: has_previous.then(|| page_href(page_number - 1)),
            next_href: has_next.then(|| page_href(page_number + 1)),
        }))
    }

    /// Like [`Paginator::paginate`] for a page number taken from a route
    /// parameter. Anything but a positive integer is an invalid page.
    pub fn paginate_param<'c>(
        &self,
        collection: &'c Collection,
        param: &str,
    ) -> Result<Listing<'c>, PaginationError> {
        let invalid = || PaginationError::InvalidPage {
            requested: param.to_string(),
            total_pages: self.total_pages(collection.len()),
        };
        let page_number = param.trim().parse::<usize>().map_err(|_| invalid())?;
        self.paginate(collection, page_number)
    }
}

/// Route of listing page `page_number`; the first page is the site root.
pub fn page_href(page_number: usize) -> String {
    if page_number <= 1 {
        "/".to_string()
    } else {
        format!("/page/{page_number}")
    }
}

/// Paginates by `createdAt` in one call.
pub fn paginate(
    collection: &Collection,
    page_size: usize,
    page_number: usize,
) -> Result<Listing<'_>, PaginationError> {
    Paginator::new(page_size, "createdAt")?.paginate(collection, page_number)
}
