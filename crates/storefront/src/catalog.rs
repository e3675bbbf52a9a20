//! Catalog list pipeline: fetch everything, sort locally, slice.
//!
//! Sorting must be globally consistent across display pages, and the
//! backend cannot sort on every field the UI offers (publication year
//! in particular). So the pipeline fetches the *entire* filtered
//! corpus - walking backend pages sequentially until `next_page`
//! disappears - then applies one stable client-side sort and slices
//! out the requested display page. Correctness over efficiency; the
//! corpus is bounded by the shop's inventory, not by the display page
//! size.
//!
//! The backend `sort` parameter is still sent for title and price so
//! server and client agree on the baseline order, but it is omitted
//! entirely for publication year. That asymmetry comes from the
//! backend's contract and is preserved deliberately.

use serde::Deserialize;

use bitshelf_core::{BookCondition, GenreId};

use crate::api::types::Book;
use crate::api::{ApiClient, ApiError, BACKEND_PAGE_LIMIT, BookListQuery};

/// Number of books on one display page.
pub const PAGE_SIZE: usize = 12;

// =============================================================================
// Sort
// =============================================================================

/// Field a catalog column can sort on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    PublicationYear,
    Price,
}

impl SortField {
    /// Token used in URLs and form values.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::PublicationYear => "publication_year",
            Self::Price => "price",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(Self::Title),
            "publication_year" => Some(Self::PublicationYear),
            "price" => Some(Self::Price),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn flipped(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Active sort key and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for BookSort {
    fn default() -> Self {
        Self {
            field: SortField::Title,
            direction: SortDirection::Asc,
        }
    }
}

impl BookSort {
    /// Parse a combined `field_dir` token, e.g. `publication_year_desc`.
    ///
    /// Splits on the *last* underscore so field names containing
    /// underscores parse correctly. Unknown tokens fall back to the
    /// default sort rather than failing the request.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        token
            .rsplit_once('_')
            .and_then(|(field, direction)| {
                let field = SortField::parse(field)?;
                let direction = match direction {
                    "asc" => SortDirection::Asc,
                    "desc" => SortDirection::Desc,
                    _ => return None,
                };
                Some(Self { field, direction })
            })
            .unwrap_or_default()
    }

    /// The combined token for URLs, e.g. `title_asc`.
    #[must_use]
    pub fn token(&self) -> String {
        format!("{}_{}", self.field.as_str(), self.direction.as_str())
    }

    /// The sort this becomes when the user clicks a column header:
    /// same field toggles direction, a new field starts at its
    /// default (descending for publication year - newest first -
    /// ascending otherwise).
    #[must_use]
    pub fn toggled(&self, field: SortField) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.flipped(),
            }
        } else {
            let direction = match field {
                SortField::PublicationYear => SortDirection::Desc,
                SortField::Title | SortField::Price => SortDirection::Asc,
            };
            Self { field, direction }
        }
    }

    /// The backend `sort` expression, or `None` for publication year,
    /// which the backend cannot sort on.
    #[must_use]
    pub fn backend_param(&self) -> Option<String> {
        match self.field {
            SortField::PublicationYear => None,
            SortField::Title | SortField::Price => Some(format!(
                "{} {}",
                self.field.as_str(),
                self.direction.as_str()
            )),
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

/// The active catalog filter. Any change to one of these fields
/// resets the display page to 1 (the filter form never carries a page
/// parameter).
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub search: String,
    pub genre_id: Option<GenreId>,
    pub condition: Option<BookCondition>,
    pub sort: BookSort,
}

/// Raw catalog query parameters as they arrive from the URL.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

impl CatalogQuery {
    /// Build the validated filter; unparseable values degrade to "no
    /// filter" instead of erroring.
    #[must_use]
    pub fn filter(&self) -> CatalogFilter {
        CatalogFilter {
            search: self.search.clone().unwrap_or_default(),
            genre_id: self
                .genre
                .as_deref()
                .filter(|g| !g.is_empty())
                .map(GenreId::new),
            condition: self.condition.as_deref().and_then(|c| c.parse().ok()),
            sort: self.sort.as_deref().map(BookSort::parse).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// One display page of a sorted, filtered result set.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Paged<T> {
    /// Numbered pagination links for templates.
    #[must_use]
    pub fn page_links(&self) -> Vec<PageLink> {
        (1..=self.total_pages)
            .map(|number| PageLink {
                number,
                current: number == self.page,
            })
            .collect()
    }
}

/// One numbered link in a pagination control.
#[derive(Debug, Clone, Copy)]
pub struct PageLink {
    pub number: usize,
    pub current: bool,
}

/// Fetch the full filtered corpus, sort it, and slice the requested
/// display page.
///
/// # Errors
///
/// A failure on any backend page aborts the whole pipeline; the
/// caller keeps whatever it was already displaying and shows the
/// error alongside it.
pub async fn fetch_catalog(
    api: &ApiClient,
    token: &str,
    filter: &CatalogFilter,
    page: usize,
) -> Result<Paged<Book>, ApiError> {
    let corpus = fetch_all_books(api, token, filter).await?;
    let sorted = sort_books(corpus, filter.sort);
    Ok(paginate(sorted, page, PAGE_SIZE))
}

/// Walk backend pages sequentially until the backend reports no
/// further page. No concurrent fan-out; each request awaits the
/// previous one.
async fn fetch_all_books(
    api: &ApiClient,
    token: &str,
    filter: &CatalogFilter,
) -> Result<Vec<Book>, ApiError> {
    let mut corpus = Vec::new();
    let mut backend_page: u32 = 1;

    loop {
        let query = BookListQuery {
            search: filter.search.clone(),
            genre_id: filter.genre_id.clone(),
            condition: filter.condition.map(|c| c.as_str().to_owned()),
            sort: filter.sort.backend_param(),
            page: backend_page,
            limit: BACKEND_PAGE_LIMIT,
        };

        let page = api.list_books(token, &query).await?;
        corpus.extend(page.data);

        if page.next_page.is_none() {
            break;
        }
        backend_page += 1;
    }

    Ok(corpus)
}

/// Stable sort over the whole corpus.
///
/// `Vec::sort_by` is stable, and descending order is produced by
/// reversing the comparator - equal keys still compare equal, so
/// relative order among exact ties is preserved in both directions.
/// That stability is what makes display pagination deterministic.
#[must_use]
pub fn sort_books(mut books: Vec<Book>, sort: BookSort) -> Vec<Book> {
    books.sort_by(|a, b| {
        let ordering = match sort.field {
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::PublicationYear => a.publication_year.cmp(&b.publication_year),
            SortField::Price => a.price.cmp(&b.price),
        };
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    books
}

/// Slice one display page out of a sorted list.
///
/// Pages are 1-based; a page past the end yields an empty slice, and
/// `total_pages` is `ceil(n / page_size)`.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Paged<T> {
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page = page.max(1);

    let start = (page - 1).saturating_mul(page_size);
    let items: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();

    Paged {
        items,
        page,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bitshelf_core::Price;

    fn book(id: &str, title: &str, year: i32, price: i64) -> Book {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": title,
            "publication_year": year,
            "price": price,
        }))
        .unwrap()
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_sort_title_case_insensitive() {
        let books = vec![
            book("1", "beta", 2000, 10),
            book("2", "Alpha", 2001, 20),
            book("3", "GAMMA", 2002, 30),
        ];
        let sorted = sort_books(books, BookSort::parse("title_asc"));
        assert_eq!(ids(&sorted), ["2", "1", "3"]);
    }

    #[test]
    fn test_sort_price_ties_are_stable_both_directions() {
        let books = vec![
            book("a", "A", 2000, 100),
            book("b", "B", 2001, 50),
            book("c", "C", 2002, 100),
            book("d", "D", 2003, 50),
        ];

        let asc = sort_books(books.clone(), BookSort::parse("price_asc"));
        // Ties (b,d) and (a,c) keep fetched order.
        assert_eq!(ids(&asc), ["b", "d", "a", "c"]);

        let desc = sort_books(books, BookSort::parse("price_desc"));
        // Reversal swaps the groups but ties still keep fetched order.
        assert_eq!(ids(&desc), ["a", "c", "b", "d"]);
    }

    #[test]
    fn test_sort_publication_year_numeric() {
        let books = vec![
            book("1", "X", 1999, 10),
            book("2", "Y", 2024, 10),
            book("3", "Z", 2008, 10),
        ];
        let sorted = sort_books(books, BookSort::parse("publication_year_desc"));
        assert_eq!(ids(&sorted), ["2", "3", "1"]);
    }

    #[test]
    fn test_paginate_25_books_page_size_12() {
        let books: Vec<i32> = (0..25).collect();

        let page1 = paginate(books.clone(), 1, 12);
        assert_eq!(page1.total_pages, 3);
        assert_eq!(page1.items.len(), 12);

        let page3 = paginate(books, 3, 12);
        assert_eq!(page3.items.len(), 1);
        assert_eq!(page3.items[0], 24);
    }

    #[test]
    fn test_paginate_empty_and_out_of_range() {
        let empty: Paged<i32> = paginate(Vec::new(), 1, 12);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.items.is_empty());

        let past_end = paginate(vec![1, 2, 3], 9, 12);
        assert!(past_end.items.is_empty());

        // Page 0 is clamped to 1.
        let clamped = paginate(vec![1, 2, 3], 0, 12);
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.items.len(), 3);
    }

    #[test]
    fn test_sort_token_parse_with_underscored_field() {
        let sort = BookSort::parse("publication_year_desc");
        assert_eq!(sort.field, SortField::PublicationYear);
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(sort.token(), "publication_year_desc");
    }

    #[test]
    fn test_sort_parse_garbage_falls_back_to_default() {
        assert_eq!(BookSort::parse("nonsense"), BookSort::default());
        assert_eq!(BookSort::parse("title_sideways"), BookSort::default());
    }

    #[test]
    fn test_backend_param_omitted_for_publication_year() {
        assert_eq!(
            BookSort::parse("title_asc").backend_param().as_deref(),
            Some("title asc")
        );
        assert_eq!(
            BookSort::parse("price_desc").backend_param().as_deref(),
            Some("price desc")
        );
        assert!(BookSort::parse("publication_year_asc").backend_param().is_none());
    }

    #[test]
    fn test_toggled_same_field_flips_new_field_defaults() {
        let sort = BookSort::parse("title_asc");
        assert_eq!(sort.toggled(SortField::Title).token(), "title_desc");
        assert_eq!(
            sort.toggled(SortField::PublicationYear).token(),
            "publication_year_desc"
        );
        assert_eq!(sort.toggled(SortField::Price).token(), "price_asc");
    }

    #[test]
    fn test_catalog_query_degrades_bad_values() {
        let query = CatalogQuery {
            search: Some("rust".to_owned()),
            genre: Some(String::new()),
            condition: Some("Mint".to_owned()),
            sort: Some("junk".to_owned()),
            page: None,
        };
        let filter = query.filter();
        assert_eq!(filter.search, "rust");
        assert!(filter.genre_id.is_none());
        assert!(filter.condition.is_none());
        assert_eq!(filter.sort, BookSort::default());
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_price_ordering_uses_numeric_compare() {
        let books = vec![book("1", "A", 2000, 9), book("2", "B", 2000, 100)];
        let sorted = sort_books(books, BookSort::parse("price_asc"));
        assert_eq!(sorted[0].price, Price::new(9));
    }
}
