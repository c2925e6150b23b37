//! Page and sort requests.
//!
//! ```rust
//! use tabula_query::{Pager, SortDirection};
//!
//! let pager = Pager::new(3, 25, "created_at", SortDirection::Descending).unwrap();
//! assert_eq!(pager.skip(), 50);
//! assert_eq!(pager.take(), 25);
//!
//! assert!(Pager::new(0, 25, "", SortDirection::Ascending).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use tabula_schema::PagingConfig;

use crate::error::{QueryError, QueryResult};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9, oldest first), nulls first.
    #[default]
    Ascending,
    /// Descending order (Z-A, 9-0, newest first), nulls last.
    Descending,
}

impl SortDirection {
    /// Get the SQL keyword for this sort direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    /// Get the SQL null placement matching in-memory sorting.
    pub fn nulls_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "NULLS FIRST",
            Self::Descending => "NULLS LAST",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// A sort on one property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    /// Dot-separated property path.
    pub column: String,
    /// Direction.
    pub direction: SortDirection,
}

impl Sort {
    /// Create a sort.
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Generate the SQL ORDER BY clause.
    pub fn to_sql(&self) -> String {
        format!(
            "ORDER BY {} {} {}",
            self.column,
            self.direction.as_sql(),
            self.direction.nulls_sql()
        )
    }
}

/// Page number, page size and sort of a request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pager {
    page_nr: u64,
    page_size: u64,
    sort_column: String,
    sort_direction: SortDirection,
}

impl Pager {
    /// Default page size.
    pub const DEFAULT_PAGE_SIZE: u64 = 30;

    /// Create a pager. Page number and page size must be positive; an empty
    /// sort column leaves the order unspecified.
    pub fn new(
        page_nr: i64,
        page_size: i64,
        sort_column: impl Into<String>,
        sort_direction: SortDirection,
    ) -> QueryResult<Self> {
        let page_nr = u64::try_from(page_nr)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                QueryError::validation("page_nr", format!("must be positive, got {}", page_nr))
            })?;
        let page_size = u64::try_from(page_size)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                QueryError::validation("page_size", format!("must be positive, got {}", page_size))
            })?;

        Ok(Self {
            page_nr,
            page_size,
            sort_column: sort_column.into(),
            sort_direction,
        })
    }

    /// Page 1 of the configured default size.
    pub fn from_config(config: &PagingConfig) -> Self {
        Self {
            page_size: config.default_page_size.max(1).into(),
            ..Self::default()
        }
    }

    /// Reject page sizes above the configured maximum.
    pub fn validate_with(&self, config: &PagingConfig) -> QueryResult<()> {
        if self.page_size > u64::from(config.max_page_size) {
            return Err(QueryError::validation(
                "page_size",
                format!(
                    "{} exceeds the maximum page size of {}",
                    self.page_size, config.max_page_size
                ),
            )
            .with_suggestion(format!("Request at most {} rows per page", config.max_page_size)));
        }
        Ok(())
    }

    /// 1-based page number.
    pub fn page_nr(&self) -> u64 {
        self.page_nr
    }

    /// Rows per page.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Sort column; empty when unsorted.
    pub fn sort_column(&self) -> &str {
        &self.sort_column
    }

    /// Sort direction.
    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// The sort, if a sort column is set.
    pub fn sort(&self) -> Option<Sort> {
        (!self.sort_column.is_empty()).then(|| Sort::new(&self.sort_column, self.sort_direction))
    }

    /// Rows before this page.
    pub fn skip(&self) -> u64 {
        (self.page_nr - 1).saturating_mul(self.page_size)
    }

    /// Rows on this page.
    pub fn take(&self) -> u64 {
        self.page_size
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page_nr: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
            sort_column: String::new(),
            sort_direction: SortDirection::Ascending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pager() {
        let pager = Pager::default();
        assert_eq!(pager.page_nr(), 1);
        assert_eq!(pager.page_size(), 30);
        assert_eq!(pager.skip(), 0);
        assert!(pager.sort().is_none());
        assert_eq!(pager.sort_direction(), SortDirection::Ascending);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        for (nr, size) in [(0, 10), (-1, 10), (1, 0), (1, -5)] {
            let err = Pager::new(nr, size, "", SortDirection::Ascending).unwrap_err();
            assert!(err.is_validation());
        }
    }

    #[test]
    fn test_skip_take() {
        let pager = Pager::new(1, 10, "", SortDirection::Ascending).unwrap();
        assert_eq!((pager.skip(), pager.take()), (0, 10));
        let pager = Pager::new(4, 10, "", SortDirection::Ascending).unwrap();
        assert_eq!((pager.skip(), pager.take()), (30, 10));
    }

    #[test]
    fn test_validate_with_config() {
        let config = PagingConfig {
            default_page_size: 20,
            max_page_size: 100,
        };
        assert!(Pager::new(1, 100, "", SortDirection::Ascending).unwrap().validate_with(&config).is_ok());
        let err = Pager::new(1, 101, "", SortDirection::Ascending)
            .unwrap()
            .validate_with(&config)
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(Pager::from_config(&config).page_size(), 20);
    }

    #[test]
    fn test_sort_sql() {
        let pager = Pager::new(1, 10, "customer.name", SortDirection::Descending).unwrap();
        assert_eq!(
            pager.sort().unwrap().to_sql(),
            "ORDER BY customer.name DESC NULLS LAST"
        );
    }
}
