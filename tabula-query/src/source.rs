//! Record sources: where paged rows come from.
//!
//! A source filters, sorts and slices on its own side. SQL-backed sources
//! render the predicate with [`Predicate::to_sql`] and the sort with
//! [`Sort::to_sql`]; [`MemorySource`] evaluates both in memory.

use async_trait::async_trait;

use crate::error::QueryResult;
use crate::pager::Sort;
use crate::paging::sort_records;
use crate::predicate::Predicate;
use crate::record::Record;

/// A queryable collection of records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Row type produced by the source.
    type Item: Send;

    /// Number of rows matching the predicate.
    async fn count(&self, predicate: &Predicate) -> QueryResult<u64>;

    /// Matching rows, sorted, skipping `skip` and returning at most `take`.
    async fn fetch(
        &self,
        predicate: &Predicate,
        sort: Option<&Sort>,
        skip: u64,
        take: u64,
    ) -> QueryResult<Vec<Self::Item>>;
}

/// An in-memory record source over a vector.
#[derive(Debug, Clone, Default)]
pub struct MemorySource<T> {
    records: Vec<T>,
}

impl<T> MemorySource<T> {
    /// Wrap a vector of records.
    pub fn new(records: Vec<T>) -> Self {
        Self { records }
    }

    /// Number of records held, before filtering.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the source holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> FromIterator<T> for MemorySource<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl<T> RecordSource for MemorySource<T>
where
    T: Record + Clone + Send + Sync,
{
    type Item = T;

    async fn count(&self, predicate: &Predicate) -> QueryResult<u64> {
        Ok(self
            .records
            .iter()
            .filter(|record| predicate.evaluate(*record))
            .count() as u64)
    }

    async fn fetch(
        &self,
        predicate: &Predicate,
        sort: Option<&Sort>,
        skip: u64,
        take: u64,
    ) -> QueryResult<Vec<T>> {
        let mut matching: Vec<T> = self
            .records
            .iter()
            .filter(|record| predicate.evaluate(*record))
            .cloned()
            .collect();
        if let Some(sort) = sort {
            sort_records(&mut matching, sort);
        }

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let take = usize::try_from(take).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(skip).take(take).collect())
    }
}
