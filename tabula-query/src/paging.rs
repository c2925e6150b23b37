//! Paged results and the paging executor.
//!
//! # In-memory paging
//!
//! ```rust
//! use serde_json::json;
//! use tabula_query::{Pager, SortDirection, apply_paging};
//!
//! let rows: Vec<_> = (1..=25).map(|i| json!({ "id": i })).collect();
//! let pager = Pager::new(3, 10, "id", SortDirection::Descending).unwrap();
//!
//! let page = apply_paging(rows, &pager);
//! assert_eq!(page.data.len(), 5);
//! assert_eq!(page.paging.page_count, 3);
//! assert_eq!(page.paging.total_record_count, 25);
//! ```
//!
//! # Source-backed paging
//!
//! [`apply_paging_async`] asks a [`RecordSource`] for the total count and the
//! requested slice, leaving filtering and sorting to the source.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::error::QueryResult;
use crate::pager::{Pager, Sort, SortDirection};
use crate::predicate::{Operand, Predicate};
use crate::record::{FieldValue, Record, lookup};
use crate::source::RecordSource;

/// Paging metadata sent alongside a page of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingInfo {
    /// 1-based page number.
    pub page_nr: u64,
    /// Rows per page.
    pub page_size: u64,
    /// Number of pages; 0 when there are no rows.
    pub page_count: u64,
    /// Rows matching the filter across all pages.
    pub total_record_count: u64,
    /// Echoed sort column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_column: Option<String>,
    /// Echoed sort direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
}

impl PagingInfo {
    /// Build paging metadata, computing the page count.
    pub fn new(page_nr: u64, page_size: u64, total_record_count: u64) -> Self {
        let page_count = if total_record_count == 0 || page_size == 0 {
            0
        } else {
            total_record_count.div_ceil(page_size)
        };
        Self {
            page_nr,
            page_size,
            page_count,
            total_record_count,
            sort_column: None,
            sort_direction: None,
        }
    }

    /// Whether a later page exists.
    pub fn has_next(&self) -> bool {
        self.page_nr < self.page_count
    }

    /// Whether an earlier page exists.
    pub fn has_previous(&self) -> bool {
        self.page_nr > 1 && self.page_count > 0
    }

    /// 1-based index of the first row on this page, 0 when the page is empty.
    pub fn first_record(&self) -> u64 {
        let skip = (self.page_nr.saturating_sub(1)).saturating_mul(self.page_size);
        if skip >= self.total_record_count {
            0
        } else {
            skip + 1
        }
    }

    /// 1-based index of the last row on this page, 0 when the page is empty.
    pub fn last_record(&self) -> u64 {
        match self.first_record() {
            0 => 0,
            first => (first - 1 + self.page_size).min(self.total_record_count),
        }
    }
}

/// One page of rows plus its paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Rows on this page.
    pub data: Vec<T>,
    /// Paging metadata.
    pub paging: PagingInfo,
}

impl<T> PagedResult<T> {
    /// Create a result without sort information.
    pub fn new(items: impl IntoIterator<Item = T>, page_nr: u64, page_size: u64, total_record_count: u64) -> Self {
        Self {
            data: items.into_iter().collect(),
            paging: PagingInfo::new(page_nr, page_size, total_record_count),
        }
    }

    /// Create a result that echoes the sort it was produced with.
    pub fn with_sort(
        items: impl IntoIterator<Item = T>,
        page_nr: u64,
        page_size: u64,
        total_record_count: u64,
        sort_column: impl Into<String>,
        sort_direction: SortDirection,
    ) -> Self {
        let mut result = Self::new(items, page_nr, page_size, total_record_count);
        result.paging.sort_column = Some(sort_column.into());
        result.paging.sort_direction = Some(sort_direction);
        result
    }

    /// Map the rows, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            data: self.data.into_iter().map(f).collect(),
            paging: self.paging,
        }
    }

    /// Check if the page holds no rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Compare two field values for sorting.
///
/// Null sorts before everything and nested records after everything. Scalars
/// of different shapes are ranked numbers, booleans, text, dates, instants;
/// numbers compare across representations with NaN above every other number.
fn compare_fields(a: &FieldValue<'_>, b: &FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
        (FieldValue::Null, _) => Ordering::Less,
        (_, FieldValue::Null) => Ordering::Greater,
        (FieldValue::Scalar(a), FieldValue::Scalar(b)) => {
            compare_operands(&Operand::from_value(a), &Operand::from_value(b))
        }
        (FieldValue::Scalar(_), FieldValue::Record(_)) => Ordering::Less,
        (FieldValue::Record(_), FieldValue::Scalar(_)) => Ordering::Greater,
        (FieldValue::Record(_), FieldValue::Record(_)) => Ordering::Equal,
    }
}

fn shape_rank(operand: &Operand) -> u8 {
    match operand {
        Operand::Int(_) | Operand::UInt(_) | Operand::Float(_) | Operand::Decimal(_) => 0,
        Operand::Bool(_) => 1,
        Operand::Text(_) => 2,
        Operand::Date(_) => 3,
        Operand::DateTime(_) => 4,
    }
}

fn compare_operands(a: &Operand, b: &Operand) -> Ordering {
    let by_shape = shape_rank(a).cmp(&shape_rank(b));
    if by_shape != Ordering::Equal {
        return by_shape;
    }

    let is_nan = |operand: &Operand| matches!(operand, Operand::Float(f) if f.is_nan());
    match (is_nan(a), is_nan(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

/// Stable sort by a property path. Ascending puts nulls first, descending last.
pub fn sort_records<T: Record>(records: &mut [T], sort: &Sort) {
    let segments: Vec<String> = sort.column.split('.').map(str::to_string).collect();
    records.sort_by(|a, b| {
        let ordering = compare_fields(&lookup(a, &segments), &lookup(b, &segments));
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Sort, count and slice already-filtered records.
pub fn apply_paging<T: Record>(mut records: Vec<T>, pager: &Pager) -> PagedResult<T> {
    if let Some(sort) = pager.sort() {
        sort_records(&mut records, &sort);
    }

    let total = records.len() as u64;
    let skip = usize::try_from(pager.skip()).unwrap_or(usize::MAX);
    let take = usize::try_from(pager.take()).unwrap_or(usize::MAX);
    let page: Vec<T> = records.into_iter().skip(skip).take(take).collect();

    debug!(
        page_nr = pager.page_nr(),
        page_size = pager.page_size(),
        rows = page.len(),
        total,
        "applied paging"
    );
    build_result(page, pager, total)
}

/// Count and fetch one page from a record source.
pub async fn apply_paging_async<S>(
    source: &S,
    predicate: &Predicate,
    pager: &Pager,
) -> QueryResult<PagedResult<S::Item>>
where
    S: RecordSource + ?Sized,
{
    let sort = pager.sort();
    let total = source.count(predicate).await?;
    let page = source
        .fetch(predicate, sort.as_ref(), pager.skip(), pager.take())
        .await?;

    debug!(
        page_nr = pager.page_nr(),
        page_size = pager.page_size(),
        rows = page.len(),
        total,
        "fetched page"
    );
    Ok(build_result(page, pager, total))
}

fn build_result<T>(page: Vec<T>, pager: &Pager, total: u64) -> PagedResult<T> {
    match pager.sort() {
        Some(sort) => PagedResult::with_sort(
            page,
            pager.page_nr(),
            pager.page_size(),
            total,
            sort.column,
            sort.direction,
        ),
        None => PagedResult::new(page, pager.page_nr(), pager.page_size(), total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FilterValue;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn ids(result: &PagedResult<serde_json::Value>) -> Vec<i64> {
        result
            .data
            .iter()
            .map(|row| row["id"].as_i64().unwrap_or(-1))
            .collect()
    }

    #[test]
    fn test_page_count() {
        assert_eq!(PagingInfo::new(1, 10, 0).page_count, 0);
        assert_eq!(PagingInfo::new(1, 10, 1).page_count, 1);
        assert_eq!(PagingInfo::new(1, 10, 10).page_count, 1);
        assert_eq!(PagingInfo::new(1, 10, 25).page_count, 3);
    }

    #[test]
    fn test_first_page_of_twenty_five() {
        let rows: Vec<_> = (1..=25).map(|i| json!({ "id": i })).collect();
        let pager = Pager::new(1, 10, "", SortDirection::Ascending).unwrap();
        let result = apply_paging(rows, &pager);
        assert_eq!(ids(&result), (1..=10).collect::<Vec<_>>());
        assert_eq!(result.paging.page_count, 3);
        assert_eq!(result.paging.total_record_count, 25);
        assert_eq!(result.paging.sort_column, None);
    }

    #[test]
    fn test_sorting_is_stable_with_nulls_first() {
        let rows = vec![
            json!({ "id": 1, "rank": 2 }),
            json!({ "id": 2, "rank": null }),
            json!({ "id": 3, "rank": 1 }),
            json!({ "id": 4, "rank": 2 }),
        ];
        let asc = Pager::new(1, 10, "rank", SortDirection::Ascending).unwrap();
        assert_eq!(ids(&apply_paging(rows.clone(), &asc)), vec![2, 3, 1, 4]);

        let desc = Pager::new(1, 10, "rank", SortDirection::Descending).unwrap();
        let result = apply_paging(rows, &desc);
        assert_eq!(ids(&result), vec![1, 4, 3, 2]);
        assert_eq!(result.paging.sort_column.as_deref(), Some("rank"));
        assert_eq!(result.paging.sort_direction, Some(SortDirection::Descending));
    }

    struct Cell(Option<FilterValue>);

    impl Record for Cell {
        fn field(&self, _: &str) -> FieldValue<'_> {
            self.0.clone().map_or(FieldValue::Null, FieldValue::Scalar)
        }
    }

    #[test]
    fn test_mixed_shapes_sort_in_a_fixed_order() {
        let cells = || {
            vec![
                Cell(Some(FilterValue::Text("b".into()))),
                Cell(Some(FilterValue::Float(f64::NAN))),
                Cell(Some(FilterValue::Int32(3))),
                Cell(None),
                Cell(Some(FilterValue::Bool(true))),
                Cell(Some(FilterValue::Float(1.5))),
                Cell(Some(FilterValue::Text("a".into()))),
                Cell(Some(FilterValue::Decimal(Decimal::new(2, 0)))),
            ]
        };
        let render = |cells: &[Cell]| -> Vec<String> {
            cells
                .iter()
                .map(|c| c.0.as_ref().map_or("null".to_string(), |v| v.to_string()))
                .collect()
        };

        let mut rows = cells();
        sort_records(&mut rows, &Sort::new("v", SortDirection::Ascending));
        assert_eq!(render(&rows), ["null", "1.5", "2", "3", "NaN", "True", "a", "b"]);

        let mut rows = cells();
        sort_records(&mut rows, &Sort::new("v", SortDirection::Descending));
        assert_eq!(render(&rows), ["b", "a", "True", "NaN", "3", "2", "1.5", "null"]);
    }

    #[test]
    fn test_comparator_is_a_total_order() {
        let values = [
            FilterValue::Float(f64::NAN),
            FilterValue::Float(-0.0),
            FilterValue::Int64(0),
            FilterValue::UInt64(u64::MAX),
            FilterValue::Decimal(Decimal::new(-5, 1)),
            FilterValue::Text("2024-01-01T00:00:00Z".into()),
            FilterValue::DateTime(chrono::DateTime::UNIX_EPOCH),
            FilterValue::Bool(false),
        ];
        let fields: Vec<FieldValue<'_>> = values
            .iter()
            .cloned()
            .map(FieldValue::Scalar)
            .chain([FieldValue::Null])
            .collect();

        for a in &fields {
            assert_eq!(compare_fields(a, a), Ordering::Equal);
            for b in &fields {
                assert_eq!(compare_fields(a, b), compare_fields(b, a).reverse());
                for c in &fields {
                    if compare_fields(a, b) != Ordering::Greater
                        && compare_fields(b, c) != Ordering::Greater
                    {
                        assert_ne!(compare_fields(a, c), Ordering::Greater);
                    }
                }
            }
        }
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let rows: Vec<_> = (1..=5).map(|i| json!({ "id": i })).collect();
        let pager = Pager::new(3, 5, "", SortDirection::Ascending).unwrap();
        let result = apply_paging(rows, &pager);
        assert!(result.is_empty());
        assert_eq!(result.paging.total_record_count, 5);
        assert_eq!(result.paging.first_record(), 0);
    }

    #[test]
    fn test_row_range_helpers() {
        let info = PagingInfo::new(3, 10, 25);
        assert_eq!((info.first_record(), info.last_record()), (21, 25));
        assert!(!info.has_next());
        assert!(info.has_previous());

        let info = PagingInfo::new(1, 10, 25);
        assert_eq!((info.first_record(), info.last_record()), (1, 10));
        assert!(info.has_next());
        assert!(!info.has_previous());
    }

    #[test]
    fn test_serialized_shape() {
        let result = PagedResult::new(vec![1, 2], 1, 2, 3);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "data": [1, 2],
                "paging": { "pageNr": 1, "pageSize": 2, "pageCount": 2, "totalRecordCount": 3 }
            })
        );

        let sorted = PagedResult::with_sort(Vec::<i32>::new(), 1, 2, 0, "name", SortDirection::Ascending);
        let value = serde_json::to_value(&sorted).unwrap();
        assert_eq!(value["paging"]["sortColumn"], "name");
        assert_eq!(value["paging"]["sortDirection"], "Ascending");
        assert_eq!(value["paging"]["pageCount"], 0);
    }
}
