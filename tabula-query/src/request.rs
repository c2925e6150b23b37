//! Grid requests: a pager plus the filter rules to apply.

use tracing::{debug, warn};
use uuid::Uuid;

use tabula_schema::SchemaResolver;

use crate::compile::CompileOptions;
use crate::error::{QueryError, QueryResult};
use crate::pager::{Pager, SortDirection};
use crate::paging::{PagedResult, apply_paging_async};
use crate::predicate::Predicate;
use crate::record::Model;
use crate::rule::FilterRule;
use crate::source::RecordSource;

/// Everything needed to produce one page of a grid.
///
/// ```rust
/// # use std::sync::LazyLock;
/// # use tabula_query::{FieldValue, Model, Record};
/// # use tabula_schema::RecordSchema;
/// # struct Row;
/// # impl Record for Row { fn field(&self, _: &str) -> FieldValue<'_> { FieldValue::Null } }
/// # impl Model for Row {
/// #     fn schema() -> &'static RecordSchema {
/// #         static S: LazyLock<RecordSchema> =
/// #             LazyLock::new(|| RecordSchema::builder("Row").build().expect("schema"));
/// #         &S
/// #     }
/// # }
/// use tabula_query::{RequestArgs, SortDirection};
///
/// let args = RequestArgs::<Row>::new(1, 30, SortDirection::Ascending, "", Vec::new()).unwrap();
/// assert!(args.filter_expression().unwrap().is_true());
/// ```
pub struct RequestArgs<M> {
    pager: Pager,
    filters: Vec<FilterRule<M>>,
    options: CompileOptions,
}

impl<M> RequestArgs<M> {
    /// Build a request from raw paging parameters.
    pub fn new(
        page_nr: i64,
        page_size: i64,
        sort_direction: SortDirection,
        sort_column: impl Into<String>,
        filters: Vec<FilterRule<M>>,
    ) -> QueryResult<Self> {
        let pager = Pager::new(page_nr, page_size, sort_column, sort_direction)?;
        Ok(Self::from_pager(pager, filters))
    }

    /// Build a request around an existing pager.
    pub fn from_pager(pager: Pager, filters: Vec<FilterRule<M>>) -> Self {
        Self {
            pager,
            filters,
            options: CompileOptions::default(),
        }
    }

    /// Compile with the given options.
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// The pager.
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// The filter rules, in application order.
    pub fn filters(&self) -> &[FilterRule<M>] {
        &self.filters
    }

    /// The compile options.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Append a rule.
    pub fn add_filter(&mut self, rule: FilterRule<M>) {
        self.filters.push(rule);
    }

    /// Remove a rule by id, returning it.
    pub fn remove_filter(&mut self, id: Uuid) -> Option<FilterRule<M>> {
        let index = self.filters.iter().position(|rule| rule.id() == id)?;
        Some(self.filters.remove(index))
    }
}

impl<M: Model> RequestArgs<M> {
    /// AND every rule together, in order, starting from always-true.
    pub fn filter_expression(&self) -> QueryResult<Predicate> {
        let mut predicate = Predicate::True;
        for rule in &self.filters {
            predicate = predicate.and_then(rule.generate_expression_with(&self.options)?);
        }
        Ok(predicate)
    }

    /// Check the request against the model before touching any data.
    ///
    /// Every rule must compile and the sort column must resolve.
    pub fn validate(&self) -> QueryResult<()> {
        self.prepare().map(|_| ())
    }

    /// Validate, compile and fetch one page from a source.
    pub async fn execute<S>(&self, source: &S) -> QueryResult<PagedResult<S::Item>>
    where
        S: RecordSource + ?Sized,
    {
        let predicate = match self.prepare() {
            Ok(predicate) => predicate,
            Err(err) => {
                warn!(code = %err.code, error = %err, "rejected grid request");
                return Err(err);
            }
        };

        debug!(
            filters = self.filters.len(),
            predicate = %predicate,
            "executing grid request"
        );
        apply_paging_async(source, &predicate, &self.pager).await
    }

    /// Resolve the sort column, then compile the rules once.
    fn prepare(&self) -> QueryResult<Predicate> {
        if let Some(sort) = self.pager.sort() {
            M::schema().resolve(&sort.column).map_err(|e| {
                QueryError::from(e).with_context("Validating sort column")
            })?;
        }
        self.filter_expression()
    }
}

impl<M> Clone for RequestArgs<M> {
    fn clone(&self) -> Self {
        Self {
            pager: self.pager.clone(),
            filters: self.filters.clone(),
            options: self.options,
        }
    }
}

impl<M> std::fmt::Debug for RequestArgs<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestArgs")
            .field("pager", &self.pager)
            .field("filters", &self.filters)
            .field("options", &self.options)
            .finish()
    }
}
