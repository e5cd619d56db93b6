//! Storage-agnostic query composition.
//!
//! A [`QuerySpec`] says *what* the caller wants (filter text, sort, window).
//! The [`QueryBuilder`] turns it into [`Query`] values built only from the
//! five driver primitives: scan, predicate, ordering, skip/take and count.

use std::cmp::Ordering;
use std::fmt;

use crate::entity::Entity;
use crate::resolver::{self, ResolvedField};
use crate::schema::EntitySchema;
use crate::value::Value;

/// Ordering by one resolved field.
pub struct SortSpec<T> {
    pub field: ResolvedField<T>,
    pub ascending: bool,
}

impl<T> Clone for SortSpec<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            ascending: self.ascending,
        }
    }
}

impl<T> fmt::Debug for SortSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortSpec")
            .field("field", &self.field.name())
            .field("ascending", &self.ascending)
            .finish()
    }
}

/// The validated, typed form of one tabular request.
pub struct QuerySpec<T> {
    pub filter_text: Option<String>,
    pub sort: Option<SortSpec<T>>,
    pub offset: u64,
    pub limit: u64,
}

impl<T> QuerySpec<T> {
    /// Unfiltered, unsorted window of `limit` rows starting at `offset`.
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            filter_text: None,
            sort: None,
            offset,
            limit,
        }
    }

    pub fn filter(mut self, text: impl Into<String>) -> Self {
        self.filter_text = Some(text.into());
        self
    }

    pub fn sort_by(mut self, field: ResolvedField<T>, ascending: bool) -> Self {
        self.sort = Some(SortSpec { field, ascending });
        self
    }
}

impl<T> Clone for QuerySpec<T> {
    fn clone(&self) -> Self {
        Self {
            filter_text: self.filter_text.clone(),
            sort: self.sort.clone(),
            offset: self.offset,
            limit: self.limit,
        }
    }
}

impl<T> fmt::Debug for QuerySpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySpec")
            .field("filter_text", &self.filter_text)
            .field("sort", &self.sort)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .finish()
    }
}

/// Case-insensitive substring predicate over an allow-list of text fields.
pub struct TextFilter<T> {
    needle: String,
    fields: Vec<ResolvedField<T>>,
}

impl<T> TextFilter<T> {
    /// `None` when `text` is empty: an empty filter matches everything and is
    /// not applied at all.
    pub fn new(text: &str, fields: Vec<ResolvedField<T>>) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        Some(Self {
            needle: text.to_lowercase(),
            fields,
        })
    }

    /// The lower-cased search text.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn fields(&self) -> &[ResolvedField<T>] {
        &self.fields
    }

    /// True when any searchable field contains the needle. Absent values
    /// read as the empty string and never match.
    pub fn matches(&self, entity: &T) -> bool {
        self.fields.iter().any(|field| match field.value(entity) {
            Value::Text(text) => text.to_lowercase().contains(&self.needle),
            _ => false,
        })
    }
}

impl<T> Clone for TextFilter<T> {
    fn clone(&self) -> Self {
        Self {
            needle: self.needle.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<T> fmt::Debug for TextFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields.iter().map(|field| field.name()).collect();
        f.debug_struct("TextFilter")
            .field("needle", &self.needle)
            .field("fields", &fields)
            .finish()
    }
}

/// A composable read against one entity type.
///
/// Starts as a full scan; predicate, ordering and the skip/take window are
/// layered on. Drivers interpret it natively (SQL) or by evaluation
/// ([`Query::evaluate`]).
pub struct Query<T> {
    filter: Option<TextFilter<T>>,
    order: Option<SortSpec<T>>,
    skip: u64,
    take: Option<u64>,
}

impl<T> Query<T> {
    /// Every record of the entity, in primary-key order.
    pub fn scan() -> Self {
        Self {
            filter: None,
            order: None,
            skip: 0,
            take: None,
        }
    }

    pub fn filter(mut self, filter: TextFilter<T>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, sort: SortSpec<T>) -> Self {
        self.order = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    pub fn text_filter(&self) -> Option<&TextFilter<T>> {
        self.filter.as_ref()
    }

    pub fn ordering(&self) -> Option<&SortSpec<T>> {
        self.order.as_ref()
    }

    pub fn skip_count(&self) -> u64 {
        self.skip
    }

    pub fn take_count(&self) -> Option<u64> {
        self.take
    }

    pub fn matches(&self, entity: &T) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(entity))
    }
}

impl<T: Entity> Query<T> {
    /// Run the query over in-process rows: filter, order (ties broken by
    /// primary key ascending), then apply the skip/take window.
    pub fn evaluate<'a, I>(&self, rows: I) -> Vec<T>
    where
        I: IntoIterator<Item = &'a T>,
    {
        let mut keyed: Vec<(Value, &T)> = rows
            .into_iter()
            .filter(|row| self.matches(row))
            .map(|row| {
                let key = self
                    .order
                    .as_ref()
                    .map_or(Value::Null, |sort| sort.field.value(row));
                (key, row)
            })
            .collect();

        let ascending = self.order.as_ref().map_or(true, |sort| sort.ascending);
        keyed.sort_by(|(ka, a), (kb, b)| {
            let primary = if ascending { ka.cmp(kb) } else { kb.cmp(ka) };
            primary.then_with(|| a.id().cmp(b.id()))
        });

        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let take = self
            .take
            .map_or(usize::MAX, |t| usize::try_from(t).unwrap_or(usize::MAX));
        keyed
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(_, row)| row.clone())
            .collect()
    }

    /// Number of rows the predicate admits, ignoring order and window.
    pub fn count<'a, I>(&self, rows: I) -> u64
    where
        I: IntoIterator<Item = &'a T>,
    {
        rows.into_iter().filter(|row| self.matches(row)).count() as u64
    }

    /// Compare two rows the way this query orders them.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        let primary = match &self.order {
            Some(sort) if sort.ascending => sort.field.value(a).cmp(&sort.field.value(b)),
            Some(sort) => sort.field.value(b).cmp(&sort.field.value(a)),
            None => Ordering::Equal,
        };
        primary.then_with(|| a.id().cmp(b.id()))
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            order: self.order.clone(),
            skip: self.skip,
            take: self.take,
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filter", &self.filter)
            .field("order", &self.order)
            .field("skip", &self.skip)
            .field("take", &self.take)
            .finish()
    }
}

/// The three reads one tabular request needs.
pub struct BuiltQuery<T> {
    /// Unfiltered scan, counted for `total_count`.
    pub base: Query<T>,
    /// Filtered scan, counted for `filtered_count`.
    pub filtered: Query<T>,
    /// Filtered, ordered and windowed; fetched for the page.
    pub page: Query<T>,
}

/// Turns a [`QuerySpec`] into driver queries for one entity type.
pub struct QueryBuilder<T> {
    searchable: Vec<ResolvedField<T>>,
}

impl<T: 'static> QueryBuilder<T> {
    pub fn new(schema: &EntitySchema<T>) -> Self {
        Self {
            searchable: resolver::searchable_fields(schema),
        }
    }

    pub fn searchable(&self) -> &[ResolvedField<T>] {
        &self.searchable
    }

    pub fn build(&self, spec: &QuerySpec<T>) -> BuiltQuery<T> {
        let base = Query::scan();

        let filter = spec
            .filter_text
            .as_deref()
            .and_then(|text| TextFilter::new(text, self.searchable.clone()));
        let filtered = match filter {
            Some(filter) => base.clone().filter(filter),
            None => base.clone(),
        };

        let mut page = filtered.clone().skip(spec.offset).take(spec.limit);
        if let Some(sort) = &spec.sort {
            page = page.order_by(sort.clone());
        }

        BuiltQuery {
            base,
            filtered,
            page,
        }
    }
}

impl<T> Clone for QueryBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            searchable: self.searchable.clone(),
        }
    }
}
