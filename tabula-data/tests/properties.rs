//! Property-based tests for the tabular query laws.
//!
//! For any table, filter, sort and window:
//! - filtered count never exceeds total count
//! - a page never exceeds the limit or the rows left after the offset
//! - a row is counted as filtered iff some searchable field contains the
//!   needle case-insensitively
//! - consecutive pages partition the filtered, sorted sequence
//! - sorting is deterministic

use proptest::prelude::*;
use tabula_data::prelude::*;
use tabula_data::{resolve, MemoryStore, QueryResult};

#[derive(Clone, Debug, PartialEq)]
struct Row {
    id: u32,
    name: String,
    tag: Option<String>,
    score: i64,
}

impl Entity for Row {
    type Id = u32;
    fn table_name() -> &'static str {
        "rows"
    }
    fn id_column() -> &'static str {
        "id"
    }
    fn id(&self) -> &u32 {
        &self.id
    }
    fn schema() -> EntitySchema<Self> {
        EntitySchema::new()
            .field(Field::number("id", |r: &Row| r.id.into()))
            .field(Field::text("name", |r: &Row| r.name.as_str().into()).searchable())
            .field(Field::text("tag", |r: &Row| r.tag.as_deref().into()).searchable())
            .field(Field::number("score", |r: &Row| r.score.into()))
    }
}

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-cA-C]{0,5}").unwrap()
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (text_strategy(), prop::option::of(text_strategy()), -3i64..3),
        0..30,
    )
    .prop_map(|cols| {
        cols.into_iter()
            .enumerate()
            .map(|(i, (name, tag, score))| Row {
                id: i as u32 + 1,
                name,
                tag,
                score,
            })
            .collect()
    })
}

fn sort_strategy() -> impl Strategy<Value = Option<(&'static str, bool)>> {
    prop::option::of((prop::sample::select(vec!["id", "name", "tag", "score"]), any::<bool>()))
}

fn spec(filter: &str, sort: Option<(&str, bool)>, offset: u64, limit: u64) -> QuerySpec<Row> {
    let mut spec = QuerySpec::new(offset, limit).filter(filter);
    if let Some((field, ascending)) = sort {
        let schema = Row::schema();
        spec = spec.sort_by(resolve(&schema, field).unwrap(), ascending);
    }
    spec
}

fn run(rows: &[Row], spec: &QuerySpec<Row>) -> QueryResult<Row> {
    let repo = TableRepository::new(&Row::schema(), MemoryStore::from_rows(rows.to_vec()));
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(repo.execute(spec))
        .unwrap()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

proptest! {
    #[test]
    fn counts_and_page_are_bounded(
        rows in rows_strategy(),
        filter in text_strategy(),
        sort in sort_strategy(),
        offset in 0u64..40,
        limit in 0u64..15,
    ) {
        let result = run(&rows, &spec(&filter, sort, offset, limit));

        prop_assert_eq!(result.total_count, rows.len() as u64);
        prop_assert!(result.filtered_count <= result.total_count);
        let remaining = result.filtered_count.saturating_sub(offset);
        prop_assert!(result.page.len() as u64 <= limit.min(remaining));
        if offset >= result.filtered_count {
            prop_assert!(result.page.is_empty());
        }
    }

    #[test]
    fn membership_matches_case_insensitive_containment(
        rows in rows_strategy(),
        filter in text_strategy(),
    ) {
        let result = run(&rows, &spec(&filter, None, 0, u64::MAX));

        let expected: Vec<u32> = rows
            .iter()
            .filter(|r| {
                filter.is_empty()
                    || contains_ci(&r.name, &filter)
                    || r.tag.as_deref().is_some_and(|t| contains_ci(t, &filter))
            })
            .map(|r| r.id)
            .collect();
        let actual: Vec<u32> = result.page.iter().map(|r| r.id).collect();

        prop_assert_eq!(result.filtered_count, expected.len() as u64);
        prop_assert_eq!(actual, expected);
        if filter.is_empty() {
            prop_assert_eq!(result.filtered_count, result.total_count);
        }
    }

    #[test]
    fn pages_partition_the_sorted_sequence(
        rows in rows_strategy(),
        filter in text_strategy(),
        sort in sort_strategy(),
        limit in 1u64..7,
    ) {
        let all = run(&rows, &spec(&filter, sort, 0, u64::MAX)).page;

        let mut stitched = Vec::new();
        let mut offset = 0;
        while offset < all.len() as u64 {
            let page = run(&rows, &spec(&filter, sort, offset, limit)).page;
            prop_assert!(!page.is_empty());
            stitched.extend(page);
            offset += limit;
        }
        prop_assert_eq!(stitched, all);
    }

    #[test]
    fn sorting_is_deterministic(
        rows in rows_strategy(),
        sort in sort_strategy(),
    ) {
        let first = run(&rows, &spec("", sort, 0, u64::MAX)).page;

        let mut reversed = rows.clone();
        reversed.reverse();
        let second = run(&reversed, &spec("", sort, 0, u64::MAX)).page;

        prop_assert_eq!(&first, &second);
        let again = run(&first, &spec("", sort, 0, u64::MAX)).page;
        prop_assert_eq!(again, first);
    }

    #[test]
    fn unknown_fields_never_resolve(segment in "[a-z]{1,8}") {
        let schema = Row::schema();
        prop_assume!(!["id", "name", "tag", "score"].contains(&segment.as_str()));
        prop_assert!(resolve(&schema, &segment).is_err());
        let nested = format!("name.{segment}");
        prop_assert!(resolve(&schema, &nested).is_err());
    }
}
