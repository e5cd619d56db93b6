//! DataTables server-side processing protocol.
//!
//! The browser widget posts form fields such as `draw`, `start`, `length`,
//! `order[0][column]`, `order[0][dir]`, `columns[N][data]` and
//! `search[value]`, and expects `{draw, recordsTotal, recordsFiltered, data}`
//! back.
//!
//! The widget's "All" option sends `length=-1`. That is read as an absent
//! length, so the configured default (and `max_length` cap) applies instead
//! of an empty page.

use std::collections::HashMap;

use serde::Serialize;
use tabula_data::{QueryResult, TableRequest};

/// A parsed DataTables request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTablesRequest {
    /// Request counter, echoed back so the widget can drop stale replies.
    pub draw: i64,
    pub table: TableRequest,
}

impl DataTablesRequest {
    /// Read the protocol fields from a flat form map.
    ///
    /// The sort field is the `data` name of the column referenced by
    /// `order[0][column]`. Malformed numbers are treated as absent.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let get = |key: &str| form.get(key).map(String::as_str);
        let int = |key: &str| get(key).and_then(|v| v.trim().parse::<i64>().ok());

        let sort_field = get("order[0][column]")
            .and_then(|index| get(&format!("columns[{}][data]", index.trim())))
            .map(str::to_string);

        Self {
            draw: int("draw").unwrap_or(0),
            table: TableRequest {
                start: int("start"),
                length: int("length").filter(|&length| length != -1),
                sort_field,
                sort_direction: get("order[0][dir]").map(str::to_string),
                search: get("search[value]").map(str::to_string),
            },
        }
    }
}

/// The DataTables reply body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTablesResponse<V> {
    pub draw: i64,
    pub records_total: u64,
    /// Rows admitted by the search, before paging.
    pub records_filtered: u64,
    pub data: Vec<V>,
}

impl<V> DataTablesResponse<V> {
    pub fn new(draw: i64, result: QueryResult<V>) -> Self {
        Self {
            draw,
            records_total: result.total_count,
            records_filtered: result.filtered_count,
            data: result.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn maps_order_column_to_its_data_name() {
        let req = DataTablesRequest::from_form(&form(&[
            ("draw", "3"),
            ("start", "20"),
            ("length", "10"),
            ("columns[0][data]", "id"),
            ("columns[1][data]", "name"),
            ("order[0][column]", "1"),
            ("order[0][dir]", "desc"),
            ("search[value]", "Garden"),
        ]));
        assert_eq!(req.draw, 3);
        assert_eq!(req.table.start, Some(20));
        assert_eq!(req.table.length, Some(10));
        assert_eq!(req.table.sort_field.as_deref(), Some("name"));
        assert_eq!(req.table.sort_direction.as_deref(), Some("desc"));
        assert_eq!(req.table.search.as_deref(), Some("Garden"));
    }

    #[test]
    fn missing_fields_are_absent() {
        let req = DataTablesRequest::from_form(&form(&[("draw", "x"), ("order[0][column]", "4")]));
        assert_eq!(req, DataTablesRequest::default());
    }

    #[test]
    fn show_all_length_is_absent() {
        let req = DataTablesRequest::from_form(&form(&[("draw", "1"), ("length", "-1")]));
        assert_eq!(req.table.length, None);

        let req = DataTablesRequest::from_form(&form(&[("length", "-5")]));
        assert_eq!(req.table.length, Some(-5));
    }

    #[test]
    fn response_reports_filtered_count() {
        let resp = DataTablesResponse::new(7, QueryResult::new(10, 4, vec!["a"]));
        assert_eq!(resp.records_total, 10);
        assert_eq!(resp.records_filtered, 4);
    }
}
