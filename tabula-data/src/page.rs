use serde::Serialize;

/// One page of a tabular query together with both counts.
///
/// `total_count` ignores the filter; `filtered_count` is the number of rows
/// the filter admits, before the offset/limit window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    pub total_count: u64,
    pub filtered_count: u64,
    pub page: Vec<T>,
}

impl<T> QueryResult<T> {
    pub fn new(total_count: u64, filtered_count: u64, page: Vec<T>) -> Self {
        Self {
            total_count,
            filtered_count,
            page,
        }
    }

    pub fn empty() -> Self {
        Self::new(0, 0, Vec::new())
    }

    /// Convert the page rows, keeping the counts.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> QueryResult<U> {
        QueryResult {
            total_count: self.total_count,
            filtered_count: self.filtered_count,
            page: self.page.into_iter().map(f).collect(),
        }
    }
}
