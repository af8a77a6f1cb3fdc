use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("limit must be positive, got 0")]
    ZeroLimit,
}

/// Which slice of the full, ordered result list to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    offset: usize,
    limit: Option<usize>,
}

impl PageRequest {
    /// `limit: None` returns everything after `offset`.
    pub fn new(offset: usize, limit: Option<usize>) -> Result<Self, PageError> {
        if limit == Some(0) {
            return Err(PageError::ZeroLimit);
        }
        Ok(Self { offset, limit })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchMetadata {
    pub total_matches: usize,
    pub offset: usize,
    pub limit: Option<usize>,
    pub returned: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub metadata: SearchMetadata,
}

/// Cuts one page out of `items`. An offset past the end yields an empty
/// page rather than an error.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let start = request.offset.min(total);
    let end = match request.limit {
        Some(limit) => start.saturating_add(limit).min(total),
        None => total,
    };
    let results: Vec<T> = items.into_iter().skip(start).take(end - start).collect();

    Page {
        metadata: SearchMetadata {
            total_matches: total,
            offset: request.offset,
            limit: request.limit,
            returned: results.len(),
            has_more: request.offset < total && end < total,
        },
        results,
    }
}
