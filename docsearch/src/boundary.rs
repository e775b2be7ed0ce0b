//! Caller-facing parameters.
//!
//! Raw, loosely typed input (query-string style) is checked and converted
//! into a [`SearchRequest`] here, so malformed values are rejected before the
//! engine sees them.

use crate::config::SearchConfig;
use crate::interface::{DocSearchError, DocSearchResult, SearchHit, SearchPage};
use crate::query::{SearchFilters, SearchRequest, MAX_LIMIT};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::{Validate, ValidationErrors};

/// Search parameters as a caller sends them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct SearchParams {
    #[validate(length(min = 1, max = 1000))]
    pub q: String,
    /// Exact file type; empty means no filter
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub folder_id: Option<i64>,
    /// Comma-separated tag ids, e.g. `"1,2,3"`
    #[serde(default)]
    pub tag_ids: Option<String>,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    #[serde(default)]
    pub skip: usize,
    #[validate(range(min = 1, max = 100))]
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchParams {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    /// Validate and convert. `config` supplies the default and maximum page
    /// size.
    pub fn into_request(self, config: &SearchConfig) -> DocSearchResult<SearchRequest> {
        self.validate().map_err(validation_error)?;

        let query = self.q.trim();
        if query.is_empty() {
            return Err(DocSearchError::InvalidQuery("query must not be blank".into()));
        }

        let limit = self.limit.unwrap_or(config.default_limit);
        let max_limit = config.max_limit.min(MAX_LIMIT);
        if limit > max_limit {
            return Err(DocSearchError::InvalidFilterValue(format!(
                "limit must be between 1 and {}, got {}",
                max_limit, limit
            )));
        }

        let filters = SearchFilters {
            file_type: self.file_type.filter(|t| !t.is_empty()),
            folder_id: self.folder_id,
            tag_ids: self.tag_ids.as_deref().map(parse_tag_ids).transpose()?.flatten(),
            date_from: self.date_from.as_deref().map(|v| parse_datetime("date_from", v)).transpose()?,
            date_to: self.date_to.as_deref().map(|v| parse_datetime("date_to", v)).transpose()?,
        };

        Ok(SearchRequest {
            query: query.to_string(),
            filters,
            skip: self.skip,
            limit,
        })
    }
}

fn validation_error(errors: ValidationErrors) -> DocSearchError {
    if errors.field_errors().contains_key("q") {
        DocSearchError::InvalidQuery("query must be between 1 and 1000 characters".into())
    } else {
        DocSearchError::InvalidFilterValue(errors.to_string())
    }
}

/// Parse `"1, 2,3"` into tag ids. Blank pieces are skipped; an input with
/// no ids at all means "no tag filter".
pub fn parse_tag_ids(raw: &str) -> DocSearchResult<Option<Vec<i64>>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            piece
                .parse::<i64>()
                .map_err(|_| DocSearchError::InvalidFilterValue(format!("Invalid tag_ids format: '{}'", raw)))
        })
        .collect::<DocSearchResult<Vec<i64>>>()?;
    Ok((!ids.is_empty()).then_some(ids))
}

/// RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]`, or a bare date. Values without
/// an offset are read as UTC.
pub fn parse_datetime(field: &str, raw: &str) -> DocSearchResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    Err(DocSearchError::InvalidFilterValue(format!(
        "{} is not a valid datetime: '{}'",
        field, raw
    )))
}

/// Search result as returned to a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub items: Vec<SearchHit>,
    pub total: usize,
    pub took_ms: u64,
}

impl SearchResponse {
    pub fn timed(page: SearchPage, started: Instant) -> Self {
        Self {
            items: page.items,
            total: page.total,
            took_ms: started.elapsed().as_millis() as u64,
        }
    }
}
