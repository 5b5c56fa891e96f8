//! Feed query parameters
//!
//! `FeedQuery` is the validated form repositories consume.
//! `FeedQueryParams` is the loose, string-typed form callers collect
//! from a query string or CLI flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Maximum posts per feed page
pub const MAX_FEED_LIMIT: u32 = 20;

/// Default posts per feed page
pub const DEFAULT_FEED_LIMIT: u32 = 20;

/// Maximum number of tags in one filter
pub const MAX_FEED_TAGS: usize = 5;

/// Maximum length of the free-text search
pub const MAX_SEARCH_LEN: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// SQL keyword. Only ever interpolated from this enum, never from input.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ValidationError::InvalidVariant {
                field: "sort",
                value: s.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedQuery {
    pub limit: u32,
    pub offset: u64,
    pub sort: SortDirection,
    /// Case-insensitive substring matched against title or content
    pub search: Option<String>,
    /// A post matches if it carries at least one of these tags
    pub tags: Vec<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FEED_LIMIT,
            offset: 0,
            sort: SortDirection::Desc,
            search: None,
            tags: Vec::new(),
            since: None,
            until: None,
        }
    }
}

impl FeedQuery {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_sort(mut self, sort: SortDirection) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Check server-enforced bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.limit == 0 || self.limit > MAX_FEED_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: "limit",
                min: 1,
                max: MAX_FEED_LIMIT as i64,
                value: self.limit as i64,
            });
        }
        if self.tags.len() > MAX_FEED_TAGS {
            return Err(ValidationError::TooMany {
                field: "tags",
                max: MAX_FEED_TAGS,
            });
        }
        if let Some(search) = &self.search {
            if search.chars().count() > MAX_SEARCH_LEN {
                return Err(ValidationError::TooLong {
                    field: "search",
                    max: MAX_SEARCH_LEN,
                });
            }
        }
        Ok(())
    }

    /// The search term, or `None` when it is absent or blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Unvalidated feed parameters, all optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQueryParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
    /// Comma separated
    pub tags: Option<String>,
    /// RFC 3339
    pub since: Option<String>,
    /// RFC 3339
    pub until: Option<String>,
}

impl FeedQueryParams {
    /// Parse and validate, starting from [`FeedQuery::default`].
    pub fn parse(&self) -> Result<FeedQuery, ValidationError> {
        let mut query = FeedQuery::default();

        if let Some(raw) = non_empty(&self.limit) {
            query.limit = raw.parse().map_err(|_| ValidationError::InvalidFormat {
                field: "limit",
                value: raw.to_owned(),
                reason: "expected a positive integer".to_owned(),
            })?;
        }
        if let Some(raw) = non_empty(&self.offset) {
            query.offset = raw.parse().map_err(|_| ValidationError::InvalidFormat {
                field: "offset",
                value: raw.to_owned(),
                reason: "expected a non-negative integer".to_owned(),
            })?;
        }
        if let Some(raw) = non_empty(&self.sort) {
            query.sort = SortDirection::parse(raw)?;
        }
        if let Some(raw) = non_empty(&self.search) {
            query.search = Some(raw.to_owned());
        }
        if let Some(raw) = non_empty(&self.tags) {
            query.tags = raw
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(raw) = non_empty(&self.since) {
            query.since = Some(parse_timestamp("since", raw)?);
        }
        if let Some(raw) = non_empty(&self.until) {
            query.until = Some(parse_timestamp("until", raw)?);
        }

        query.validate()?;
        Ok(query)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| ValidationError::InvalidFormat {
            field,
            value: raw.to_owned(),
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let query = FeedQuery::default();
        assert_eq!(query.limit, 20);
        assert_eq!(query.sort, SortDirection::Desc);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn limit_bounds() {
        assert!(FeedQuery::default().with_limit(0).validate().is_err());
        assert!(FeedQuery::default().with_limit(1).validate().is_ok());
        assert!(FeedQuery::default().with_limit(20).validate().is_ok());

        let err = FeedQuery::default().with_limit(21).validate().unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "limit", .. }));
    }

    #[test]
    fn too_many_tags() {
        let err = FeedQuery::default()
            .with_tags(["a", "b", "c", "d", "e", "f"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooMany { field: "tags", .. }));
    }

    #[test]
    fn search_length() {
        let long = "x".repeat(101);
        assert!(FeedQuery::default().with_search(long).validate().is_err());
        assert_eq!(FeedQuery::default().with_search("  ").search_term(), None);
        assert_eq!(
            FeedQuery::default().with_search(" go ").search_term(),
            Some("go")
        );
    }

    #[test]
    fn parse_params() {
        let params = FeedQueryParams {
            limit: Some("10".into()),
            offset: Some("30".into()),
            sort: Some("ASC".into()),
            search: Some("travel".into()),
            tags: Some("art, books,,".into()),
            since: Some("2024-01-01T00:00:00Z".into()),
            until: None,
        };
        let query = params.parse().expect("valid params");
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 30);
        assert_eq!(query.sort, SortDirection::Asc);
        assert_eq!(query.search.as_deref(), Some("travel"));
        assert_eq!(query.tags, vec!["art".to_string(), "books".to_string()]);
        assert!(query.since.is_some());
        assert!(query.until.is_none());
    }

    #[test]
    fn parse_rejects_garbage() {
        let params = FeedQueryParams {
            limit: Some("ten".into()),
            ..Default::default()
        };
        assert!(params.parse().is_err());

        let params = FeedQueryParams {
            sort: Some("sideways".into()),
            ..Default::default()
        };
        assert!(matches!(
            params.parse().unwrap_err(),
            ValidationError::InvalidVariant { field: "sort", .. }
        ));

        let params = FeedQueryParams {
            since: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(params.parse().is_err());
    }
}
