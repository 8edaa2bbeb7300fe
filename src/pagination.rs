//! Turns raw `page`/`limit`/`sort` query values into an effective page request.
//!
//! `page` and `limit` are forgiving: anything unparsable falls back to a default and
//! out-of-range values are clamped. `sort` is strict: it must name one of the sortable
//! fields, so caller text never reaches the query builder.

use std::{fmt, str::FromStr};

use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE: u64 = 1;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageLimits {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self { default_limit: 10, max_limit: 100 }
    }
}

/// Raw query string values, kept as text so malformed numbers degrade to defaults.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<String>,
    /// Page size.
    pub limit: Option<String>,
    /// `<field> [asc|desc]`, where field is one of id, title, description, rating,
    /// created_at, updated_at.
    pub sort: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortField {
    Id,
    Title,
    Description,
    Rating,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::Id,
        SortField::Title,
        SortField::Description,
        SortField::Rating,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Description => "description",
            SortField::Rating => "rating",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str().eq_ignore_ascii_case(raw))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self { field: SortField::Id, direction: SortDirection::Asc }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field.as_str(), self.direction.as_str())
    }
}

impl FromStr for Sort {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            let fields: Vec<_> = SortField::ALL.iter().map(|f| f.as_str()).collect();
            AppError::validation(format!(
                "invalid sort {raw:?}: expected \"<field> [asc|desc]\" with field one of {}",
                fields.join(", ")
            ))
        };

        let mut parts = raw.split_whitespace();
        let Some(field) = parts.next() else {
            return Ok(Sort::default());
        };
        let field = SortField::parse(field).ok_or_else(invalid)?;
        let direction = match parts.next() {
            Some(dir) => SortDirection::parse(dir).ok_or_else(invalid)?,
            None => SortDirection::Asc,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Sort { field, direction })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    pub sort: Sort,
}

impl PageRequest {
    pub fn resolve(query: &PageQuery, limits: PageLimits) -> AppResult<Self> {
        let page = match parse_int(query.page.as_deref()) {
            Some(page) => page.max(DEFAULT_PAGE as i64) as u64,
            None => DEFAULT_PAGE,
        };

        let limit = match parse_int(query.limit.as_deref()) {
            Some(limit) if limit >= 1 => (limit as u64).min(limits.max_limit),
            _ => limits.default_limit,
        };

        let sort = match query.sort.as_deref() {
            Some(raw) => raw.parse()?,
            None => Sort::default(),
        };

        Ok(Self { page, limit, sort })
    }

    /// Row offset of the first record on this page, capped to what SQL backends accept.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit).min(i64::MAX as u64)
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}
