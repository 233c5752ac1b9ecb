//! Context Extractor: principal, pagination and search parameters.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use axum_helpers::AppError;
use rpc::accounts as pb;
use serde::Deserialize;
use std::num::IntErrorKind;
use utoipa::IntoParams;

use crate::models::{AccountStatus, Principal, Role};
use crate::validation::role_message;

pub const DEFAULT_PAGE_SIZE: i32 = 10;
pub const MAX_PAGE_SIZE: i32 = 100;

/// Columns `sort_by` may name.
pub const SORTABLE_FIELDS: [&str; 8] = [
    "id",
    "name",
    "email",
    "role",
    "status",
    "branch_id",
    "created_at",
    "updated_at",
];
pub const DEFAULT_SORT_FIELD: &str = "created_at";

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
    }
}

fn query_rejection() -> AppError {
    AppError::BadRequest("invalid query string".to_string())
}

/// Blank query values count as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Pagination
// ============================================================================

/// Raw `page` / `page_size` query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number (default 1)
    #[param(value_type = Option<i32>)]
    pub page: Option<String>,
    /// Items per page, 1..=100 (default 10, larger values are clamped)
    #[param(value_type = Option<i32>)]
    pub page_size: Option<String>,
    /// Checked against the role whitelist when present
    pub role: Option<String>,
    /// Checked against the status whitelist when present
    pub status: Option<String>,
    /// Checked against the sortable columns when present
    pub sort_by: Option<String>,
    /// Checked against `asc`, `desc` when present
    pub sort_order: Option<String>,
}

/// Validated page cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i32,
    pub page_size: i32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Result<Self, AppError> {
        let page = match page {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(p) if p >= 1 => i32::try_from(p)
                    .map_err(|_| AppError::BadRequest("page is too large".to_string()))?,
                Ok(_) => return Err(AppError::BadRequest("page must be >= 1".to_string())),
                Err(_) => {
                    return Err(AppError::BadRequest(
                        "page must be a positive integer".to_string(),
                    ));
                }
            },
        };

        let page_size = match page_size {
            None => DEFAULT_PAGE_SIZE,
            Some(raw) => match raw.parse::<i64>() {
                Ok(s) if s >= 1 => s.min(i64::from(MAX_PAGE_SIZE)) as i32,
                Ok(_) => {
                    return Err(AppError::BadRequest("page_size must be >= 1".to_string()));
                }
                // All digits but wider than i64: still just "too many".
                Err(e) if *e.kind() == IntErrorKind::PosOverflow => MAX_PAGE_SIZE,
                Err(_) => {
                    return Err(AppError::BadRequest(
                        "page_size must be a positive integer".to_string(),
                    ));
                }
            },
        };

        Ok(Self { page, page_size })
    }

    pub fn to_proto(self) -> pb::Pagination {
        pb::Pagination {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

impl TryFrom<&PaginationParams> for Pagination {
    type Error = AppError;

    /// List routes forward only the cursor, but enumerated parameters are
    /// held to the same whitelists as on the search route.
    fn try_from(params: &PaginationParams) -> Result<Self, Self::Error> {
        parse_role(present(&params.role))?;
        parse_statuses(present(&params.status))?;
        parse_sort_by(present(&params.sort_by))?;
        parse_sort_order(present(&params.sort_order))?;
        Pagination::parse(present(&params.page), present(&params.page_size))
    }
}

impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) =
            Query::<PaginationParams>::try_from_uri(&parts.uri).map_err(|_| query_rejection())?;
        Pagination::try_from(&params)
    }
}

// ============================================================================
// Search
// ============================================================================

/// Raw query parameters of `GET /accounts/search`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Free text matched against name and email
    pub q: Option<String>,
    /// One of `admin`, `user`, `manager`
    pub role: Option<String>,
    #[param(value_type = Option<i64>)]
    pub branch_id: Option<String>,
    /// Comma-separated statuses, e.g. `active,pending`
    pub status: Option<String>,
    /// Sort column (default `created_at`)
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default `desc`)
    pub sort_order: Option<String>,
    #[param(value_type = Option<i32>)]
    pub page: Option<String>,
    #[param(value_type = Option<i32>)]
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Validated search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub role: Option<Role>,
    pub branch_id: Option<i64>,
    pub statuses: Vec<AccountStatus>,
    pub sort_by: &'static str,
    pub sort_order: SortOrder,
    pub pagination: Pagination,
}

impl SearchQuery {
    pub fn parse(params: &SearchParams) -> Result<Self, AppError> {
        let branch_id = present(&params.branch_id)
            .map(|raw| match raw.parse::<i64>() {
                Ok(id) if id >= 1 => Ok(id),
                _ => Err(AppError::BadRequest(
                    "branch_id must be a positive integer".to_string(),
                )),
            })
            .transpose()?;

        Ok(Self {
            q: present(&params.q).map(String::from),
            role: parse_role(present(&params.role))?,
            branch_id,
            statuses: parse_statuses(present(&params.status))?,
            sort_by: parse_sort_by(present(&params.sort_by))?,
            sort_order: parse_sort_order(present(&params.sort_order))?,
            pagination: Pagination::parse(present(&params.page), present(&params.page_size))?,
        })
    }

    pub fn to_proto(&self, actor_id: i64) -> pb::SearchUsersRequest {
        pb::SearchUsersRequest {
            query: self.q.clone().unwrap_or_default(),
            role: self.role.map(|r| r.as_str().to_string()),
            branch_id: self.branch_id,
            status: self.statuses.iter().map(|s| s.as_str().to_string()).collect(),
            sort: Some(pb::SortOptions {
                sort_by: self.sort_by.to_string(),
                sort_order: self.sort_order.as_str().to_string(),
            }),
            pagination: Some(self.pagination.to_proto()),
            actor_id,
        }
    }
}

fn parse_role(raw: Option<&str>) -> Result<Option<Role>, AppError> {
    raw.map(|r| {
        r.parse::<Role>()
            .map_err(|_| AppError::BadRequest(format!("role {}", role_message())))
    })
    .transpose()
}

/// Comma-separated set, duplicates dropped, order kept.
fn parse_statuses(raw: Option<&str>) -> Result<Vec<AccountStatus>, AppError> {
    let mut statuses = Vec::new();
    let Some(raw) = raw else {
        return Ok(statuses);
    };
    for value in raw.split(',').map(str::trim).filter(|v| !v.is_empty()) {
        let status = value.parse::<AccountStatus>().map_err(|_| {
            AppError::BadRequest(format!(
                "status '{value}' must be one of active, inactive, suspended, pending"
            ))
        })?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    Ok(statuses)
}

fn parse_sort_by(raw: Option<&str>) -> Result<&'static str, AppError> {
    match raw {
        None => Ok(DEFAULT_SORT_FIELD),
        Some(field) => SORTABLE_FIELDS
            .into_iter()
            .find(|f| *f == field)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "sort_by must be one of {}",
                    SORTABLE_FIELDS.join(", ")
                ))
            }),
    }
}

fn parse_sort_order(raw: Option<&str>) -> Result<SortOrder, AppError> {
    match raw {
        None | Some("desc") => Ok(SortOrder::Desc),
        Some("asc") => Ok(SortOrder::Asc),
        Some(_) => Err(AppError::BadRequest(
            "sort_order must be one of asc, desc".to_string(),
        )),
    }
}

impl<S> FromRequestParts<S> for SearchQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) =
            Query::<SearchParams>::try_from_uri(&parts.uri).map_err(|_| query_rejection())?;
        SearchQuery::parse(&params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(pairs: &[(&str, &str)]) -> Result<SearchQuery, AppError> {
        let mut params = SearchParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "q" => params.q = value,
                "role" => params.role = value,
                "branch_id" => params.branch_id = value,
                "status" => params.status = value,
                "sort_by" => params.sort_by = value,
                "sort_order" => params.sort_order = value,
                "page" => params.page = value,
                "page_size" => params.page_size = value,
                other => panic!("unexpected key {other}"),
            }
        }
        SearchQuery::parse(&params)
    }

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(Pagination::parse(None, None).unwrap(), Pagination::default());
    }

    #[test]
    fn test_page_size_is_clamped() {
        let p = Pagination::parse(Some("1"), Some("1000")).unwrap();
        assert_eq!(p.page_size, MAX_PAGE_SIZE);

        let p = Pagination::parse(Some("1"), Some("99999999999999999999")).unwrap();
        assert_eq!(p.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_list_params_enforce_whitelists() {
        let ok = PaginationParams {
            role: Some("admin".into()),
            status: Some("active,pending".into()),
            sort_by: Some("name".into()),
            sort_order: Some("asc".into()),
            ..Default::default()
        };
        assert_eq!(Pagination::try_from(&ok).unwrap(), Pagination::default());

        let cases = [
            PaginationParams { role: Some("root".into()), ..Default::default() },
            PaginationParams { status: Some("banana".into()), ..Default::default() },
            PaginationParams { sort_by: Some("password".into()), ..Default::default() },
            PaginationParams { sort_order: Some("up".into()), ..Default::default() },
        ];
        for params in cases {
            assert!(
                matches!(Pagination::try_from(&params), Err(AppError::BadRequest(_))),
                "{params:?}"
            );
        }
    }

    #[test]
    fn test_pagination_rejects_bad_values() {
        for (page, size) in [
            (Some("0"), None),
            (Some("-1"), None),
            (Some("one"), None),
            (None, Some("0")),
            (None, Some("ten")),
            (Some("99999999999"), None),
        ] {
            assert!(
                matches!(Pagination::parse(page, size), Err(AppError::BadRequest(_))),
                "{page:?} {size:?}"
            );
        }
    }

    #[test]
    fn test_search_defaults() {
        let q = search(&[]).unwrap();
        assert_eq!(q.sort_by, "created_at");
        assert_eq!(q.sort_order, SortOrder::Desc);
        assert!(q.statuses.is_empty());
        assert_eq!(q.role, None);
    }

    #[test]
    fn test_search_parses_statuses() {
        let q = search(&[("status", "active, pending,active")]).unwrap();
        assert_eq!(q.statuses, vec![AccountStatus::Active, AccountStatus::Pending]);
    }

    #[test]
    fn test_search_rejects_values_outside_whitelists() {
        for pair in [
            ("status", "active,banana"),
            ("role", "Admin"),
            ("sort_by", "password"),
            ("sort_order", "random"),
            ("branch_id", "0"),
        ] {
            assert!(
                matches!(search(&[pair]), Err(AppError::BadRequest(_))),
                "{pair:?}"
            );
        }
    }

    #[test]
    fn test_search_to_proto() {
        let q = search(&[
            ("q", "ada"),
            ("role", "manager"),
            ("branch_id", "4"),
            ("sort_by", "name"),
            ("sort_order", "asc"),
            ("page_size", "500"),
        ])
        .unwrap();
        let proto = q.to_proto(12);

        assert_eq!(proto.query, "ada");
        assert_eq!(proto.role.as_deref(), Some("manager"));
        assert_eq!(proto.branch_id, Some(4));
        assert_eq!(proto.sort.unwrap().sort_order, "asc");
        assert_eq!(proto.pagination.unwrap().page_size, 100);
        assert_eq!(proto.actor_id, 12);
    }
}
