use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::config::ContentConfig;
use crate::db::queries;
use crate::errors::{Error, ErrorCode, ErrorResponse};
use crate::metrics::VALIDATION_REJECTIONS_TOTAL;
use crate::models::mod_version::{ModSummary, ModVersionResource, ModVersionUpdate};
use crate::models::rating::GlobalRating;
use crate::query::{parse_filter, parse_sort, SortSpec};
use crate::resources::{OrderBy, Predicate, ResourceRegistry, GLOBAL_RATING, MOD_VERSION};

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub pool: PgPool,
    pub registry: ResourceRegistry,
    pub content: ContentConfig,
    pub instance_id: String,
}

/// Generic API response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present if success is true)
    pub data: Option<T>,
    /// Error details (present if success is false)
    pub error: Option<crate::errors::ErrorDetail>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// List query parameters shared by collection endpoints
#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct ListParams {
    /// Conjunctive filter expression (e.g. "ranked==true;type==UI")
    pub filter: Option<String>,
    /// Sort field, prefix with '-' for descending (e.g. "-createTime")
    pub sort: Option<String>,
    /// Relation to include alongside the results (e.g. "mod")
    pub include: Option<String>,
    /// Page number for pagination (starts at 1)
    pub page: Option<usize>,
    /// Number of results per page (default: 100, max: 1000)
    pub page_size: Option<usize>,
}

/// Include parameter for single-resource fetches
#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct IncludeParams {
    /// Relation to include alongside the resource (e.g. "mod")
    pub include: Option<String>,
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// Array of results for the current page
    pub data: Vec<T>,
    /// Total number of results across all pages
    pub total: usize,
    /// Current page number
    pub page: usize,
    /// Number of results per page
    pub page_size: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Whether there are more pages available
    pub has_more: bool,
    /// Related resources requested via include
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ModSummary>>,
}

/// A single mod version with optionally included relations
#[derive(Debug, Serialize, ToSchema)]
pub struct ModVersionDocument {
    #[serde(flatten)]
    pub version: ModVersionResource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ModSummary>>,
}

// Concrete response types for OpenAPI generation
/// Mod version response
#[derive(Debug, Serialize, ToSchema)]
pub struct ModVersionResponse {
    pub success: bool,
    pub data: Option<ModVersionDocument>,
    pub error: Option<crate::errors::ErrorDetail>,
}

/// Paginated mod version list response
#[derive(Debug, Serialize, ToSchema)]
pub struct ModVersionListResponse {
    pub success: bool,
    pub data: Option<PaginatedModVersionData>,
    pub error: Option<crate::errors::ErrorDetail>,
}

/// Paginated mod version data
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedModVersionData {
    /// Array of results for the current page
    pub data: Vec<ModVersionResource>,
    /// Total number of results across all pages
    pub total: usize,
    /// Current page number
    pub page: usize,
    /// Number of results per page
    pub page_size: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Whether there are more pages available
    pub has_more: bool,
    /// Owning mods, present when include=mod was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ModSummary>>,
}

/// Global rating response
#[derive(Debug, Serialize, ToSchema)]
pub struct GlobalRatingResponse {
    pub success: bool,
    pub data: Option<GlobalRating>,
    pub error: Option<crate::errors::ErrorDetail>,
}

/// Paginated global rating list response
#[derive(Debug, Serialize, ToSchema)]
pub struct GlobalRatingListResponse {
    pub success: bool,
    pub data: Option<PaginatedGlobalRatingData>,
    pub error: Option<crate::errors::ErrorDetail>,
}

/// Paginated global rating data
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedGlobalRatingData {
    /// Array of results for the current page
    pub data: Vec<GlobalRating>,
    /// Total number of results across all pages
    pub total: usize,
    /// Current page number
    pub page: usize,
    /// Number of results per page
    pub page_size: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Whether there are more pages available
    pub has_more: bool,
}

/// Record a pre-storage rejection and convert it into a response
fn rejected(error: Error) -> Response {
    VALIDATION_REJECTIONS_TOTAL
        .with_label_values(&[&error.code().to_string()])
        .inc();
    info!("Request rejected: {}", error);
    error.into_response()
}

fn pagination(params: &ListParams) -> (usize, usize, i64, i64) {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(100).clamp(1, 1000);
    let limit = page_size as i64;
    // Absurd page numbers saturate instead of overflowing; the query then
    // simply returns an empty page.
    let offset = i64::try_from(page.saturating_sub(1).saturating_mul(page_size))
        .unwrap_or(i64::MAX);
    (page, page_size, limit, offset)
}

fn paginate<T>(
    data: Vec<T>,
    total: usize,
    page: usize,
    page_size: usize,
    included: Option<Vec<ModSummary>>,
) -> PaginatedResponse<T> {
    let total_pages = (total + page_size - 1) / page_size;
    PaginatedResponse {
        data,
        total,
        page,
        page_size,
        total_pages,
        has_more: page < total_pages,
        included,
    }
}

/// Resolve filter and sort parameters against the registry
fn resolve_list_query(
    registry: &ResourceRegistry,
    resource: &str,
    params: &ListParams,
    default_sort: &str,
) -> Result<(Vec<Predicate>, OrderBy), Error> {
    let predicates = match &params.filter {
        Some(expression) => {
            let terms = parse_filter(expression)?;
            registry.resolve_filters(resource, &terms)?
        }
        None => Vec::new(),
    };

    let sort = params
        .sort
        .as_deref()
        .map(parse_sort)
        .unwrap_or_else(|| SortSpec {
            field: default_sort.to_string(),
            descending: false,
        });
    let order = registry.resolve_sort(resource, &sort)?;

    Ok((predicates, order))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = serde_json::Value)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "modvault-api",
        "version": env!("CARGO_PKG_VERSION"),
        "instance_id": state.instance_id,
        "uptime_seconds": START_TIME.elapsed().as_secs(),
    }))
}

/// List mod versions
#[utoipa::path(
    get,
    path = "/data/modVersion",
    tag = "modVersion",
    params(ListParams),
    responses(
        (status = 200, description = "Mod version listing", body = ModVersionListResponse),
        (status = 400, description = "Invalid filter, sort or include parameter", body = ModVersionListResponse),
        (status = 503, description = "Database unavailable", body = ModVersionListResponse)
    )
)]
pub async fn list_mod_versions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    info!(
        "List mod versions: filter={:?}, sort={:?}, include={:?}, page={:?}, page_size={:?}",
        params.filter, params.sort, params.include, params.page, params.page_size
    );

    let (predicates, order) =
        match resolve_list_query(&state.registry, MOD_VERSION, &params, "id") {
            Ok(resolved) => resolved,
            Err(e) => return rejected(e),
        };

    let include_mod = match &params.include {
        Some(include) => match state.registry.resolve_include(MOD_VERSION, include) {
            Ok(_) => true,
            Err(e) => return rejected(e),
        },
        None => false,
    };

    let (page, page_size, limit, offset) = pagination(&params);

    let versions =
        match queries::list_mod_versions(&state.pool, &predicates, &order, limit, offset).await {
            Ok(versions) => versions,
            Err(e) => {
                error!("List mod versions failed: {}", e);
                return ErrorResponse::database_error(format!("Failed to list mod versions: {}", e))
                    .into_response();
            }
        };

    let total = match queries::count_mod_versions(&state.pool, &predicates).await {
        Ok(total) => total as usize,
        Err(e) => {
            error!("Count mod versions failed: {}", e);
            return ErrorResponse::database_error(format!("Failed to count mod versions: {}", e))
                .into_response();
        }
    };

    let included = if include_mod {
        let mod_ids: Vec<i32> = versions
            .iter()
            .map(|v| v.mod_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        match queries::get_mod_summaries(&state.pool, &mod_ids).await {
            Ok(summaries) => Some(summaries),
            Err(e) => {
                error!("Include mod failed: {}", e);
                return ErrorResponse::database_error(format!("Failed to include mods: {}", e))
                    .into_response();
            }
        }
    } else {
        None
    };

    let resources: Vec<ModVersionResource> = versions
        .into_iter()
        .map(|v| v.into_resource(&state.content.base_url))
        .collect();

    info!(
        "List mod versions returned {} of {} (page {})",
        resources.len(),
        total,
        page
    );

    let response = paginate(resources, total, page, page_size, included);
    (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
}

/// Get a specific mod version by ID
#[utoipa::path(
    get,
    path = "/data/modVersion/{id}",
    tag = "modVersion",
    params(
        ("id" = i32, Path, description = "Mod version ID"),
        IncludeParams
    ),
    responses(
        (status = 200, description = "Mod version found", body = ModVersionResponse),
        (status = 404, description = "Mod version not found", body = ModVersionResponse),
        (status = 503, description = "Database unavailable", body = ModVersionResponse)
    )
)]
pub async fn get_mod_version(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<IncludeParams>,
) -> impl IntoResponse {
    info!("Get mod version: id={}, include={:?}", id, params.include);

    let include_mod = match &params.include {
        Some(include) => match state.registry.resolve_include(MOD_VERSION, include) {
            Ok(_) => true,
            Err(e) => return rejected(e),
        },
        None => false,
    };

    let version = match queries::get_mod_version(&state.pool, id).await {
        Ok(Some(version)) => version,
        Ok(None) => {
            info!("Mod version not found: {}", id);
            return ErrorResponse::entity_not_found(MOD_VERSION, id).into_response();
        }
        Err(e) => {
            error!("Get mod version failed: {}", e);
            return ErrorResponse::database_error(format!("Failed to fetch mod version: {}", e))
                .into_response();
        }
    };

    let included = if include_mod {
        match queries::get_mod_summaries(&state.pool, &[version.mod_id]).await {
            Ok(summaries) => Some(summaries),
            Err(e) => {
                error!("Include mod failed: {}", e);
                return ErrorResponse::database_error(format!("Failed to include mods: {}", e))
                    .into_response();
            }
        }
    } else {
        None
    };

    let document = ModVersionDocument {
        version: version.into_resource(&state.content.base_url),
        included,
    };

    (StatusCode::OK, Json(ApiResponse::success(document))).into_response()
}

/// Apply a moderation update to a mod version
///
/// Accepts only the writable attributes; writes to computed, relation or
/// immutable attributes are rejected before any query runs.
#[utoipa::path(
    patch,
    path = "/data/modVersion/{id}",
    tag = "modVersion",
    params(
        ("id" = i32, Path, description = "Mod version ID")
    ),
    request_body = ModVersionUpdate,
    responses(
        (status = 200, description = "Mod version updated", body = ModVersionResponse),
        (status = 400, description = "Payload touches a non-writable attribute", body = ModVersionResponse),
        (status = 404, description = "Mod version not found", body = ModVersionResponse),
        (status = 503, description = "Database unavailable", body = ModVersionResponse)
    )
)]
pub async fn patch_mod_version(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    info!("Patch mod version: id={}", id);

    let payload = match body.as_object() {
        Some(map) => map,
        None => {
            return rejected(
                Error::new(ErrorCode::ValidationFailed)
                    .with_arg("request body must be a JSON object"),
            );
        }
    };

    if let Err(e) = state.registry.validate_write(MOD_VERSION, payload) {
        return rejected(e);
    }

    // Safe after registry validation: only writable fields remain
    let update: ModVersionUpdate = match serde_json::from_value(body.clone()) {
        Ok(update) => update,
        Err(e) => {
            return rejected(
                Error::new(ErrorCode::ValidationFailed).with_arg(format!("{}", e)),
            );
        }
    };

    match queries::update_mod_version(&state.pool, id, &update).await {
        Ok(Some(version)) => {
            info!("Mod version {} updated", id);
            let document = ModVersionDocument {
                version: version.into_resource(&state.content.base_url),
                included: None,
            };
            (StatusCode::OK, Json(ApiResponse::success(document))).into_response()
        }
        Ok(None) => {
            info!("Mod version not found: {}", id);
            ErrorResponse::entity_not_found(MOD_VERSION, id).into_response()
        }
        Err(e) => {
            error!("Patch mod version failed: {}", e);
            ErrorResponse::database_error(format!("Failed to update mod version: {}", e))
                .into_response()
        }
    }
}

/// List global rating entries
#[utoipa::path(
    get,
    path = "/data/globalRating",
    tag = "globalRating",
    params(ListParams),
    responses(
        (status = 200, description = "Global rating listing", body = GlobalRatingListResponse),
        (status = 400, description = "Invalid filter or sort parameter", body = GlobalRatingListResponse),
        (status = 503, description = "Database unavailable", body = GlobalRatingListResponse)
    )
)]
pub async fn list_global_ratings(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    info!(
        "List global ratings: filter={:?}, sort={:?}, page={:?}, page_size={:?}",
        params.filter, params.sort, params.page, params.page_size
    );

    let (predicates, order) =
        match resolve_list_query(&state.registry, GLOBAL_RATING, &params, "ranking") {
            Ok(resolved) => resolved,
            Err(e) => return rejected(e),
        };

    if let Some(include) = &params.include {
        // globalRating has no relations; resolve_include always rejects
        if let Err(e) = state.registry.resolve_include(GLOBAL_RATING, include) {
            return rejected(e);
        }
    }

    let (page, page_size, limit, offset) = pagination(&params);

    let ratings =
        match queries::list_global_ratings(&state.pool, &predicates, &order, limit, offset).await {
            Ok(ratings) => ratings,
            Err(e) => {
                error!("List global ratings failed: {}", e);
                return ErrorResponse::database_error(format!(
                    "Failed to list global ratings: {}",
                    e
                ))
                .into_response();
            }
        };

    let total = match queries::count_global_ratings(&state.pool, &predicates).await {
        Ok(total) => total as usize,
        Err(e) => {
            error!("Count global ratings failed: {}", e);
            return ErrorResponse::database_error(format!(
                "Failed to count global ratings: {}",
                e
            ))
            .into_response();
        }
    };

    info!(
        "List global ratings returned {} of {} (page {})",
        ratings.len(),
        total,
        page
    );

    let response = paginate(ratings, total, page, page_size, None);
    (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
}

/// Get a specific global rating entry by player ID
#[utoipa::path(
    get,
    path = "/data/globalRating/{id}",
    tag = "globalRating",
    params(
        ("id" = i32, Path, description = "Player ID")
    ),
    responses(
        (status = 200, description = "Global rating found", body = GlobalRatingResponse),
        (status = 404, description = "Global rating not found", body = GlobalRatingResponse),
        (status = 503, description = "Database unavailable", body = GlobalRatingResponse)
    )
)]
pub async fn get_global_rating(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    info!("Get global rating: id={}", id);

    match queries::get_global_rating(&state.pool, id).await {
        Ok(Some(rating)) => (StatusCode::OK, Json(ApiResponse::success(rating))).into_response(),
        Ok(None) => {
            info!("Global rating not found: {}", id);
            ErrorResponse::entity_not_found(GLOBAL_RATING, id).into_response()
        }
        Err(e) => {
            error!("Get global rating failed: {}", e);
            ErrorResponse::database_error(format!("Failed to fetch global rating: {}", e))
                .into_response()
        }
    }
}

/// Reject creation of global rating entries
///
/// The resource is a read-only projection; the route exists so the
/// rejection carries the structured code and message contract.
#[utoipa::path(
    post,
    path = "/data/globalRating",
    tag = "globalRating",
    responses(
        (status = 403, description = "Resource is read-only", body = GlobalRatingResponse)
    )
)]
pub async fn create_global_rating(State(state): State<AppState>) -> impl IntoResponse {
    rejected(state.registry.reject_read_only(GLOBAL_RATING))
}

/// Reject updates to global rating entries
#[utoipa::path(
    patch,
    path = "/data/globalRating/{id}",
    tag = "globalRating",
    params(
        ("id" = i32, Path, description = "Player ID")
    ),
    responses(
        (status = 403, description = "Resource is read-only", body = GlobalRatingResponse)
    )
)]
pub async fn patch_global_rating(
    State(state): State<AppState>,
    Path(_id): Path<i32>,
) -> impl IntoResponse {
    rejected(state.registry.reject_read_only(GLOBAL_RATING))
}

/// Reject deletion of global rating entries
#[utoipa::path(
    delete,
    path = "/data/globalRating/{id}",
    tag = "globalRating",
    params(
        ("id" = i32, Path, description = "Player ID")
    ),
    responses(
        (status = 403, description = "Resource is read-only", body = GlobalRatingResponse)
    )
)]
pub async fn delete_global_rating(
    State(state): State<AppState>,
    Path(_id): Path<i32>,
) -> impl IntoResponse {
    rejected(state.registry.reject_read_only(GLOBAL_RATING))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_params(page: Option<usize>, page_size: Option<usize>) -> ListParams {
        ListParams {
            filter: None,
            sort: None,
            include: None,
            page,
            page_size,
        }
    }

    #[test]
    fn test_pagination_defaults() {
        let (page, page_size, limit, offset) = pagination(&list_params(None, None));
        assert_eq!((page, page_size, limit, offset), (1, 100, 100, 0));
    }

    #[test]
    fn test_pagination_clamps() {
        let (page, page_size, _, _) = pagination(&list_params(Some(0), Some(5000)));
        assert_eq!((page, page_size), (1, 1000));

        let (_, _, limit, offset) = pagination(&list_params(Some(3), Some(10)));
        assert_eq!((limit, offset), (10, 20));
    }

    #[test]
    fn test_pagination_huge_page_saturates() {
        let (_, _, _, offset) = pagination(&list_params(Some(usize::MAX), Some(1000)));
        assert_eq!(offset, i64::MAX);

        let (_, _, _, offset) =
            pagination(&list_params(Some(usize::MAX / 2), Some(1000)));
        assert!(offset > 0);
    }

    #[test]
    fn test_paginate_math() {
        let response = paginate(vec![1, 2, 3], 25, 1, 10, None);
        assert_eq!(response.total_pages, 3);
        assert!(response.has_more);

        let response = paginate(vec![1], 25, 3, 10, None);
        assert!(!response.has_more);
    }

    #[test]
    fn test_resolve_list_query_rejects_bad_sort() {
        let registry = ResourceRegistry::new();
        let mut params = list_params(None, None);
        params.sort = Some("downloadUrl".to_string());

        let err = resolve_list_query(&registry, MOD_VERSION, &params, "id").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSortField);
    }

    #[test]
    fn test_resolve_list_query_defaults() {
        let registry = ResourceRegistry::new();
        let (predicates, order) =
            resolve_list_query(&registry, GLOBAL_RATING, &list_params(None, None), "ranking")
                .unwrap();
        assert!(predicates.is_empty());
        assert_eq!(order.column, "ranking");
        assert!(!order.descending);
    }
}
