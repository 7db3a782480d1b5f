use utoipa::OpenApi;

use crate::api::handlers::{
    GlobalRatingListResponse, GlobalRatingResponse, IncludeParams, ListParams,
    ModVersionDocument, ModVersionListResponse, ModVersionResponse, PaginatedGlobalRatingData,
    PaginatedModVersionData,
};
use crate::errors::{ErrorCode, ErrorDetail, ErrorResponse};
use crate::models::mod_version::{ModSummary, ModType, ModVersionResource, ModVersionUpdate};
use crate::models::rating::{GlobalRating, Rating};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mod Vault API",
        version = "0.1.0",
        description = "Data-access API for the mod vault: mod version listings with computed content URLs, the global rating leaderboard view, and structured parameterized error reporting.",
        contact(
            name = "Mod Vault API",
        )
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::list_mod_versions,
        crate::api::handlers::get_mod_version,
        crate::api::handlers::patch_mod_version,
        crate::api::handlers::list_global_ratings,
        crate::api::handlers::get_global_rating,
        crate::api::handlers::create_global_rating,
        crate::api::handlers::patch_global_rating,
        crate::api::handlers::delete_global_rating,
    ),
    components(
        schemas(
            ModType,
            ModVersionResource,
            ModVersionDocument,
            ModVersionUpdate,
            ModSummary,
            Rating,
            GlobalRating,
            ModVersionResponse,
            ModVersionListResponse,
            PaginatedModVersionData,
            PaginatedGlobalRatingData,
            GlobalRatingResponse,
            GlobalRatingListResponse,
            ListParams,
            IncludeParams,
            ErrorCode,
            ErrorDetail,
            ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "modVersion", description = "Mod version listing, retrieval and moderation"),
        (name = "globalRating", description = "Read-only global rating leaderboard"),
    )
)]
pub struct ApiDoc;
