use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Shared fields of a computed ranking view
///
/// Derived entirely from a read-only aggregate view and never directly
/// mutated by API consumers.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub mean: f64,
    pub deviation: f64,
    /// Conservative rating estimate computed in the view
    pub rating: f64,
    pub num_games: i32,
    pub won_games: i32,
    pub is_active: bool,
}

/// Global leaderboard entry, backed by the `global_rating_rank_view` view
/// (resource type `globalRating`)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRating {
    /// Player identifier
    pub id: i32,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub rating: Rating,
    /// Position in the global ranking, assigned by the view
    pub ranking: i64,
}
