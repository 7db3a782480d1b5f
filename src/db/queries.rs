use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::mod_version::{ModSummary, ModVersion, ModVersionUpdate};
use crate::models::rating::GlobalRating;
use crate::resources::{BindValue, OrderBy, Predicate};

/// Append registry-resolved predicates as a WHERE clause
///
/// Column names come from the static descriptors, never from client
/// input; only values are bound.
fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    for (i, predicate) in predicates.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(predicate.column);
        builder.push(" ");
        builder.push(predicate.operator.sql());
        builder.push(" ");
        match &predicate.value {
            BindValue::Int(v) => builder.push_bind(*v),
            BindValue::SmallInt(v) => builder.push_bind(*v),
            BindValue::Float(v) => builder.push_bind(*v),
            BindValue::Text(v) => builder.push_bind(v.clone()),
            BindValue::Bool(v) => builder.push_bind(*v),
            BindValue::Timestamp(v) => builder.push_bind(*v),
        };
    }
}

fn push_order_and_page(
    builder: &mut QueryBuilder<'_, Postgres>,
    order: &OrderBy,
    limit: i64,
    offset: i64,
) {
    builder.push(" ORDER BY ");
    builder.push(order.column);
    builder.push(if order.descending { " DESC" } else { " ASC" });
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);
}

/// List mod versions matching the resolved predicates
pub async fn list_mod_versions(
    pool: &PgPool,
    predicates: &[Predicate],
    order: &OrderBy,
    limit: i64,
    offset: i64,
) -> Result<Vec<ModVersion>> {
    let mut builder = QueryBuilder::new("SELECT * FROM mod_version");
    push_predicates(&mut builder, predicates);
    push_order_and_page(&mut builder, order, limit, offset);

    let versions = builder
        .build_query_as::<ModVersion>()
        .fetch_all(pool)
        .await
        .context("Failed to list mod versions")?;

    Ok(versions)
}

/// Count mod versions matching the resolved predicates
pub async fn count_mod_versions(pool: &PgPool, predicates: &[Predicate]) -> Result<i64> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM mod_version");
    push_predicates(&mut builder, predicates);

    let count: i64 = builder
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .context("Failed to count mod versions")?;

    Ok(count)
}

/// Get a mod version by ID
pub async fn get_mod_version(pool: &PgPool, id: i32) -> Result<Option<ModVersion>> {
    let version = sqlx::query_as::<_, ModVersion>("SELECT * FROM mod_version WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch mod version by ID")?;

    Ok(version)
}

/// Apply a moderation update to a mod version
///
/// Only fields present in the payload change; `update_time` always moves.
/// Returns the updated row, or None when the version does not exist.
pub async fn update_mod_version(
    pool: &PgPool,
    id: i32,
    update: &ModVersionUpdate,
) -> Result<Option<ModVersion>> {
    let mut builder = QueryBuilder::new("UPDATE mod_version SET update_time = NOW()");

    if let Some(description) = &update.description {
        builder.push(", description = ");
        builder.push_bind(description.clone());
    }
    if let Some(ranked) = update.ranked {
        builder.push(", ranked = ");
        builder.push_bind(ranked);
    }
    if let Some(hidden) = update.hidden {
        builder.push(", hidden = ");
        builder.push_bind(hidden);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");

    let version = builder
        .build_query_as::<ModVersion>()
        .fetch_optional(pool)
        .await
        .context("Failed to update mod version")?;

    Ok(version)
}

/// Fetch summaries of owning mods for relation inclusion
pub async fn get_mod_summaries(pool: &PgPool, ids: &[i32]) -> Result<Vec<ModSummary>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let summaries = sqlx::query_as::<_, ModSummary>(
        "SELECT id, display_name, author FROM \"mod\" WHERE id = ANY($1) ORDER BY id",
    )
    .bind(ids)
    .fetch_all(pool)
    .await
    .context("Failed to fetch mod summaries")?;

    Ok(summaries)
}

/// List global rating entries from the ranking view
pub async fn list_global_ratings(
    pool: &PgPool,
    predicates: &[Predicate],
    order: &OrderBy,
    limit: i64,
    offset: i64,
) -> Result<Vec<GlobalRating>> {
    let mut builder = QueryBuilder::new("SELECT * FROM global_rating_rank_view");
    push_predicates(&mut builder, predicates);
    push_order_and_page(&mut builder, order, limit, offset);

    let ratings = builder
        .build_query_as::<GlobalRating>()
        .fetch_all(pool)
        .await
        .context("Failed to list global ratings")?;

    Ok(ratings)
}

/// Count global rating entries matching the resolved predicates
pub async fn count_global_ratings(pool: &PgPool, predicates: &[Predicate]) -> Result<i64> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM global_rating_rank_view");
    push_predicates(&mut builder, predicates);

    let count: i64 = builder
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .context("Failed to count global ratings")?;

    Ok(count)
}

/// Get a global rating entry by player ID
pub async fn get_global_rating(pool: &PgPool, id: i32) -> Result<Option<GlobalRating>> {
    let rating =
        sqlx::query_as::<_, GlobalRating>("SELECT * FROM global_rating_rank_view WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to fetch global rating by ID")?;

    Ok(rating)
}
