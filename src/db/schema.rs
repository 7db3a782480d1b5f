use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

const MIGRATION_SQL: &str = include_str!("../../migrations/001_initial_schema.sql");

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    for (i, statement) in split_sql_statements(MIGRATION_SQL).iter().enumerate() {
        sqlx::query(statement).execute(pool).await.with_context(|| {
            format!(
                "Failed to execute migration statement {}: {}",
                i + 1,
                &statement[..statement.len().min(100)]
            )
        })?;
    }

    info!("Database migrations completed successfully");
    Ok(())
}

/// Split the migration file into executable statements
///
/// Statements end at a semicolon at end of line; comment-only lines are
/// dropped. The schema contains no function bodies, so no dollar-quote
/// handling is needed.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }

        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            statements.push(current.trim().to_string());
            current.clear();
        }
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    statements
}

pub async fn get_mod_version_count(pool: &PgPool) -> Result<i64> {
    let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mod_version")
        .fetch_one(pool)
        .await
        .context("Failed to get mod version count")?;

    Ok(result.0)
}

pub async fn get_global_rating_count(pool: &PgPool) -> Result<i64> {
    let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM global_rating_rank_view")
        .fetch_one(pool)
        .await
        .context("Failed to get global rating count")?;

    Ok(result.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_sql_creates_all_relations() {
        let sql = MIGRATION_SQL;
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"mod\""));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS mod_version"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS global_rating"));
        assert!(sql.contains("CREATE OR REPLACE VIEW global_rating_rank_view"));
    }

    #[test]
    fn migration_sql_enforces_unique_uid() {
        assert!(MIGRATION_SQL.contains("uid VARCHAR(40) NOT NULL UNIQUE"));
    }

    #[test]
    fn split_produces_complete_statements() {
        let statements = split_sql_statements(MIGRATION_SQL);
        assert!(statements.len() >= 7, "expected tables, indexes and view");
        for statement in &statements {
            assert!(statement.ends_with(';'), "statement lost its terminator");
            assert!(!statement.starts_with("--"));
        }
    }

    #[test]
    fn split_keeps_multiline_view_together() {
        let statements = split_sql_statements(MIGRATION_SQL);
        let view = statements
            .iter()
            .find(|s| s.contains("global_rating_rank_view"))
            .unwrap();
        assert!(view.contains("RANK() OVER"));
    }
}
