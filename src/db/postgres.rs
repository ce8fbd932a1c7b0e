use crate::db::models::{DbStrategy, HtmlArtifact, StrategyVersion, UpsertAction};
use crate::db::schema::POSTGRES_INIT;
use crate::error::KeywordError;
use crate::types::discovery::{DiscoveryField, FieldValue};
use crate::types::strategy::{STRATEGY_SECTIONS, StrategySection};
use std::sync::LazyLock;

use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::debug;

#[derive(Clone)]
pub struct ContentStore {
    pool: PgPool,
}

impl ContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pool that opens connections on first use, so startup never blocks on the database.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self, KeywordError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(url)?;
        Ok(Self::new(pool))
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), KeywordError> {
        for stmt in POSTGRES_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Id of the client's keyword idea matching `keyword` case-insensitively.
    pub async fn find_keyword_idea(
        &self,
        client_id: i32,
        keyword: &str,
    ) -> Result<Option<i64>, KeywordError> {
        let rec: Option<(i64,)> = sqlx::query_as(
            "SELECT id::bigint FROM keyword_ideas WHERE client_id = $1 AND LOWER(keyword) = LOWER($2) LIMIT 1",
        )
        .bind(client_id)
        .bind(keyword)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec.map(|r| r.0))
    }

    pub async fn insert_keyword_idea(
        &self,
        client_id: i32,
        keyword: &str,
        search_volume: Option<i64>,
        keyword_difficulty: Option<i64>,
    ) -> Result<i64, KeywordError> {
        let rec: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO keyword_ideas (
                client_id, keyword, source, search_volume, keyword_difficulty,
                created_at, updated_at
            ) VALUES ($1, $2, 'ai', $3, $4, NOW(), NOW())
            RETURNING id::bigint
            "#,
        )
        .bind(client_id)
        .bind(keyword)
        .bind(search_volume)
        .bind(keyword_difficulty)
        .fetch_one(&self.pool)
        .await?;
        Ok(rec.0)
    }

    pub async fn html_artifact(
        &self,
        client_id: i32,
        blog_id: i32,
        version_number: i32,
    ) -> Result<Option<HtmlArtifact>, KeywordError> {
        let artifact = sqlx::query_as::<_, HtmlArtifact>(
            r#"SELECT client_id::int AS client_id, blog_idea_id::int AS blog_idea_id,
               version_number::int AS version_number, html
               FROM html_artifacts
               WHERE client_id = $1 AND blog_idea_id = $2 AND version_number = $3
               LIMIT 1"#,
        )
        .bind(client_id)
        .bind(blog_id)
        .bind(version_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(artifact)
    }

    /// Append the next HTML version. `version_number` must be exactly one past the
    /// current maximum; the check and insert share a transaction-scoped advisory lock.
    pub async fn insert_html_version(
        &self,
        client_id: i32,
        blog_id: i32,
        version_number: i32,
        html: &str,
    ) -> Result<(), KeywordError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "SELECT pg_advisory_xact_lock(hashtext('html_artifacts:' || $1::text || ':' || $2::text))",
        )
        .bind(client_id)
        .bind(blog_id)
        .execute(&mut *tx)
        .await?;

        let (current,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version_number), 0)::int FROM html_artifacts WHERE client_id = $1 AND blog_idea_id = $2",
        )
        .bind(client_id)
        .bind(blog_id)
        .fetch_one(&mut *tx)
        .await?;

        ensure_next_version(current, version_number)?;

        sqlx::query(
            "INSERT INTO html_artifacts (client_id, blog_idea_id, version_number, html) VALUES ($1, $2, $3, $4)",
        )
        .bind(client_id)
        .bind(blog_id)
        .bind(version_number)
        .bind(html)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(client_id, blog_id, version_number, "stored html version");
        Ok(())
    }

    /// The client's `general_contexts` row as a JSON object.
    pub async fn general_context(&self, client_id: i32) -> Result<Option<Value>, KeywordError> {
        self.row_as_json("general_contexts", client_id).await
    }

    /// The client's `discovery_documents` row as a JSON object, all columns included.
    pub async fn discovery_document(&self, client_id: i32) -> Result<Option<Value>, KeywordError> {
        self.row_as_json("discovery_documents", client_id).await
    }

    async fn row_as_json(&self, table: &str, client_id: i32) -> Result<Option<Value>, KeywordError> {
        let sql = format!("SELECT to_jsonb(t) FROM {table} t WHERE t.client_id = $1 LIMIT 1");
        let rec: Option<(Json<Value>,)> = sqlx::query_as(&sql)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec.map(|(Json(v),)| v))
    }

    /// Update the client's discovery document, or create it with `edit_token`.
    /// Column names come from the static field table, never from callers.
    pub async fn upsert_discovery_document(
        &self,
        client_id: i32,
        updates: &[(&'static DiscoveryField, FieldValue)],
        edit_token: &str,
    ) -> Result<UpsertAction, KeywordError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('discovery_documents:' || $1::text))")
            .bind(client_id)
            .execute(&mut *tx)
            .await?;

        let existing: Option<(i32,)> =
            sqlx::query_as("SELECT client_id::int FROM discovery_documents WHERE client_id = $1 LIMIT 1")
                .bind(client_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (mut qb, action) = discovery_write(existing.is_some(), client_id, updates, edit_token);
        qb.build().execute(&mut *tx).await?;

        tx.commit().await?;
        debug!(client_id, fields = updates.len(), action = action.as_str(), "discovery document written");
        Ok(action)
    }

    pub async fn strategy(
        &self,
        client_id: i32,
        version_number: i32,
    ) -> Result<Option<DbStrategy>, KeywordError> {
        let row = sqlx::query("SELECT * FROM strategies WHERE client_id = $1 AND version_number = $2")
            .bind(client_id)
            .bind(version_number)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_strategy).transpose()
    }

    pub async fn list_strategy_versions(
        &self,
        client_id: i32,
    ) -> Result<Vec<StrategyVersion>, KeywordError> {
        let versions = sqlx::query_as::<_, StrategyVersion>(
            r#"SELECT version_number, created_at, updated_at
               FROM strategies WHERE client_id = $1
               ORDER BY version_number DESC"#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(versions)
    }

    /// Create the next strategy version, blank or copied from `copy_from`.
    /// Returns the new version number.
    pub async fn create_strategy(
        &self,
        client_id: i32,
        copy_from: Option<i32>,
    ) -> Result<i32, KeywordError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('strategies:' || $1::text))")
            .bind(client_id)
            .execute(&mut *tx)
            .await?;

        let (current,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version_number), 0)::int FROM strategies WHERE client_id = $1",
        )
        .bind(client_id)
        .fetch_one(&mut *tx)
        .await?;
        let next = current + 1;

        let mut query = sqlx::query(create_strategy_sql(copy_from.is_some()))
            .bind(client_id)
            .bind(next);
        if let Some(source) = copy_from {
            query = query.bind(source);
        }
        let inserted = query.execute(&mut *tx).await?.rows_affected();
        if let Some(source) = copy_from
            && inserted == 0
        {
            return Err(KeywordError::NotFound(format!(
                "Source strategy not found: client_id={client_id}, version={source}"
            )));
        }

        tx.commit().await?;
        debug!(client_id, version_number = next, ?copy_from, "created strategy version");
        Ok(next)
    }

    /// Overwrite one section. Returns false when the version does not exist.
    pub async fn update_strategy_section(
        &self,
        client_id: i32,
        version_number: i32,
        section: &StrategySection,
        content: &str,
    ) -> Result<bool, KeywordError> {
        let sql = format!(
            "UPDATE strategies SET {} = $1, updated_at = NOW() WHERE client_id = $2 AND version_number = $3",
            section.key
        );
        let updated = sqlx::query(&sql)
            .bind(content)
            .bind(client_id)
            .bind(version_number)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(updated > 0)
    }

    fn row_to_strategy(row: PgRow) -> Result<DbStrategy, KeywordError> {
        let mut strategy = DbStrategy::blank(
            row.try_get("client_id")?,
            row.try_get("version_number")?,
        );
        strategy.created_at = row.try_get("created_at")?;
        strategy.updated_at = row.try_get("updated_at")?;
        for section in STRATEGY_SECTIONS.iter() {
            let content: Option<String> = row.try_get(section.key)?;
            strategy.sections.insert(section.key, content);
        }
        Ok(strategy)
    }
}

fn section_columns() -> String {
    STRATEGY_SECTIONS
        .iter()
        .map(|s| s.key)
        .collect::<Vec<_>>()
        .join(", ")
}

/// HTML versions are append-only: the only accepted number is one past the current maximum.
fn ensure_next_version(current: i32, requested: i32) -> Result<(), KeywordError> {
    let expected = current + 1;
    if requested != expected {
        return Err(KeywordError::VersionConflict {
            expected,
            current,
            got: requested,
        });
    }
    Ok(())
}

/// UPDATE of the given columns when the row exists, otherwise INSERT carrying `edit_token`.
fn discovery_write(
    exists: bool,
    client_id: i32,
    updates: &[(&'static DiscoveryField, FieldValue)],
    edit_token: &str,
) -> (QueryBuilder<'static, Postgres>, UpsertAction) {
    if exists {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE discovery_documents SET ");
        for (field, value) in updates {
            qb.push(field.name).push(" = ");
            push_field_value(&mut qb, value);
            qb.push(", ");
        }
        qb.push("updated_at = NOW() WHERE client_id = ")
            .push_bind(client_id);
        return (qb, UpsertAction::Updated);
    }

    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO discovery_documents (client_id, edit_token");
    for (field, _) in updates {
        qb.push(", ").push(field.name);
    }
    qb.push(") VALUES (")
        .push_bind(client_id)
        .push(", ")
        .push_bind(edit_token.to_string());
    for (_, value) in updates {
        qb.push(", ");
        push_field_value(&mut qb, value);
    }
    qb.push(")");
    (qb, UpsertAction::Created)
}

/// `$1` client, `$2` new version, and for copies `$3` the source version.
/// A copy of a missing source inserts nothing.
fn create_strategy_sql(copy: bool) -> &'static str {
    static COPY: LazyLock<String> = LazyLock::new(|| {
        let columns = section_columns();
        format!(
            "INSERT INTO strategies (client_id, version_number, {columns}) \
             SELECT $1, $2, {columns} FROM strategies WHERE client_id = $1 AND version_number = $3"
        )
    });
    if copy {
        COPY.as_str()
    } else {
        "INSERT INTO strategies (client_id, version_number) VALUES ($1, $2)"
    }
}

fn push_field_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Text(s) => {
            qb.push_bind(s.clone());
        }
        FieldValue::Integer(i) => {
            qb.push_bind(*i);
        }
        FieldValue::Boolean(b) => {
            qb.push_bind(*b);
        }
        FieldValue::Json(v) => {
            qb.push_bind(Json(v.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::discovery::find_field;

    #[test]
    fn section_columns_follow_document_order() {
        let cols = section_columns();
        assert!(cols.starts_with("executive_summary, section_1, section_2"));
        assert!(cols.ends_with("appendix_a, appendix_b"));
    }

    #[test]
    fn html_versions_must_follow_the_current_maximum() {
        assert!(ensure_next_version(0, 1).is_ok());
        assert!(ensure_next_version(4, 5).is_ok());

        for requested in [4, 6, 0] {
            match ensure_next_version(4, requested) {
                Err(KeywordError::VersionConflict {
                    expected,
                    current,
                    got,
                }) => {
                    assert_eq!((expected, current, got), (5, 4, requested));
                }
                other => panic!("expected a version conflict, got {other:?}"),
            }
        }
    }

    fn discovery_updates() -> Vec<(&'static DiscoveryField, FieldValue)> {
        ["client_name", "num_employees"]
            .into_iter()
            .zip([
                FieldValue::Text("Setsail".into()),
                FieldValue::Integer(40),
            ])
            .map(|(name, value)| (find_field(name).unwrap(), value))
            .collect()
    }

    #[test]
    fn discovery_write_updates_existing_row() {
        let (qb, action) = discovery_write(true, 9, &discovery_updates(), "token");
        assert_eq!(action, UpsertAction::Updated);
        assert_eq!(
            qb.sql(),
            "UPDATE discovery_documents SET client_name = $1, num_employees = $2, \
             updated_at = NOW() WHERE client_id = $3"
        );
    }

    #[test]
    fn discovery_write_creates_row_with_edit_token() {
        let (qb, action) = discovery_write(false, 9, &discovery_updates(), "token");
        assert_eq!(action, UpsertAction::Created);
        assert_eq!(
            qb.sql(),
            "INSERT INTO discovery_documents (client_id, edit_token, client_name, num_employees) \
             VALUES ($1, $2, $3, $4)"
        );
    }

    #[test]
    fn strategy_copy_selects_every_section_from_the_source() {
        let blank = create_strategy_sql(false);
        assert_eq!(
            blank,
            "INSERT INTO strategies (client_id, version_number) VALUES ($1, $2)"
        );

        let copy = create_strategy_sql(true);
        let columns = section_columns();
        assert!(copy.starts_with(&format!(
            "INSERT INTO strategies (client_id, version_number, {columns}) SELECT $1, $2, {columns}"
        )));
        assert!(copy.ends_with("WHERE client_id = $1 AND version_number = $3"));
    }

    #[tokio::test]
    async fn lazy_pool_rejects_malformed_url() {
        assert!(ContentStore::connect_lazy("not a url", 1).is_err());
    }

    #[tokio::test]
    async fn lazy_pool_does_not_connect() {
        let store = ContentStore::connect_lazy("postgres://u:p@127.0.0.1:1/db", 2).unwrap();
        assert_eq!(store.pool.size(), 0);
    }
}
