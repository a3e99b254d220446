use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use super::{
    AnalysisRecord, Assessment, AssessmentStatus, AssessmentStore, QuestionRecord, RomRecord,
};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed store implementation
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory store for tests
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        // A single connection keeps the in-memory database alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to in-memory database: {}", e),
            })?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Migration {
                message: format!("Failed to run migrations: {}", e),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl AssessmentStore for SqliteStore {
    async fn create_assessment(&self, assessment: &Assessment) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO assessments (id, user_id, anatomy_id, assessment_type, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&assessment.id)
        .bind(assessment.user_id)
        .bind(assessment.anatomy_id)
        .bind(&assessment.assessment_type)
        .bind(assessment.status.to_string())
        .bind(assessment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_assessment(&self, id: &str) -> StorageResult<Option<Assessment>> {
        let row: Option<AssessmentRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, anatomy_id, assessment_type, status, created_at
            FROM assessments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn update_status(&self, id: &str, status: AssessmentStatus) -> StorageResult<()> {
        // Terminal rows only accept a rewrite of the same status; a racing
        // writer that already finished the assessment wins.
        let result = sqlx::query(
            r#"
            UPDATE assessments
            SET status = ?2
            WHERE id = ?1
              AND (status NOT IN ('completed', 'abandoned') OR status = ?2)
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<(String,)> =
                sqlx::query_as("SELECT id FROM assessments WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;

            if exists.is_none() {
                return Err(StorageError::AssessmentNotFound {
                    assessment_id: id.to_string(),
                });
            }
            // Row exists but is terminal with a different status: the guard
            // held and the terminal state stands.
        }

        Ok(())
    }

    async fn append_question(&self, record: &QuestionRecord) -> StorageResult<()> {
        let reply = serde_json::to_string(&record.reply).unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO question_records (id, assessment_id, question, reply, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.assessment_id)
        .bind(&record.question)
        .bind(&reply)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_questions(&self, assessment_id: &str) -> StorageResult<Vec<QuestionRecord>> {
        let rows: Vec<QuestionRow> = sqlx::query_as(
            r#"
            SELECT id, assessment_id, question, reply, created_at
            FROM question_records
            WHERE assessment_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn append_rom(&self, record: &RomRecord) -> StorageResult<()> {
        let payload = serde_json::to_string(&record.payload).unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO rom_records (id, assessment_id, payload, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.assessment_id)
        .bind(&payload)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_rom_records(&self, assessment_id: &str) -> StorageResult<Vec<RomRecord>> {
        let rows: Vec<RomRow> = sqlx::query_as(
            r#"
            SELECT id, assessment_id, payload, created_at
            FROM rom_records
            WHERE assessment_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn save_analysis(&self, record: &AnalysisRecord) -> StorageResult<()> {
        let analysis = serde_json::to_string(&record.analysis).unwrap_or_default();
        let source_data = serde_json::to_string(&record.source_data).unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO analyses (id, assessment_id, analysis, source_data, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.assessment_id)
        .bind(&analysis)
        .bind(&source_data)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_analysis(&self, assessment_id: &str) -> StorageResult<Option<AnalysisRecord>> {
        let row: Option<AnalysisRow> = sqlx::query_as(
            r#"
            SELECT id, assessment_id, analysis, source_data, created_at
            FROM analyses
            WHERE assessment_id = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(assessment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }
}

// Internal row types for SQLx mapping

#[derive(sqlx::FromRow)]
struct AssessmentRow {
    id: String,
    user_id: i64,
    anatomy_id: i64,
    assessment_type: String,
    status: String,
    created_at: String,
}

impl From<AssessmentRow> for Assessment {
    fn from(row: AssessmentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            anatomy_id: row.anatomy_id,
            assessment_type: row.assessment_type,
            status: row.status.parse().unwrap_or_default(),
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: String,
    assessment_id: String,
    question: String,
    reply: String,
    created_at: String,
}

impl From<QuestionRow> for QuestionRecord {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            assessment_id: row.assessment_id,
            question: row.question,
            reply: serde_json::from_str(&row.reply).unwrap_or(serde_json::Value::Null),
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct RomRow {
    id: String,
    assessment_id: String,
    payload: String,
    created_at: String,
}

impl From<RomRow> for RomRecord {
    fn from(row: RomRow) -> Self {
        Self {
            id: row.id,
            assessment_id: row.assessment_id,
            payload: serde_json::from_str(&row.payload).unwrap_or(serde_json::Value::Null),
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct AnalysisRow {
    id: String,
    assessment_id: String,
    analysis: String,
    source_data: String,
    created_at: String,
}

impl From<AnalysisRow> for AnalysisRecord {
    fn from(row: AnalysisRow) -> Self {
        Self {
            id: row.id,
            assessment_id: row.assessment_id,
            analysis: serde_json::from_str(&row.analysis).unwrap_or(serde_json::Value::Null),
            source_data: serde_json::from_str(&row.source_data).unwrap_or(serde_json::Value::Null),
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

fn parse_timestamp(raw: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}
