//! Report persistence. Reports are written once and never updated.

use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use matador_common::Report;

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert(&self, report: &Report) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Report>>;
    /// Newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Report>>;
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: Uuid,
    user_id: String,
    zip_codes: Vec<String>,
    notes: String,
    service_styles: Vec<String>,
    cuisines: Vec<String>,
    personas: String,
    competitors: String,
    whitespace: String,
    generated_at: DateTime<Utc>,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            zip_codes: row.zip_codes,
            notes: row.notes,
            service_styles: row.service_styles,
            cuisines: row.cuisines,
            personas: row.personas,
            competitors: row.competitors,
            whitespace: row.whitespace,
            generated_at: row.generated_at,
        }
    }
}

pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Create the `reports` table if it doesn't exist.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id              UUID PRIMARY KEY,
                user_id         TEXT NOT NULL,
                zip_codes       TEXT[] NOT NULL,
                notes           TEXT NOT NULL DEFAULT '',
                service_styles  TEXT[] NOT NULL DEFAULT '{}',
                cuisines        TEXT[] NOT NULL DEFAULT '{}',
                personas        TEXT NOT NULL,
                competitors     TEXT NOT NULL,
                whitespace      TEXT NOT NULL,
                generated_at    TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS reports_user_generated_idx ON reports (user_id, generated_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        info!("Reports table ready");
        Ok(())
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn insert(&self, report: &Report) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reports (id, user_id, zip_codes, notes, service_styles, cuisines,
                                 personas, competitors, whitespace, generated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(report.id)
        .bind(&report.user_id)
        .bind(&report.zip_codes)
        .bind(&report.notes)
        .bind(&report.service_styles)
        .bind(&report.cuisines)
        .bind(&report.personas)
        .bind(&report.competitors)
        .bind(&report.whitespace)
        .bind(report.generated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %report.id, user_id = report.user_id.as_str(), "Report saved");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Report>> {
        let row = sqlx::query_as::<_, ReportRow>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Report::from))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Report>> {
        let rows = sqlx::query_as::<_, ReportRow>(
            "SELECT * FROM reports WHERE user_id = $1 ORDER BY generated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Report::from).collect())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryReportStore {
    reports: Mutex<Vec<Report>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Report>> {
        // Entries are pushed whole, so a poisoned lock still holds valid data.
        self.reports.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn insert(&self, report: &Report) -> Result<()> {
        let mut reports = self.lock();
        if reports.iter().any(|r| r.id == report.id) {
            bail!("Report {} already exists", report.id);
        }
        reports.push(report.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Report>> {
        Ok(self.lock().iter().find(|r| r.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Report>> {
        let mut reports: Vec<Report> = self
            .lock()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn report(user_id: &str, minutes_ago: i64) -> Report {
        Report {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            zip_codes: vec!["90210".into()],
            notes: String::new(),
            service_styles: vec!["Café".into()],
            cuisines: vec!["Coffee".into()],
            personas: "### Sun Chasers — 22%".into(),
            competitors: "_No competitors found._".into(),
            whitespace: "Opportunity 1".into(),
            generated_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = MemoryReportStore::new();
        let r = report("user-1", 0);
        store.insert(&r).await.unwrap();
        assert_eq!(store.get(r.id).await.unwrap(), Some(r));
        assert_eq!(store.get(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn reports_are_never_overwritten() {
        let store = MemoryReportStore::new();
        let r = report("user-1", 0);
        store.insert(&r).await.unwrap();

        let mut changed = r.clone();
        changed.whitespace = "rewritten".into();
        assert!(store.insert(&changed).await.is_err());
        assert_eq!(store.get(r.id).await.unwrap().unwrap().whitespace, "Opportunity 1");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn listing_is_per_user_newest_first() {
        let store = MemoryReportStore::new();
        let old = report("user-1", 30);
        let new = report("user-1", 1);
        store.insert(&old).await.unwrap();
        store.insert(&new).await.unwrap();
        store.insert(&report("user-2", 5)).await.unwrap();

        let listed = store.list_for_user("user-1").await.unwrap();
        assert_eq!(listed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![new.id, old.id]);
    }
}
