use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use super::{sort_newest_first, Store, StoreError};
use crate::config::Settings;
use crate::models::{Signal, Wallet};

/// Postgres-backed store. Each collection lives in its own table with the
/// full record as JSONB; replacing a collection is one transaction.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, verify connectivity and apply pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn write_wallets(conn: &mut PgConnection, wallets: &[Wallet]) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM wallets").execute(&mut *conn).await?;

    for wallet in wallets {
        sqlx::query(
            r#"
            INSERT INTO wallets (address, added_on, body)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(wallet.address.to_lowercase())
        .bind(wallet.added_on)
        .bind(Json(wallet))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn write_signals(conn: &mut PgConnection, signals: &[Signal]) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM signals").execute(&mut *conn).await?;

    for signal in signals {
        sqlx::query(
            r#"
            INSERT INTO signals (id, instrument, status, created_at, body)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&signal.id)
        .bind(&signal.instrument)
        .bind(signal.status.as_str())
        .bind(signal.created_at)
        .bind(Json(signal))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn load_wallets(&self) -> Result<Vec<Wallet>, StoreError> {
        let rows: Vec<(Json<Wallet>,)> =
            sqlx::query_as("SELECT body FROM wallets ORDER BY added_on, address")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(Json(w),)| w).collect())
    }

    async fn replace_wallets(&self, wallets: &[Wallet]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        write_wallets(&mut tx, wallets).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_signals(&self) -> Result<Vec<Signal>, StoreError> {
        let rows: Vec<(Json<Signal>,)> = sqlx::query_as("SELECT body FROM signals")
            .fetch_all(&self.pool)
            .await?;

        let mut signals: Vec<Signal> = rows.into_iter().map(|(Json(s),)| s).collect();
        sort_newest_first(&mut signals);
        Ok(signals)
    }

    async fn replace_signals(&self, signals: &[Signal]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        write_signals(&mut tx, signals).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_all(&self, wallets: &[Wallet], signals: &[Signal]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        write_signals(&mut tx, signals).await?;
        write_wallets(&mut tx, wallets).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        let row: Option<(Json<Settings>,)> = sqlx::query_as("SELECT body FROM settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(Json(s),)| s))
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO settings (id, body, updated_at)
            VALUES (1, $1, NOW())
            ON CONFLICT (id) DO UPDATE SET body = $1, updated_at = NOW()
            "#,
        )
        .bind(Json(settings))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
