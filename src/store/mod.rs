use std::{future::Future, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::{auth::repo::UserRepo, jobs::repo::JobRepo, profiles::repo::ProfileRepo};

#[cfg(test)]
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for unique column {0}")]
    Conflict(&'static str),
    #[error("store call exceeded {0:?}")]
    Timeout(Duration),
    #[error("unexpected column value: {0}")]
    Decode(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Everything the workflows need from persistence.
pub trait Store: UserRepo + ProfileRepo + JobRepo {}

impl<T> Store for T where T: UserRepo + ProfileRepo + JobRepo {}

/// Postgres-backed store; every repo trait is implemented next to its domain.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

/// Bounds a store call so a stuck connection cannot hold the request forever.
pub async fn timed<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

pub(crate) fn unique_violation(err: sqlx::Error, column: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(column),
        _ => StoreError::Database(err),
    }
}
