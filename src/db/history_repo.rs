// src/db/history_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use crate::{
    common::error::AppError,
    models::history::{QuarterWindow, StoreShareRow, StoreShareSnapshot},
};

#[derive(Clone)]
pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Participação por associado no trimestre mais recente do ano mais recente.
    /// A tabela pode não existir em bases antigas: o erro sobe e quem chama decide.
    pub async fn latest_shares<'e, E>(&self, executor: E) -> Result<Vec<StoreShareRow>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StoreShareRow>(
            r#"
            WITH latest_year AS (
                SELECT MAX(year) AS year FROM store_share_history
            ),
            latest_period AS (
                SELECT h.year, MAX(h.quarter) AS quarter
                FROM store_share_history h
                JOIN latest_year ly ON ly.year = h.year
                GROUP BY h.year
            )
            SELECT
                UPPER(TRIM(h.store_name)) AS store_name,
                SUM(h.share_pct)::numeric AS share_pct
            FROM store_share_history h
            JOIN latest_period p ON p.year = h.year AND p.quarter = h.quarter
            GROUP BY UPPER(TRIM(h.store_name))
            "#,
        )
        .fetch_all(executor)
        .await
    }

    pub async fn delete_period<'e, E>(&self, executor: E, window: &QuarterWindow) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM store_share_history WHERE year = $1 AND quarter = $2")
            .bind(window.year)
            .bind(window.quarter as i32)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_snapshot<'e, E>(
        &self,
        executor: E,
        window: &QuarterWindow,
        rows: &[StoreShareSnapshot],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if rows.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO store_share_history \
             (store_name, quantity, gross_value, share_pct, quarter, year) ",
        );
        builder.push_values(rows, |mut row, s| {
            row.push_bind(&s.store_name)
                .push_bind(s.quantity)
                .push_bind(s.gross_value)
                .push_bind(s.share_pct)
                .push_bind(window.quarter as i32)
                .push_bind(window.year);
        });

        builder.build().execute(executor).await?;
        Ok(())
    }
}
