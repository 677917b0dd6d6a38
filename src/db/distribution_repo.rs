// src/db/distribution_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::distribution::{Distribution, LedgerLine, NewDistribution, Store},
};

#[derive(Clone)]
pub struct DistributionRepository {
    pool: PgPool,
}

impl DistributionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<Vec<Distribution>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Distribution>(
            "SELECT * FROM grade_item_distributions WHERE item_id = $1 ORDER BY store_name ASC",
        )
        .bind(item_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Todas as metas da grade (base da apuração).
    pub async fn list_by_grade<'e, E>(&self, executor: E, grade_id: Uuid) -> Result<Vec<Distribution>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Distribution>(
            r#"
            SELECT d.*
            FROM grade_item_distributions d
            JOIN grade_items i ON i.id = d.item_id
            WHERE i.grade_id = $1
            ORDER BY d.store_name ASC
            "#,
        )
        .bind(grade_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Linhas da exportação: somente associados ativos participam.
    pub async fn ledger_for_export<'e, E>(&self, executor: E, grade_id: Uuid) -> Result<Vec<LedgerLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, LedgerLine>(
            r#"
            SELECT
                i.id AS item_id, i.description AS item_description, i.unit, i.package_quantity,
                d.store_id, d.store_name, d.percentage, d.min_volume, d.physical_volume
            FROM grade_item_distributions d
            JOIN grade_items i ON i.id = d.item_id
            JOIN stores s ON s.id = d.store_id AND s.is_active = TRUE
            WHERE i.grade_id = $1
            ORDER BY i.description ASC, d.store_name ASC
            "#,
        )
        .bind(grade_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn delete_by_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM grade_item_distributions WHERE item_id = $1")
            .bind(item_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_many<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        rows: &[NewDistribution],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if rows.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO grade_item_distributions \
             (item_id, store_id, store_name, percentage, min_volume, physical_volume) ",
        );
        builder.push_values(rows, |mut row, d| {
            row.push_bind(item_id)
                .push_bind(d.store_id)
                .push_bind(&d.store_name)
                .push_bind(d.percentage)
                .push_bind(d.min_volume)
                .push_bind(d.physical_volume);
        });

        builder
            .build()
            .execute(executor)
            .await
            .map_err(|e| {
                map_constraint_error(
                    e,
                    || "Associado repetido na distribuição do item.".into(),
                    || "Item inexistente.".into(),
                )
            })?;
        Ok(())
    }

    // ---
    // Diretório de associados
    // ---

    pub async fn list_active_stores<'e, E>(&self, executor: E) -> Result<Vec<Store>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stores = sqlx::query_as::<_, Store>(
            "SELECT id, name, is_active FROM stores WHERE is_active = TRUE ORDER BY name ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(stores)
    }
}
