// src/db/item_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::{
        grade::ItemAllocationTotal,
        item::{Item, Sku, UnitOfMeasure},
    },
};

// Campos editáveis do item
#[derive(Debug, Clone)]
pub struct ItemFields<'a> {
    pub description: &'a str,
    pub unit: UnitOfMeasure,
    pub package_quantity: Decimal,
    pub negotiated_volume: Decimal,
    pub gross_unit_cost: Decimal,
    pub net_unit_cost: Decimal,
    pub sell_in_allowance: Decimal,
    pub invoice_discount_pct: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewSku<'a> {
    pub product_code: &'a str,
    pub product_description: &'a str,
    pub package: Option<&'a str>,
}

#[derive(Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_grade<'e, E>(&self, executor: E, grade_id: Uuid) -> Result<Vec<Item>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, Item>(
            "SELECT * FROM grade_items WHERE grade_id = $1 ORDER BY description ASC",
        )
        .bind(grade_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn find<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Item>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM grade_items WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    /// Volume negociado x volume distribuído de cada item da grade.
    pub async fn allocation_totals<'e, E>(
        &self,
        executor: E,
        grade_id: Uuid,
    ) -> Result<Vec<ItemAllocationTotal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, ItemAllocationTotal>(
            r#"
            SELECT
                i.id AS item_id,
                i.description,
                i.negotiated_volume,
                COALESCE(SUM(d.min_volume), 0) AS allocated_volume
            FROM grade_items i
            LEFT JOIN grade_item_distributions d ON d.item_id = i.id
            WHERE i.grade_id = $1
            GROUP BY i.id, i.description, i.negotiated_volume
            ORDER BY i.description ASC
            "#,
        )
        .bind(grade_id)
        .fetch_all(executor)
        .await?;
        Ok(totals)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        grade_id: Uuid,
        fields: &ItemFields<'_>,
    ) -> Result<Item, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO grade_items (
                grade_id, description, unit, package_quantity, negotiated_volume,
                gross_unit_cost, net_unit_cost, sell_in_allowance, invoice_discount_pct
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(grade_id)
        .bind(fields.description)
        .bind(fields.unit)
        .bind(fields.package_quantity)
        .bind(fields.negotiated_volume)
        .bind(fields.gross_unit_cost)
        .bind(fields.net_unit_cost)
        .bind(fields.sell_in_allowance)
        .bind(fields.invoice_discount_pct)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, || "Item duplicado.".into(), || "Grade inexistente.".into()))
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, fields: &ItemFields<'_>) -> Result<Item, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Item>(
            r#"
            UPDATE grade_items
            SET description = $2, unit = $3, package_quantity = $4, negotiated_volume = $5,
                gross_unit_cost = $6, net_unit_cost = $7, sell_in_allowance = $8,
                invoice_discount_pct = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.description)
        .bind(fields.unit)
        .bind(fields.package_quantity)
        .bind(fields.negotiated_volume)
        .bind(fields.gross_unit_cost)
        .bind(fields.net_unit_cost)
        .bind(fields.sell_in_allowance)
        .bind(fields.invoice_discount_pct)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("Item"))
    }

    /// Recalcula o volume físico das distribuições quando a embalagem muda.
    pub async fn refresh_physical_volume<'e, E>(&self, executor: E, item_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE grade_item_distributions d
            SET physical_volume = d.min_volume * i.package_quantity
            FROM grade_items i
            WHERE i.id = d.item_id AND d.item_id = $1
            "#,
        )
        .bind(item_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM grade_items WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item"));
        }
        Ok(())
    }

    // =========================================================================
    //  SKUs
    // =========================================================================

    pub async fn list_skus<'e, E>(&self, executor: E, item_id: Uuid) -> Result<Vec<Sku>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let skus = sqlx::query_as::<_, Sku>(
            "SELECT * FROM grade_item_skus WHERE item_id = $1 ORDER BY product_code ASC",
        )
        .bind(item_id)
        .fetch_all(executor)
        .await?;
        Ok(skus)
    }

    pub async fn list_skus_by_grade<'e, E>(&self, executor: E, grade_id: Uuid) -> Result<Vec<Sku>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let skus = sqlx::query_as::<_, Sku>(
            r#"
            SELECT s.*
            FROM grade_item_skus s
            JOIN grade_items i ON i.id = s.item_id
            WHERE i.grade_id = $1
            ORDER BY s.product_code ASC, i.description ASC, i.id ASC
            "#,
        )
        .bind(grade_id)
        .fetch_all(executor)
        .await?;
        Ok(skus)
    }

    /// Códigos que já pertencem a outro item da mesma grade.
    pub async fn sku_codes_taken_in_grade<'e, E>(
        &self,
        executor: E,
        grade_id: Uuid,
        except_item: Option<Uuid>,
        codes: &[String],
    ) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let taken = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT TRIM(s.product_code)
            FROM grade_item_skus s
            JOIN grade_items i ON i.id = s.item_id
            WHERE i.grade_id = $1
              AND ($2::uuid IS NULL OR i.id <> $2)
              AND TRIM(s.product_code) = ANY($3)
            ORDER BY 1
            "#,
        )
        .bind(grade_id)
        .bind(except_item)
        .bind(codes)
        .fetch_all(executor)
        .await?;
        Ok(taken)
    }

    pub async fn delete_skus<'e, E>(&self, executor: E, item_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM grade_item_skus WHERE item_id = $1")
            .bind(item_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert_skus<'e, E>(&self, executor: E, item_id: Uuid, skus: &[NewSku<'_>]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if skus.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO grade_item_skus (item_id, product_code, product_description, package) ",
        );
        builder.push_values(skus, |mut row, sku| {
            row.push_bind(item_id)
                .push_bind(sku.product_code.trim())
                .push_bind(sku.product_description.trim())
                .push_bind(sku.package);
        });

        builder
            .build()
            .execute(executor)
            .await
            .map_err(|e| {
                map_constraint_error(
                    e,
                    || "SKU repetido no mesmo item.".into(),
                    || "Item inexistente.".into(),
                )
            })?;
        Ok(())
    }
}
