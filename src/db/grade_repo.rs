// src/db/grade_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::grade::{Grade, GradeStatus, GradeSummary, SupplierGroupLink},
};

// Dados do cabeçalho (criação e edição usam o mesmo formato)
#[derive(Debug, Clone)]
pub struct GradeHeader<'a> {
    pub event_id: Uuid,
    pub buyer_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct GradeRepository {
    pool: PgPool,
}

impl GradeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<GradeSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let grades = sqlx::query_as::<_, GradeSummary>(
            r#"
            SELECT
                g.id, g.event_id, e.description AS event_description,
                u.name AS buyer_name, g.start_date, g.end_date, g.status,
                (SELECT COUNT(*) FROM grade_items i WHERE i.grade_id = g.id) AS item_count,
                (SELECT STRING_AGG(sg.group_name, ', ' ORDER BY sg.group_name)
                   FROM grade_supplier_groups sg WHERE sg.grade_id = g.id) AS group_names
            FROM grades g
            JOIN events e ON e.id = g.event_id
            LEFT JOIN users u ON u.id = g.buyer_id
            ORDER BY g.created_at DESC
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(grades)
    }

    pub async fn find<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Grade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let grade = sqlx::query_as::<_, Grade>("SELECT * FROM grades WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(grade)
    }

    /// Trava a linha da grade até o fim da transação (usado na finalização).
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Grade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let grade = sqlx::query_as::<_, Grade>("SELECT * FROM grades WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(grade)
    }

    pub async fn list_groups<'e, E>(&self, executor: E, grade_id: Uuid) -> Result<Vec<SupplierGroupLink>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let groups = sqlx::query_as::<_, SupplierGroupLink>(
            "SELECT * FROM grade_supplier_groups WHERE grade_id = $1 ORDER BY group_name ASC",
        )
        .bind(grade_id)
        .fetch_all(executor)
        .await?;
        Ok(groups)
    }

    // =========================================================================
    //  ESCRITA (transacionais)
    // =========================================================================

    pub async fn create<'e, E>(&self, executor: E, header: &GradeHeader<'_>) -> Result<Grade, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Grade>(
            r#"
            INSERT INTO grades (event_id, buyer_id, start_date, end_date, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(header.event_id)
        .bind(header.buyer_id)
        .bind(header.start_date)
        .bind(header.end_date)
        .bind(header.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_constraint_error(
                e,
                || "Grade duplicada.".into(),
                || "Evento ou comprador inexistente.".into(),
            )
        })
    }

    pub async fn update_header<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        header: &GradeHeader<'_>,
        status: GradeStatus,
    ) -> Result<Grade, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Grade>(
            r#"
            UPDATE grades
            SET event_id = $2, buyer_id = $3, start_date = $4, end_date = $5,
                notes = $6, status = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(header.event_id)
        .bind(header.buyer_id)
        .bind(header.start_date)
        .bind(header.end_date)
        .bind(header.notes)
        .bind(status)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            map_constraint_error(
                e,
                || "Grade duplicada.".into(),
                || "Evento ou comprador inexistente.".into(),
            )
        })?
        .ok_or(AppError::NotFound("Grade"))
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: Uuid, status: GradeStatus) -> Result<Grade, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Grade>(
            "UPDATE grades SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("Grade"))
    }

    pub async fn delete_groups<'e, E>(&self, executor: E, grade_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM grade_supplier_groups WHERE grade_id = $1")
            .bind(grade_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insere todos os grupos em um único INSERT (bulk).
    pub async fn insert_groups<'e, E>(
        &self,
        executor: E,
        grade_id: Uuid,
        groups: &[(String, String)],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if groups.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO grade_supplier_groups (grade_id, group_code, group_name) ");
        builder.push_values(groups, |mut row, (code, name)| {
            row.push_bind(grade_id).push_bind(code).push_bind(name);
        });

        builder
            .build()
            .execute(executor)
            .await
            .map_err(|e| {
                map_constraint_error(
                    e,
                    || "Grupo repetido na mesma grade.".into(),
                    || "Grade inexistente.".into(),
                )
            })?;
        Ok(())
    }

    /// Apaga a grade; itens, SKUs, distribuições e grupos caem em cascata.
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM grades WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Grade"));
        }
        Ok(())
    }
}
