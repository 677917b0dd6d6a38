// src/db/event_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;
use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::event::Event,
};

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Event>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let events = sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY start_date DESC")
            .fetch_all(executor)
            .await?;
        Ok(events)
    }

    pub async fn find<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Event>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(event)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        description: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Event, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (description, start_date, end_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(description)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(executor)
        .await?;
        Ok(event)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        description: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Event, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET description = $2, start_date = $3, end_date = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(description)
        .bind(start_date)
        .bind(end_date)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("Evento"))
    }

    /// Apaga o evento. Grades vinculadas bloqueiam a exclusão (ON DELETE RESTRICT).
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                map_constraint_error(
                    e,
                    || "Evento duplicado.".into(),
                    || "O evento possui grades vinculadas e não pode ser excluído.".into(),
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Evento"));
        }
        Ok(())
    }
}
