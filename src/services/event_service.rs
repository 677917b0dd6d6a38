// src/services/event_service.rs

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::EventRepository,
    models::event::Event,
};

pub fn check_period(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), AppError> {
    if start_date > end_date {
        return Err(AppError::InvalidInput(
            "A data inicial não pode ser posterior à data final.".into(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct EventService {
    pool: PgPool,
    repo: EventRepository,
}

impl EventService {
    pub fn new(pool: PgPool, repo: EventRepository) -> Self {
        Self { pool, repo }
    }

    pub async fn list(&self) -> Result<Vec<Event>, AppError> {
        self.repo.list(&self.pool).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Event, AppError> {
        self.repo
            .find(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Evento"))
    }

    pub async fn create(&self, description: &str, start_date: NaiveDate, end_date: NaiveDate) -> Result<Event, AppError> {
        check_period(start_date, end_date)?;
        let event = self.repo.create(&self.pool, description.trim(), start_date, end_date).await?;
        tracing::info!("📅 Evento '{}' criado.", event.description);
        Ok(event)
    }

    pub async fn update(
        &self,
        id: Uuid,
        description: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Event, AppError> {
        check_period(start_date, end_date)?;
        self.repo.update(&self.pool, id, description.trim(), start_date, end_date).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.delete(&self.pool, id).await
    }
}
