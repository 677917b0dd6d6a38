// src/services/grade_service.rs

use std::collections::{HashMap, HashSet};

use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{grade_repo::GradeHeader, EventRepository, GradeRepository, ItemRepository},
    models::grade::{Grade, GradeDetail, GradeStatus, GradeSummary, ItemAllocationTotal, ItemOverview},
    services::event_service::check_period,
};

/// Diferença máxima aceita entre o volume negociado e o distribuído (0.1).
pub const VOLUME_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

pub fn is_balanced(negotiated: Decimal, allocated: Decimal) -> bool {
    (negotiated - allocated).abs() <= VOLUME_TOLERANCE
}

/// Regra da finalização: grade com itens e todos os itens distribuídos.
/// Devolve as pendências no formato "<item> (diferença: <n>)".
pub fn check_allocation_completeness(totals: &[ItemAllocationTotal]) -> Result<(), AppError> {
    if totals.is_empty() {
        return Err(AppError::GradeWithoutItems);
    }

    let pending: Vec<String> = totals
        .iter()
        .filter(|t| !is_balanced(t.negotiated_volume, t.allocated_volume))
        .map(|t| {
            let diff = (t.negotiated_volume - t.allocated_volume)
                .abs()
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            format!("{} (diferença: {})", t.description, diff)
        })
        .collect();

    if pending.is_empty() {
        Ok(())
    } else {
        Err(AppError::PendingDistribution(pending))
    }
}

/// Itens e distribuições só mudam enquanto a grade não foi concluída nem cancelada.
pub fn ensure_editable(grade: &Grade) -> Result<(), AppError> {
    match grade.status {
        GradeStatus::Concluded => Err(AppError::Conflict(
            "A grade está concluída; itens e distribuições não podem ser alterados.".into(),
        )),
        GradeStatus::Cancelled => Err(AppError::Conflict(
            "A grade está cancelada; itens e distribuições não podem ser alterados.".into(),
        )),
        _ => Ok(()),
    }
}

/// Só grades em andamento podem ser concluídas.
pub fn check_can_finalize(status: GradeStatus) -> Result<(), AppError> {
    match status {
        GradeStatus::Concluded => Err(AppError::Conflict("A grade já está concluída.".into())),
        GradeStatus::Cancelled => Err(AppError::Conflict(
            "Grade cancelada não pode ser concluída.".into(),
        )),
        _ => Ok(()),
    }
}

/// Limpa a lista de grupos: códigos aparados, sem vazios e sem repetição.
pub fn normalize_groups(groups: &[(String, String)]) -> Result<Vec<(String, String)>, AppError> {
    let mut seen = HashSet::new();
    let normalized: Vec<(String, String)> = groups
        .iter()
        .map(|(code, name)| (code.trim().to_string(), name.trim().to_string()))
        .filter(|(code, _)| !code.is_empty())
        .filter(|(code, _)| seen.insert(code.clone()))
        .collect();

    if normalized.is_empty() {
        return Err(AppError::InvalidInput(
            "Informe ao menos um grupo de fornecedores.".into(),
        ));
    }
    Ok(normalized)
}

#[derive(Clone)]
pub struct GradeService {
    pool: PgPool,
    grade_repo: GradeRepository,
    event_repo: EventRepository,
    item_repo: ItemRepository,
}

impl GradeService {
    pub fn new(
        pool: PgPool,
        grade_repo: GradeRepository,
        event_repo: EventRepository,
        item_repo: ItemRepository,
    ) -> Self {
        Self { pool, grade_repo, event_repo, item_repo }
    }

    pub async fn list(&self) -> Result<Vec<GradeSummary>, AppError> {
        self.grade_repo.list(&self.pool).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Grade, AppError> {
        self.grade_repo
            .find(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Grade"))
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<GradeDetail, AppError> {
        let header = self.get(id).await?;
        let event = self.event_repo
            .find(&self.pool, header.event_id)
            .await?
            .ok_or(AppError::NotFound("Evento"))?;

        let groups = self.grade_repo.list_groups(&self.pool, id).await?;
        let items = self.item_repo.list_by_grade(&self.pool, id).await?;
        let allocated: HashMap<Uuid, Decimal> = self.item_repo
            .allocation_totals(&self.pool, id)
            .await?
            .into_iter()
            .map(|t| (t.item_id, t.allocated_volume))
            .collect();

        let items = items
            .into_iter()
            .map(|item| {
                let allocated_volume = allocated.get(&item.id).copied().unwrap_or(Decimal::ZERO);
                ItemOverview {
                    difference: item.negotiated_volume - allocated_volume,
                    is_balanced: is_balanced(item.negotiated_volume, allocated_volume),
                    allocated_volume,
                    item,
                }
            })
            .collect();

        Ok(GradeDetail {
            header,
            event_description: event.description,
            event_end_date: event.end_date,
            groups,
            items,
        })
    }

    pub async fn create(&self, header: &GradeHeader<'_>, groups: &[(String, String)]) -> Result<Grade, AppError> {
        check_period(header.start_date, header.end_date)?;
        let groups = normalize_groups(groups)?;

        let mut tx = self.pool.begin().await?;

        let grade = self.grade_repo.create(&mut *tx, header).await?;
        self.grade_repo.insert_groups(&mut *tx, grade.id, &groups).await?;

        tx.commit().await?;

        tracing::info!("📋 Grade {} criada com {} grupo(s).", grade.id, groups.len());
        Ok(grade)
    }

    /// Cabeçalho + substituição da lista de grupos, na mesma transação.
    pub async fn update(
        &self,
        id: Uuid,
        header: &GradeHeader<'_>,
        status: Option<GradeStatus>,
        groups: &[(String, String)],
    ) -> Result<Grade, AppError> {
        check_period(header.start_date, header.end_date)?;
        let groups = normalize_groups(groups)?;

        let mut tx = self.pool.begin().await?;

        let current = self.grade_repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Grade"))?;

        // A conclusão só acontece pela finalização
        let status = match status {
            Some(GradeStatus::Concluded) if current.status != GradeStatus::Concluded => {
                return Err(AppError::InvalidInput(
                    "Use a finalização para concluir a grade.".into(),
                ));
            }
            Some(s) => s,
            None => current.status,
        };

        let grade = self.grade_repo.update_header(&mut *tx, id, header, status).await?;
        self.grade_repo.delete_groups(&mut *tx, id).await?;
        self.grade_repo.insert_groups(&mut *tx, id, &groups).await?;

        tx.commit().await?;
        Ok(grade)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.grade_repo.delete(&self.pool, id).await?;
        tracing::info!("🗑️ Grade {} excluída (itens em cascata).", id);
        Ok(())
    }

    // --- FINALIZAÇÃO ---
    pub async fn finalize(&self, id: Uuid) -> Result<Grade, AppError> {
        let mut tx = self.pool.begin().await?;

        let grade = self.grade_repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Grade"))?;
        check_can_finalize(grade.status)?;

        let totals = self.item_repo.allocation_totals(&mut *tx, id).await?;

        if let Err(e) = check_allocation_completeness(&totals) {
            tracing::warn!("⛔ Finalização da grade {} recusada: {}", id, e);
            return Err(e);
        }

        let grade = self.grade_repo.set_status(&mut *tx, id, GradeStatus::Concluded).await?;

        tx.commit().await?;

        tracing::info!("✅ Grade {} concluída ({} itens conferidos).", id, totals.len());
        Ok(grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(description: &str, negotiated: Decimal, allocated: Decimal) -> ItemAllocationTotal {
        ItemAllocationTotal {
            item_id: Uuid::new_v4(),
            description: description.into(),
            negotiated_volume: negotiated,
            allocated_volume: allocated,
        }
    }

    #[test]
    fn tolerance_is_one_tenth() {
        assert_eq!(VOLUME_TOLERANCE.to_string(), "0.1");
    }

    #[test]
    fn grade_without_items_cannot_be_finalized() {
        assert!(matches!(check_allocation_completeness(&[]), Err(AppError::GradeWithoutItems)));
    }

    #[test]
    fn incomplete_item_is_reported_with_rounded_difference() {
        // 1000 negociado, A 600 + B 300 distribuídos
        let totals = vec![total("Suco Tang", Decimal::from(1000), Decimal::from(900))];

        match check_allocation_completeness(&totals) {
            Err(AppError::PendingDistribution(lines)) => {
                assert_eq!(lines, vec!["Suco Tang (diferença: 100)".to_string()]);
            }
            other => panic!("esperava pendências, veio {:?}", other),
        }
    }

    #[test]
    fn every_pending_item_is_listed() {
        let totals = vec![
            total("Item A", Decimal::from(100), Decimal::new(1005, 1)), // 100.5 -> acima do negociado
            total("Item B", Decimal::from(50), Decimal::from(50)),
            total("Item C", Decimal::from(10), Decimal::ZERO),
        ];

        let err = check_allocation_completeness(&totals).unwrap_err();
        assert_eq!(err.to_string(), "Item A (diferença: 1)\nItem C (diferença: 10)");
    }

    #[test]
    fn differences_within_tolerance_are_accepted() {
        let totals = vec![
            total("Item A", Decimal::from(100), Decimal::new(999, 1)),   // 0.1
            total("Item B", Decimal::from(100), Decimal::new(10005, 2)), // 0.05
        ];
        assert!(check_allocation_completeness(&totals).is_ok());
    }

    #[test]
    fn difference_just_above_tolerance_is_pending() {
        let totals = vec![total("Item A", Decimal::from(100), Decimal::new(9989, 2))]; // 0.11
        assert!(matches!(
            check_allocation_completeness(&totals),
            Err(AppError::PendingDistribution(_))
        ));
    }

    fn grade(status: GradeStatus) -> Grade {
        let today = chrono::Utc::now();
        Grade {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            buyer_id: None,
            start_date: today.date_naive(),
            end_date: today.date_naive(),
            notes: None,
            status,
            created_at: today,
            updated_at: today,
        }
    }

    #[test]
    fn locked_grades_reject_item_changes() {
        assert!(ensure_editable(&grade(GradeStatus::Draft)).is_ok());
        assert!(ensure_editable(&grade(GradeStatus::Approved)).is_ok());
        assert!(matches!(ensure_editable(&grade(GradeStatus::Concluded)), Err(AppError::Conflict(_))));
        assert!(matches!(ensure_editable(&grade(GradeStatus::Cancelled)), Err(AppError::Conflict(_))));
    }

    #[test]
    fn cancelled_or_concluded_grades_cannot_be_finalized() {
        assert!(check_can_finalize(GradeStatus::Draft).is_ok());
        assert!(check_can_finalize(GradeStatus::UnderReview).is_ok());
        assert!(matches!(check_can_finalize(GradeStatus::Cancelled), Err(AppError::Conflict(_))));
        assert!(matches!(check_can_finalize(GradeStatus::Concluded), Err(AppError::Conflict(_))));
    }

    #[test]
    fn groups_are_trimmed_and_deduplicated() {
        let groups = vec![
            (" 1043 ".to_string(), "MONDELEZ".to_string()),
            ("1043".to_string(), "MONDELEZ BR".to_string()),
            ("".to_string(), "VAZIO".to_string()),
            ("77".to_string(), " NESTLE ".to_string()),
        ];

        let normalized = normalize_groups(&groups).unwrap();
        assert_eq!(
            normalized,
            vec![
                ("1043".to_string(), "MONDELEZ".to_string()),
                ("77".to_string(), "NESTLE".to_string()),
            ]
        );
    }

    #[test]
    fn grade_needs_at_least_one_group() {
        assert!(matches!(normalize_groups(&[]), Err(AppError::InvalidInput(_))));
        let blank = vec![("  ".to_string(), "x".to_string())];
        assert!(matches!(normalize_groups(&blank), Err(AppError::InvalidInput(_))));
    }

    // ---
    // Finalização no Postgres
    // ---

    use crate::db::{fixtures::{seed_grade, seed_item}, DistributionRepository};
    use crate::models::distribution::NewDistribution;

    fn service(pool: &PgPool) -> GradeService {
        GradeService::new(
            pool.clone(),
            GradeRepository::new(pool.clone()),
            EventRepository::new(pool.clone()),
            ItemRepository::new(pool.clone()),
        )
    }

    async fn distribute(pool: &PgPool, item_id: Uuid, volumes: &[(i32, i64)]) {
        let rows: Vec<NewDistribution> = volumes
            .iter()
            .map(|(store_id, volume)| NewDistribution {
                store_id: *store_id,
                store_name: format!("Loja {}", store_id),
                percentage: Decimal::ZERO,
                min_volume: Decimal::from(*volume),
                physical_volume: Decimal::from(*volume),
            })
            .collect();
        DistributionRepository::new(pool.clone())
            .insert_many(pool, item_id, &rows)
            .await
            .unwrap();
    }

    #[sqlx::test]
    async fn balanced_grade_is_concluded(pool: PgPool) {
        let grade = seed_grade(&pool).await;
        let item = seed_item(&pool, &grade, "Suco Tang", 1000, 10).await;
        distribute(&pool, item.id, &[(1, 600), (2, 400)]).await;

        let finalized = service(&pool).finalize(grade.id).await.unwrap();

        assert_eq!(finalized.status, GradeStatus::Concluded);
        assert_eq!(service(&pool).get(grade.id).await.unwrap().status, GradeStatus::Concluded);
    }

    #[sqlx::test]
    async fn pending_distribution_keeps_the_status(pool: PgPool) {
        let grade = seed_grade(&pool).await;
        let item = seed_item(&pool, &grade, "Suco Tang", 1000, 10).await;
        distribute(&pool, item.id, &[(1, 600), (2, 300)]).await;

        match service(&pool).finalize(grade.id).await {
            Err(AppError::PendingDistribution(lines)) => {
                assert_eq!(lines, vec!["Suco Tang (diferença: 100)".to_string()]);
            }
            other => panic!("esperava pendências, veio {:?}", other),
        }
        assert_eq!(service(&pool).get(grade.id).await.unwrap().status, GradeStatus::Draft);
    }

    #[sqlx::test]
    async fn grade_without_items_keeps_the_status(pool: PgPool) {
        let grade = seed_grade(&pool).await;

        assert!(matches!(service(&pool).finalize(grade.id).await, Err(AppError::GradeWithoutItems)));
        assert_eq!(service(&pool).get(grade.id).await.unwrap().status, GradeStatus::Draft);
    }

    #[sqlx::test]
    async fn cancelled_grade_stays_cancelled(pool: PgPool) {
        let grade = seed_grade(&pool).await;
        let item = seed_item(&pool, &grade, "Suco Tang", 1000, 10).await;
        distribute(&pool, item.id, &[(1, 1000)]).await;
        GradeRepository::new(pool.clone())
            .set_status(&pool, grade.id, GradeStatus::Cancelled)
            .await
            .unwrap();

        assert!(matches!(service(&pool).finalize(grade.id).await, Err(AppError::Conflict(_))));
        assert_eq!(service(&pool).get(grade.id).await.unwrap().status, GradeStatus::Cancelled);
    }
}
