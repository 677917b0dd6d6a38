// src/services/allocation_service.rs

use std::collections::{HashMap, HashSet};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{fits_numeric, is_undefined_table},
        error::AppError,
    },
    db::{DistributionRepository, GradeRepository, HistoryRepository, ItemRepository},
    models::{
        distribution::{DistributionPlan, NewDistribution, PlanRow, Store},
        history::StoreShareRow,
        item::Item,
    },
    services::grade_service::ensure_editable,
};

const STORE_NAME_MAX_LEN: usize = 255;

/// Nome da loja no formato usado como chave (maiúsculo, sem espaços nas pontas).
pub fn normalize_store_name(name: &str) -> String {
    name.trim().to_uppercase()
}

// ---
// Entrada numérica "solta": o front manda número ou texto (às vezes com vírgula)
// ---
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawQuantity {
    Number(f64),
    Text(String),
}

impl Default for RawQuantity {
    fn default() -> Self {
        RawQuantity::Number(0.0)
    }
}

/// Converte o valor recebido em um decimal finito e não negativo.
pub fn parse_quantity(raw: &RawQuantity) -> Result<Decimal, String> {
    let value = match raw {
        RawQuantity::Number(n) => {
            if !n.is_finite() {
                return Err(format!("'{}' não é um número finito", n));
            }
            Decimal::try_from(*n).map_err(|_| format!("'{}' não é um número válido", n))?
        }
        RawQuantity::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(Decimal::ZERO);
            }
            // "1.234,5" -> "1234.5"
            let normalized = if trimmed.contains(',') {
                trimmed.replace('.', "").replace(',', ".")
            } else {
                trimmed.to_string()
            };
            normalized
                .parse::<Decimal>()
                .map_err(|_| format!("'{}' não é um número válido", text))?
        }
    };

    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("'{}' não pode ser negativo", value));
    }
    Ok(value)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanRowInput {
    pub store_id: i32,
    pub store_name: String,
    #[serde(default)]
    #[schema(value_type = f64, example = 60)]
    pub percentage: RawQuantity,
    #[serde(default)]
    #[schema(value_type = f64, example = 600)]
    pub volume: RawQuantity,
}

// Limites das colunas de grade_item_distributions: NUMERIC(precisão, escala)
const PERCENTAGE_COLUMN: (u32, u32) = (5, 2);
const VOLUME_COLUMN: (u32, u32) = (12, 2);

fn out_of_range(label: &str, store: &str) -> AppError {
    AppError::InvalidInput(format!("{} de {} fora do limite permitido.", label, store))
}

fn check_column(label: &str, store: &str, value: Decimal, (precision, scale): (u32, u32)) -> Result<(), AppError> {
    if fits_numeric(value, precision, scale) {
        return Ok(());
    }
    Err(AppError::InvalidInput(format!(
        "{} de {} fora do limite ({} dígitos inteiros e {} casas decimais).",
        label,
        store,
        precision - scale,
        scale
    )))
}

/// Valida as linhas recebidas e monta o que será gravado.
/// Linhas com volume e percentual zerados significam "sem alocação" e são descartadas.
pub fn prepare_rows(package_quantity: Decimal, rows: &[PlanRowInput]) -> Result<Vec<NewDistribution>, AppError> {
    let mut seen = HashSet::new();
    let mut prepared = Vec::with_capacity(rows.len());

    for row in rows {
        let store = row.store_name.trim();
        let percentage = parse_quantity(&row.percentage)
            .map_err(|e| AppError::InvalidInput(format!("Percentual inválido para {}: {}", store, e)))?;
        let volume = parse_quantity(&row.volume)
            .map_err(|e| AppError::InvalidInput(format!("Volume inválido para {}: {}", store, e)))?;

        if volume <= Decimal::ZERO && percentage <= Decimal::ZERO {
            continue;
        }

        if percentage > Decimal::ONE_HUNDRED {
            return Err(AppError::InvalidInput(format!("Percentual de {} acima de 100%.", store)));
        }
        check_column("Percentual", store, percentage, PERCENTAGE_COLUMN)?;
        check_column("Volume", store, volume, VOLUME_COLUMN)?;

        if store.is_empty() || store.chars().count() > STORE_NAME_MAX_LEN {
            return Err(AppError::InvalidInput(format!(
                "Nome do associado {} vazio ou com mais de {} caracteres.",
                row.store_id, STORE_NAME_MAX_LEN
            )));
        }

        if !seen.insert(row.store_id) {
            return Err(AppError::InvalidInput(format!(
                "O associado {} aparece mais de uma vez na distribuição.",
                store
            )));
        }

        let physical_volume = volume
            .checked_mul(package_quantity)
            .ok_or_else(|| out_of_range("Volume físico", store))?
            .round_dp_with_strategy(VOLUME_COLUMN.1, RoundingStrategy::MidpointAwayFromZero);
        check_column("Volume físico", store, physical_volume, VOLUME_COLUMN)?;

        prepared.push(NewDistribution {
            store_id: row.store_id,
            store_name: store.to_string(),
            percentage: percentage.normalize(),
            min_volume: volume.normalize(),
            physical_volume,
        });
    }

    Ok(prepared)
}

/// Sugestão inicial: participação histórica de cada associado ativo aplicada ao volume negociado.
pub fn suggest_rows(item: &Item, stores: &[Store], shares: &HashMap<String, Decimal>) -> Result<Vec<PlanRow>, AppError> {
    stores
        .iter()
        .map(|store| {
            let percentage = shares
                .get(&normalize_store_name(&store.name))
                .copied()
                .unwrap_or(Decimal::ZERO);
            let volume = (percentage / Decimal::ONE_HUNDRED)
                .checked_mul(item.negotiated_volume)
                .ok_or_else(|| out_of_range("Volume sugerido", &store.name))?
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            let physical_volume = volume
                .checked_mul(item.package_quantity)
                .ok_or_else(|| out_of_range("Volume físico sugerido", &store.name))?;

            Ok(PlanRow {
                store_id: store.id,
                store_name: store.name.clone(),
                percentage,
                volume,
                physical_volume,
            })
        })
        .collect()
}

/// Tudo ou nada: qualquer falha na leitura do histórico vira um mapa vazio.
pub fn shares_or_empty(result: Result<Vec<StoreShareRow>, sqlx::Error>) -> HashMap<String, Decimal> {
    match result {
        Ok(rows) => {
            let mut shares: HashMap<String, Decimal> = HashMap::new();
            for row in rows {
                *shares.entry(normalize_store_name(&row.store_name)).or_insert(Decimal::ZERO) += row.share_pct;
            }
            shares
        }
        Err(e) if is_undefined_table(&e) => {
            tracing::warn!("⚠️ Tabela de participação histórica inexistente; sugestão zerada.");
            HashMap::new()
        }
        Err(e) => {
            tracing::warn!("⚠️ Falha ao ler participação histórica ({}); sugestão zerada.", e);
            HashMap::new()
        }
    }
}

fn plan_from_rows(item: &Item, rows: Vec<PlanRow>, is_suggestion: bool) -> DistributionPlan {
    let total_volume = rows.iter().map(|r| r.volume).sum();
    DistributionPlan {
        item_id: item.id,
        item_description: item.description.clone(),
        negotiated_volume: item.negotiated_volume,
        package_quantity: item.package_quantity,
        is_suggestion,
        total_volume,
        rows,
    }
}

#[derive(Clone)]
pub struct AllocationService {
    pool: PgPool,
    item_repo: ItemRepository,
    grade_repo: GradeRepository,
    distribution_repo: DistributionRepository,
    history_repo: HistoryRepository,
}

impl AllocationService {
    pub fn new(
        pool: PgPool,
        item_repo: ItemRepository,
        grade_repo: GradeRepository,
        distribution_repo: DistributionRepository,
        history_repo: HistoryRepository,
    ) -> Self {
        Self { pool, item_repo, grade_repo, distribution_repo, history_repo }
    }

    /// Mapa loja -> participação (%) do trimestre mais recente. Nunca falha.
    pub async fn historical_shares(&self) -> HashMap<String, Decimal> {
        shares_or_empty(self.history_repo.latest_shares(&self.pool).await)
    }

    // --- LEITURA: distribuição gravada ou sugestão ---
    pub async fn get_distribution_plan(&self, item_id: Uuid, force_reset: bool) -> Result<DistributionPlan, AppError> {
        let item = self.item_repo
            .find(&self.pool, item_id)
            .await?
            .ok_or(AppError::NotFound("Item"))?;

        if !force_reset {
            let saved = self.distribution_repo.list_by_item(&self.pool, item_id).await?;
            if !saved.is_empty() {
                let rows = saved.into_iter().map(PlanRow::from).collect();
                return Ok(plan_from_rows(&item, rows, false));
            }
        }

        let stores = self.distribution_repo.list_active_stores(&self.pool).await?;
        let shares = self.historical_shares().await;
        let rows = suggest_rows(&item, &stores, &shares)?;

        tracing::info!(
            "💡 Sugestão de distribuição para o item {} ({} associados, {} com histórico)",
            item.id,
            rows.len(),
            shares.len()
        );

        Ok(plan_from_rows(&item, rows, true))
    }

    // --- ESCRITA: substitui toda a distribuição do item ---
    pub async fn save_distribution_plan(
        &self,
        item_id: Uuid,
        rows: &[PlanRowInput],
    ) -> Result<DistributionPlan, AppError> {
        let mut tx = self.pool.begin().await?;

        let item = self.item_repo
            .find(&mut *tx, item_id)
            .await?
            .ok_or(AppError::NotFound("Item"))?;

        // A trava na grade serializa a gravação com a finalização
        let grade = self.grade_repo
            .find_for_update(&mut *tx, item.grade_id)
            .await?
            .ok_or(AppError::NotFound("Grade"))?;
        ensure_editable(&grade)?;

        // Valida antes de tocar no banco; se falhar, o rollback é automático (drop do tx)
        let prepared = prepare_rows(item.package_quantity, rows)?;

        let removed = self.distribution_repo.delete_by_item(&mut *tx, item_id).await?;
        self.distribution_repo.insert_many(&mut *tx, item_id, &prepared).await?;

        let saved = self.distribution_repo.list_by_item(&mut *tx, item_id).await?;

        tx.commit().await?;

        tracing::info!(
            "💾 Distribuição do item {} substituída ({} removidas, {} gravadas)",
            item_id,
            removed,
            prepared.len()
        );

        let rows = saved.into_iter().map(PlanRow::from).collect();
        Ok(plan_from_rows(&item, rows, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::UnitOfMeasure;

    fn item(negotiated: i64, package: i64) -> Item {
        Item {
            id: Uuid::new_v4(),
            grade_id: Uuid::new_v4(),
            description: "Suco Tang 25g".into(),
            unit: UnitOfMeasure::Box,
            package_quantity: Decimal::from(package),
            negotiated_volume: Decimal::from(negotiated),
            gross_unit_cost: Decimal::from(12),
            net_unit_cost: Decimal::from(10),
            sell_in_allowance: Decimal::ZERO,
            invoice_discount_pct: Decimal::ZERO,
        }
    }

    fn store(id: i32, name: &str) -> Store {
        Store { id, name: name.into(), is_active: true }
    }

    fn input(store_id: i32, name: &str, perc: RawQuantity, vol: RawQuantity) -> PlanRowInput {
        PlanRowInput { store_id, store_name: name.into(), percentage: perc, volume: vol }
    }

    #[test]
    fn suggestion_splits_by_historical_share() {
        let item = item(1000, 10);
        let stores = vec![store(1, "Loja A"), store(2, " loja b ")];
        let shares = HashMap::from([
            ("LOJA A".to_string(), Decimal::from(60)),
            ("LOJA B".to_string(), Decimal::from(40)),
        ]);

        let rows = suggest_rows(&item, &stores, &shares).unwrap();

        assert_eq!(rows[0].volume, Decimal::from(600));
        assert_eq!(rows[0].physical_volume, Decimal::from(6000));
        assert_eq!(rows[1].volume, Decimal::from(400));
        let total: Decimal = rows.iter().map(|r| r.volume).sum();
        assert_eq!(total, Decimal::from(1000));
    }

    #[test]
    fn suggestion_defaults_missing_history_to_zero() {
        let item = item(500, 1);
        let rows = suggest_rows(&item, &[store(7, "Nova Loja")], &HashMap::new()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].percentage, Decimal::ZERO);
        assert_eq!(rows[0].volume, Decimal::ZERO);
    }

    #[test]
    fn suggestion_stays_within_rounding_of_negotiated_volume() {
        let item = item(1001, 1);
        let stores: Vec<Store> = (1..=3).map(|i| store(i, &format!("L{}", i))).collect();
        let third = Decimal::new(3333, 2);
        let shares = HashMap::from([
            ("L1".to_string(), third),
            ("L2".to_string(), third),
            ("L3".to_string(), Decimal::new(3334, 2)),
        ]);

        let total: Decimal = suggest_rows(&item, &stores, &shares).unwrap().iter().map(|r| r.volume).sum();
        let diff = (total - item.negotiated_volume).abs();
        assert!(diff <= Decimal::from(stores.len() as i64), "diff = {}", diff);
    }

    #[test]
    fn rounding_goes_half_away_from_zero() {
        let item = item(5, 1);
        let shares = HashMap::from([("A".to_string(), Decimal::from(50))]);
        let rows = suggest_rows(&item, &[store(1, "A")], &shares).unwrap();
        assert_eq!(rows[0].volume, Decimal::from(3)); // 2.5 -> 3
    }

    #[test]
    fn parse_quantity_accepts_numbers_and_text() {
        assert_eq!(parse_quantity(&RawQuantity::Number(600.0)).unwrap(), Decimal::from(600));
        assert_eq!(parse_quantity(&RawQuantity::Text("12.5".into())).unwrap(), Decimal::new(125, 1));
        assert_eq!(parse_quantity(&RawQuantity::Text("1.234,5".into())).unwrap(), Decimal::new(12345, 1));
        assert_eq!(parse_quantity(&RawQuantity::Text("  ".into())).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn parse_quantity_rejects_garbage_and_negatives() {
        assert!(parse_quantity(&RawQuantity::Text("abc".into())).is_err());
        assert!(parse_quantity(&RawQuantity::Text("-3".into())).is_err());
        assert!(parse_quantity(&RawQuantity::Number(-1.0)).is_err());
        assert!(parse_quantity(&RawQuantity::Number(f64::NAN)).is_err());
        assert!(parse_quantity(&RawQuantity::Number(f64::INFINITY)).is_err());
    }

    #[test]
    fn prepare_rows_drops_empty_rows_and_computes_physical_volume() {
        let rows = vec![
            input(1, "A", RawQuantity::Number(60.0), RawQuantity::Number(600.0)),
            input(2, "B", RawQuantity::Number(0.0), RawQuantity::Text("".into())),
            input(3, "C", RawQuantity::Number(5.0), RawQuantity::Number(0.0)),
        ];

        let prepared = prepare_rows(Decimal::from(10), &rows).unwrap();

        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].physical_volume, Decimal::from(6000));
        assert_eq!(prepared[1].store_id, 3);
        assert_eq!(prepared[1].min_volume, Decimal::ZERO);
    }

    #[test]
    fn prepare_rows_is_stable_when_resubmitted() {
        let rows = vec![
            input(1, "A", RawQuantity::Number(60.0), RawQuantity::Number(600.0)),
            input(2, "B", RawQuantity::Number(30.0), RawQuantity::Number(300.0)),
        ];
        let first = prepare_rows(Decimal::from(10), &rows).unwrap();
        let second = prepare_rows(Decimal::from(10), &rows).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn prepare_rows_rejects_invalid_numbers() {
        let rows = vec![input(1, "A", RawQuantity::Text("sessenta".into()), RawQuantity::Number(600.0))];
        match prepare_rows(Decimal::ONE, &rows) {
            Err(AppError::InvalidInput(msg)) => assert!(msg.contains("Percentual inválido")),
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }
    }

    #[test]
    fn prepare_rows_rejects_percentage_above_one_hundred() {
        let rows = vec![input(1, "A", RawQuantity::Text("100,5".into()), RawQuantity::Number(10.0))];
        assert!(matches!(prepare_rows(Decimal::ONE, &rows), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn prepare_rows_rejects_duplicated_store() {
        let rows = vec![
            input(1, "A", RawQuantity::Number(10.0), RawQuantity::Number(100.0)),
            input(1, "A", RawQuantity::Number(20.0), RawQuantity::Number(200.0)),
        ];
        assert!(matches!(prepare_rows(Decimal::ONE, &rows), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn shares_degrade_to_empty_on_lookup_failure() {
        let failed: Result<Vec<StoreShareRow>, sqlx::Error> =
            Err(sqlx::Error::Protocol("relation \"store_share_history\" does not exist".into()));
        assert!(shares_or_empty(failed).is_empty());

        let empty: Result<Vec<StoreShareRow>, sqlx::Error> = Ok(vec![]);
        assert!(shares_or_empty(empty).is_empty());
    }

    #[test]
    fn shares_are_summed_per_normalized_store() {
        let share = |name: &str, pct: i64| StoreShareRow { store_name: name.into(), share_pct: Decimal::from(pct) };
        let rows = vec![share("Loja A ", 30), share("LOJA A", 10), share("loja b", 60)];
        let shares = shares_or_empty(Ok::<_, sqlx::Error>(rows));
        assert_eq!(shares["LOJA A"], Decimal::from(40));
        assert_eq!(shares["LOJA B"], Decimal::from(60));
    }

    #[test]
    fn prepare_rows_rejects_volume_that_overflows_the_physical_conversion() {
        let rows = vec![input(
            1,
            "A",
            RawQuantity::Number(10.0),
            RawQuantity::Text("79228162514264337593543950335".into()),
        )];
        assert!(matches!(prepare_rows(Decimal::from(10), &rows), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn prepare_rows_rejects_values_that_do_not_fit_the_columns() {
        let too_big = vec![input(1, "A", RawQuantity::Number(10.0), RawQuantity::Number(1e10))];
        assert!(matches!(prepare_rows(Decimal::ONE, &too_big), Err(AppError::InvalidInput(_))));

        // 2 bilhões x 10 ultrapassa o volume físico
        let physical = vec![input(1, "A", RawQuantity::Number(10.0), RawQuantity::Number(2e9))];
        assert!(matches!(prepare_rows(Decimal::from(10), &physical), Err(AppError::InvalidInput(_))));

        let fine_grained = vec![input(1, "A", RawQuantity::Text("33,333".into()), RawQuantity::Number(10.0))];
        match prepare_rows(Decimal::ONE, &fine_grained) {
            Err(AppError::InvalidInput(msg)) => assert!(msg.contains("casas decimais")),
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }
    }

    #[test]
    fn prepare_rows_rounds_physical_volume_to_the_column_scale() {
        let rows = vec![input(1, "A", RawQuantity::Number(10.0), RawQuantity::Text("1,25".into()))];
        let prepared = prepare_rows(Decimal::new(125, 2), &rows).unwrap();
        assert_eq!(prepared[0].physical_volume, Decimal::new(156, 2)); // 1.5625
    }

    #[test]
    fn suggestion_with_overflowing_volume_is_an_error() {
        let mut item = item(1, 1);
        item.negotiated_volume = Decimal::MAX;
        item.package_quantity = Decimal::from(10);
        let shares = HashMap::from([("A".to_string(), Decimal::from(100))]);
        assert!(matches!(suggest_rows(&item, &[store(1, "A")], &shares), Err(AppError::InvalidInput(_))));
    }

    // ---
    // Gravação no Postgres
    // ---

    use crate::db::fixtures::{seed_grade, seed_item};
    use crate::models::grade::GradeStatus;

    fn service(pool: &PgPool) -> AllocationService {
        AllocationService::new(
            pool.clone(),
            ItemRepository::new(pool.clone()),
            GradeRepository::new(pool.clone()),
            DistributionRepository::new(pool.clone()),
            HistoryRepository::new(pool.clone()),
        )
    }

    fn text(value: &str) -> RawQuantity {
        RawQuantity::Text(value.into())
    }

    #[sqlx::test]
    async fn saved_plan_reads_back_exactly_the_positive_rows(pool: PgPool) {
        let grade = seed_grade(&pool).await;
        let item = seed_item(&pool, &grade, "Suco Tang 25g", 1000, 10).await;
        let rows = vec![
            input(1, "Loja A", text("60"), text("600")),
            input(2, "Loja B", text("0"), text("")),
            input(3, "Loja C", text("30,5"), text("305,25")),
        ];

        let saved = service(&pool).save_distribution_plan(item.id, &rows).await.unwrap();
        let reread = service(&pool).get_distribution_plan(item.id, false).await.unwrap();

        assert!(!reread.is_suggestion);
        assert_eq!(saved.rows, reread.rows);
        let stored: Vec<(i32, Decimal, Decimal)> =
            reread.rows.iter().map(|r| (r.store_id, r.percentage, r.volume)).collect();
        assert_eq!(
            stored,
            vec![
                (1, Decimal::from(60), Decimal::from(600)),
                (3, Decimal::new(305, 1), Decimal::new(30525, 2)),
            ]
        );
        assert_eq!(reread.rows[1].physical_volume, Decimal::new(30525, 1));
    }

    #[sqlx::test]
    async fn resubmitting_the_plan_does_not_duplicate_rows(pool: PgPool) {
        let grade = seed_grade(&pool).await;
        let item = seed_item(&pool, &grade, "Suco Tang 25g", 1000, 10).await;
        let rows = vec![input(1, "Loja A", text("60"), text("600")), input(2, "Loja B", text("40"), text("400"))];

        let svc = service(&pool);
        let first = svc.save_distribution_plan(item.id, &rows).await.unwrap();
        let second = svc.save_distribution_plan(item.id, &rows).await.unwrap();

        assert_eq!(first.rows, second.rows);
        let stored = DistributionRepository::new(pool.clone()).list_by_item(&pool, item.id).await.unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[sqlx::test]
    async fn failed_insert_rolls_back_the_delete(pool: PgPool) {
        let grade = seed_grade(&pool).await;
        let item = seed_item(&pool, &grade, "Suco Tang 25g", 1000, 10).await;
        service(&pool)
            .save_distribution_plan(item.id, &[input(1, "Loja A", text("100"), text("1000"))])
            .await
            .unwrap();

        let repo = DistributionRepository::new(pool.clone());
        let duplicated = prepare_rows(item.package_quantity, &[input(2, "Loja B", text("50"), text("500"))]).unwrap();
        let duplicated = [duplicated.clone(), duplicated].concat();
        {
            let mut tx = pool.begin().await.unwrap();
            repo.delete_by_item(&mut *tx, item.id).await.unwrap();
            let err = repo.insert_many(&mut *tx, item.id, &duplicated).await.unwrap_err();
            assert!(matches!(err, AppError::Conflict(_)));
        }

        let stored = repo.list_by_item(&pool, item.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].store_id, 1);
    }

    #[sqlx::test]
    async fn rejected_submission_keeps_the_previous_plan(pool: PgPool) {
        let grade = seed_grade(&pool).await;
        let item = seed_item(&pool, &grade, "Suco Tang 25g", 1000, 10).await;
        let svc = service(&pool);
        svc.save_distribution_plan(item.id, &[input(1, "Loja A", text("100"), text("1000"))])
            .await
            .unwrap();

        let bad = vec![input(1, "Loja A", text("60"), text("600")), input(2, "Loja B", text("40"), text("abc"))];
        assert!(matches!(svc.save_distribution_plan(item.id, &bad).await, Err(AppError::InvalidInput(_))));

        let plan = svc.get_distribution_plan(item.id, false).await.unwrap();
        assert_eq!(plan.rows.len(), 1);
        assert_eq!(plan.rows[0].volume, Decimal::from(1000));
    }

    #[sqlx::test]
    async fn concluded_grade_rejects_a_new_plan(pool: PgPool) {
        let grade = seed_grade(&pool).await;
        let item = seed_item(&pool, &grade, "Suco Tang 25g", 1000, 10).await;
        GradeRepository::new(pool.clone())
            .set_status(&pool, grade.id, GradeStatus::Concluded)
            .await
            .unwrap();

        let result = service(&pool)
            .save_distribution_plan(item.id, &[input(1, "Loja A", text("100"), text("1000"))])
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        let stored = DistributionRepository::new(pool.clone()).list_by_item(&pool, item.id).await.unwrap();
        assert!(stored.is_empty());
    }
}
