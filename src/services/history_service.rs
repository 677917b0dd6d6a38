// src/services/history_service.rs

use std::{collections::BTreeMap, sync::Arc};

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::HistoryRepository,
    models::{
        catalog::StoreSales,
        history::{QuarterWindow, RefreshSummary, StoreShareSnapshot},
    },
    services::allocation_service::normalize_store_name,
    warehouse::WarehouseGateway,
};

/// Trimestre civil fechado imediatamente anterior a `today`.
pub fn previous_quarter(today: NaiveDate) -> Result<QuarterWindow, AppError> {
    let current = (today.month() - 1) / 3 + 1;
    let (quarter, year) = if current == 1 {
        (4, today.year() - 1)
    } else {
        (current - 1, today.year())
    };

    let first_month = (quarter - 1) * 3 + 1;
    let start = NaiveDate::from_ymd_opt(year, first_month, 1);
    // Último dia = véspera do primeiro dia do trimestre seguinte
    let end = if quarter == 4 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, first_month + 3, 1)
    }
    .and_then(|d| d.pred_opt());

    match (start, end) {
        (Some(start), Some(end)) => Ok(QuarterWindow { quarter, year, start, end }),
        _ => Err(AppError::InvalidInput(format!("Data fora do intervalo suportado: {}", today))),
    }
}

/// Participação de cada associado na quantidade total vendida (%), 2 casas.
pub fn compute_shares(sales: &[StoreSales]) -> Vec<StoreShareSnapshot> {
    let mut per_store: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for s in sales {
        let entry = per_store
            .entry(normalize_store_name(&s.store_name))
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += s.quantity;
        entry.1 += s.gross_value;
    }

    let total: Decimal = per_store.values().map(|(q, _)| *q).sum();

    per_store
        .into_iter()
        .map(|(store_name, (quantity, gross_value))| {
            let share_pct = if total.is_zero() {
                Decimal::ZERO
            } else {
                (quantity / total * Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            };
            StoreShareSnapshot { store_name, quantity, gross_value, share_pct }
        })
        .collect()
}

#[derive(Clone)]
pub struct HistoryService {
    pool: PgPool,
    repo: HistoryRepository,
    warehouse: Arc<dyn WarehouseGateway>,
}

impl HistoryService {
    pub fn new(pool: PgPool, repo: HistoryRepository, warehouse: Arc<dyn WarehouseGateway>) -> Self {
        Self { pool, repo, warehouse }
    }

    /// Reconstrói o snapshot do trimestre anterior a partir das vendas do warehouse.
    pub async fn refresh(&self, today: NaiveDate) -> Result<RefreshSummary, AppError> {
        let window = previous_quarter(today)?;

        tracing::info!(
            "🔄 Atualizando participação histórica: {}T/{} ({} a {})",
            window.quarter,
            window.year,
            window.start,
            window.end
        );

        let sales = self.warehouse.store_sales(window.start, window.end).await?;
        if sales.is_empty() {
            return Err(AppError::InvalidInput("Nenhum dado encontrado no período".into()));
        }

        let rows = compute_shares(&sales);

        let mut tx = self.pool.begin().await?;
        let removed = self.repo.delete_period(&mut *tx, &window).await?;
        self.repo.insert_snapshot(&mut *tx, &window, &rows).await?;
        tx.commit().await?;

        tracing::info!("✅ Participação histórica gravada: {} associados ({} linhas antigas removidas)", rows.len(), removed);

        Ok(RefreshSummary { window, stores: rows.len(), rows })
    }
}
