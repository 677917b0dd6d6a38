// src/services/export_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DistributionRepository, EventRepository, GradeRepository},
    models::{dashboard::ReconciliationRow, distribution::LedgerLine},
    services::{allocation_service::normalize_store_name, reconciliation_service::ReconciliationService},
};

const HEADER: [&str; 12] = [
    "Grade",
    "Evento",
    "Item",
    "Unidade",
    "Qtd. Embalagem",
    "Associado",
    "Percentual",
    "Volume Mínimo",
    "Volume Físico",
    "Aderente",
    "Fora do Prazo",
    "Outros",
];

// Arquivo pronto para download
pub struct ExportFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Planilha (CSV com `;`) com uma linha por distribuição.
pub fn render_csv(
    grade_label: &str,
    event_description: &str,
    lines: &[LedgerLine],
    actuals: &HashMap<(String, String), ReconciliationRow>,
) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|e| anyhow::anyhow!("Falha ao escrever cabeçalho do CSV: {}", e))?;

    for line in lines {
        let key = (normalize_store_name(&line.store_name), line.item_description.clone());
        let (aderente, fora_prazo, outros) = actuals
            .get(&key)
            .map(|r| (r.aderente, r.fora_prazo, r.outros))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));

        writer
            .write_record([
                grade_label.to_string(),
                event_description.to_string(),
                line.item_description.clone(),
                line.unit.code().to_string(),
                line.package_quantity.normalize().to_string(),
                line.store_name.clone(),
                line.percentage.normalize().to_string(),
                line.min_volume.normalize().to_string(),
                line.physical_volume.normalize().to_string(),
                aderente.normalize().to_string(),
                fora_prazo.normalize().to_string(),
                outros.normalize().to_string(),
            ])
            .map_err(|e| anyhow::anyhow!("Falha ao escrever linha do CSV: {}", e))?;
    }

    let content = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar o CSV: {}", e))?;
    Ok(content)
}

#[derive(Clone)]
pub struct ExportService {
    pool: PgPool,
    grade_repo: GradeRepository,
    event_repo: EventRepository,
    distribution_repo: DistributionRepository,
    reconciliation: ReconciliationService,
}

impl ExportService {
    pub fn new(
        pool: PgPool,
        grade_repo: GradeRepository,
        event_repo: EventRepository,
        distribution_repo: DistributionRepository,
        reconciliation: ReconciliationService,
    ) -> Self {
        Self { pool, grade_repo, event_repo, distribution_repo, reconciliation }
    }

    pub async fn export_grade(&self, grade_id: Uuid) -> Result<ExportFile, AppError> {
        let grade = self.grade_repo
            .find(&self.pool, grade_id)
            .await?
            .ok_or(AppError::NotFound("Grade"))?;
        let event = self.event_repo
            .find(&self.pool, grade.event_id)
            .await?
            .ok_or(AppError::NotFound("Evento"))?;

        let lines = self.distribution_repo.ledger_for_export(&self.pool, grade_id).await?;

        // Sem SKUs ou grupos a apuração não roda; a planilha sai só com as metas
        let actuals: HashMap<(String, String), ReconciliationRow> = match self.reconciliation.dashboard(grade_id).await {
            Ok(dashboard) => dashboard
                .rows
                .into_iter()
                .map(|r| ((r.store.clone(), r.product.clone()), r))
                .collect(),
            Err(AppError::NothingToReconcile(reason)) => {
                tracing::info!("Exportação da grade {} sem realizado: {}", grade_id, reason);
                HashMap::new()
            }
            Err(e) => return Err(e),
        };

        let grade_label = format!("{} ({} a {})", event.description, grade.start_date, grade.end_date);
        let content = render_csv(&grade_label, &event.description, &lines, &actuals)?;

        tracing::info!("📤 Grade {} exportada ({} linhas).", grade_id, lines.len());

        Ok(ExportFile {
            file_name: format!("grade_{}_{}.csv", grade.start_date.format("%Y%m%d"), grade_id.simple()),
            content,
        })
    }
}
