// src/services/reconciliation_service.rs
//
// Apuração da grade: metas da distribuição x compras reais no warehouse.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DistributionRepository, EventRepository, GradeRepository, ItemRepository},
    models::{
        catalog::PurchaseRecord,
        dashboard::{GradeDashboard, Offender, ReconciliationRow, ReconciliationTotals, TimelineEntry},
        distribution::Distribution,
        item::{Item, Sku},
    },
    services::allocation_service::normalize_store_name,
    warehouse::{PurchaseQuery, SupplierMembership, WarehouseGateway},
};

/// CNPJ que não casa com nenhum fornecedor; mantém o filtro válido com lista vazia.
pub const EMPTY_ALLOW_LIST_SENTINEL: &str = "00000000000000";

const TOP_OFFENDERS: usize = 10;

/// Chave do ofensor quando a compra vem sem CNPJ do fornecedor.
pub const MISSING_TAX_ID_LABEL: &str = "sem CNPJ";

/// Só os dígitos do CNPJ ("12.345.678/0001-90" -> "12345678000190").
pub fn tax_id_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn unlinked_sku_label(code: &str) -> String {
    format!("SKU {} (unlinked)", code)
}

// Tudo que a apuração precisa do lado do Postgres
#[derive(Debug, Clone)]
pub struct GradeLedger {
    pub grade_id: Uuid,
    pub grade_start: NaiveDate,
    pub grade_end: NaiveDate,
    pub event_end: NaiveDate,
    pub group_codes: Vec<String>,
    pub items: Vec<Item>,
    pub skus: Vec<Sku>,
    pub distributions: Vec<Distribution>,
}

impl GradeLedger {
    /// A janela vai do início da grade até o fim da grade ou do evento, o que vier depois.
    pub fn window_end(&self) -> NaiveDate {
        self.grade_end.max(self.event_end)
    }
}

fn overflow() -> AppError {
    AppError::InvalidInput("Volumes da apuração fora do limite numérico.".into())
}

fn accumulate(acc: &mut Decimal, value: Decimal) -> Result<(), AppError> {
    *acc = acc.checked_add(value).ok_or_else(overflow)?;
    Ok(())
}

#[derive(Default)]
struct OffenderAcc {
    supplier_name: String,
    volume: Decimal,
    estimated_value: Decimal,
}

/// Classifica as compras nos três baldes e monta o painel. Função pura.
pub fn classify(
    ledger: &GradeLedger,
    allow_list: &HashSet<String>,
    purchases: &[PurchaseRecord],
) -> Result<GradeDashboard, AppError> {
    let window_start = ledger.grade_start;
    let window_end = ledger.window_end();

    let items_by_id: HashMap<Uuid, &Item> = ledger.items.iter().map(|i| (i.id, i)).collect();
    // Código repetido entre itens: vale o primeiro na ordem do ledger
    let mut item_by_code: HashMap<&str, &Item> = HashMap::new();
    for sku in &ledger.skus {
        if let Some(item) = items_by_id.get(&sku.item_id) {
            item_by_code.entry(sku.product_code.trim()).or_insert(*item);
        }
    }

    let mut rows: BTreeMap<(String, String), ReconciliationRow> = BTreeMap::new();
    let mut timeline: BTreeMap<(NaiveDate, String), TimelineEntry> = BTreeMap::new();
    let mut offenders: HashMap<String, OffenderAcc> = HashMap::new();

    // 1. Metas
    for d in &ledger.distributions {
        let Some(item) = items_by_id.get(&d.item_id) else { continue };
        let store = normalize_store_name(&d.store_name);
        let row = rows
            .entry((store.clone(), item.description.clone()))
            .or_insert_with(|| ReconciliationRow {
                store,
                product: item.description.clone(),
                ..Default::default()
            });
        accumulate(&mut row.meta, d.physical_volume)?;
    }

    // 2. Realizado
    for p in purchases {
        if p.date < window_start || p.date > window_end {
            continue;
        }

        let item = item_by_code.get(p.product_code.trim()).copied();
        let product = item
            .map(|i| i.description.clone())
            .unwrap_or_else(|| unlinked_sku_label(p.product_code.trim()));
        let store = normalize_store_name(&p.store_name);
        let tax_id = tax_id_digits(&p.supplier_tax_id);
        let quantity = p.quantity;

        let row = rows
            .entry((store.clone(), product.clone()))
            .or_insert_with(|| ReconciliationRow {
                store: store.clone(),
                product,
                ..Default::default()
            });
        let point = timeline
            .entry((p.date, store.clone()))
            .or_insert_with(|| TimelineEntry {
                date: p.date,
                store,
                aderente: Decimal::ZERO,
                outros: Decimal::ZERO,
                fora_prazo: Decimal::ZERO,
            });

        if !tax_id.is_empty() && allow_list.contains(&tax_id) {
            if p.date <= ledger.grade_end {
                accumulate(&mut row.aderente, quantity)?;
                accumulate(&mut point.aderente, quantity)?;
            } else {
                accumulate(&mut row.fora_prazo, quantity)?;
                accumulate(&mut point.fora_prazo, quantity)?;
            }
        } else {
            accumulate(&mut row.outros, quantity)?;
            accumulate(&mut point.outros, quantity)?;

            let key = if tax_id.is_empty() { MISSING_TAX_ID_LABEL.to_string() } else { tax_id };
            let acc = offenders.entry(key).or_default();
            if acc.supplier_name.is_empty() {
                acc.supplier_name = p.supplier_name.trim().to_string();
            }
            accumulate(&mut acc.volume, quantity)?;
            if let Some(item) = item {
                let value = item
                    .gross_unit_cost
                    .checked_div(item.package_quantity)
                    .and_then(|unit_cost| quantity.checked_mul(unit_cost));
                match value {
                    Some(value) => accumulate(&mut acc.estimated_value, value)?,
                    // embalagem zerada não tem custo unitário
                    None if item.package_quantity.is_zero() => {}
                    None => return Err(overflow()),
                }
            }
        }
    }

    let rows: Vec<ReconciliationRow> = rows.into_values().collect();
    let totals = totals_of(&rows)?;

    let mut offenders: Vec<Offender> = offenders
        .into_iter()
        .map(|(tax_id, acc)| Offender {
            tax_id,
            supplier_name: acc.supplier_name,
            volume: acc.volume,
            estimated_value: acc
                .estimated_value
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        })
        .collect();
    offenders.sort_by(|a, b| b.volume.cmp(&a.volume).then_with(|| a.tax_id.cmp(&b.tax_id)));
    offenders.truncate(TOP_OFFENDERS);

    Ok(GradeDashboard {
        grade_id: ledger.grade_id,
        window_start,
        grade_end: ledger.grade_end,
        window_end,
        totals,
        rows,
        timeline: timeline.into_values().collect(),
        offenders,
    })
}

fn totals_of(rows: &[ReconciliationRow]) -> Result<ReconciliationTotals, AppError> {
    let mut totals = ReconciliationTotals::default();
    for r in rows {
        accumulate(&mut totals.meta, r.meta)?;
        accumulate(&mut totals.aderente, r.aderente)?;
        accumulate(&mut totals.fora_prazo, r.fora_prazo)?;
        accumulate(&mut totals.outros, r.outros)?;
    }

    if totals.meta > Decimal::ZERO {
        let pct = totals
            .aderente
            .checked_div(totals.meta)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(overflow)?;
        totals.adherence_pct = Some(pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero));
    }
    Ok(totals)
}

/// Resolve a lista de fornecedores, busca as compras e classifica.
/// Qualquer falha no warehouse aborta a apuração inteira.
pub async fn reconcile_ledger(
    warehouse: &dyn WarehouseGateway,
    ledger: &GradeLedger,
) -> Result<GradeDashboard, AppError> {
    if ledger.skus.is_empty() {
        return Err(AppError::NothingToReconcile(
            "A grade não possui SKUs vinculados aos itens.".into(),
        ));
    }
    if ledger.group_codes.is_empty() {
        return Err(AppError::NothingToReconcile(
            "A grade não possui grupos de fornecedores.".into(),
        ));
    }

    let resolved = warehouse.supplier_tax_ids(&ledger.group_codes).await?;
    let mut supplier_tax_ids: Vec<String> = resolved
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    supplier_tax_ids.sort();
    supplier_tax_ids.dedup();

    if supplier_tax_ids.is_empty() {
        tracing::warn!("⚠️ Nenhum CNPJ encontrado para os grupos da grade {}; usando sentinela.", ledger.grade_id);
        supplier_tax_ids.push(EMPTY_ALLOW_LIST_SENTINEL.to_string());
    }

    let allow_list: HashSet<String> = supplier_tax_ids
        .iter()
        .map(|t| tax_id_digits(t))
        .filter(|t| t != EMPTY_ALLOW_LIST_SENTINEL)
        .collect();

    let mut product_codes: Vec<String> = ledger.skus.iter().map(|s| s.product_code.trim().to_string()).collect();
    product_codes.sort();
    product_codes.dedup();

    let mut query = PurchaseQuery {
        start: ledger.grade_start,
        end: ledger.window_end(),
        product_codes,
        supplier_tax_ids,
        membership: SupplierMembership::Within,
    };
    let mut purchases = warehouse.purchases(&query).await?;

    query.membership = SupplierMembership::Outside;
    purchases.extend(warehouse.purchases(&query).await?);

    tracing::debug!(
        grade = %ledger.grade_id,
        compras = purchases.len(),
        fornecedores = allow_list.len(),
        "Compras carregadas para apuração"
    );

    classify(ledger, &allow_list, &purchases)
}

#[derive(Clone)]
pub struct ReconciliationService {
    pool: PgPool,
    grade_repo: GradeRepository,
    event_repo: EventRepository,
    item_repo: ItemRepository,
    distribution_repo: DistributionRepository,
    warehouse: Arc<dyn WarehouseGateway>,
}

impl ReconciliationService {
    pub fn new(
        pool: PgPool,
        grade_repo: GradeRepository,
        event_repo: EventRepository,
        item_repo: ItemRepository,
        distribution_repo: DistributionRepository,
        warehouse: Arc<dyn WarehouseGateway>,
    ) -> Self {
        Self { pool, grade_repo, event_repo, item_repo, distribution_repo, warehouse }
    }

    pub async fn load_ledger(&self, grade_id: Uuid) -> Result<GradeLedger, AppError> {
        let grade = self.grade_repo
            .find(&self.pool, grade_id)
            .await?
            .ok_or(AppError::NotFound("Grade"))?;
        let event = self.event_repo
            .find(&self.pool, grade.event_id)
            .await?
            .ok_or(AppError::NotFound("Evento"))?;

        let group_codes = self.grade_repo
            .list_groups(&self.pool, grade_id)
            .await?
            .into_iter()
            .map(|g| g.group_code)
            .collect();

        Ok(GradeLedger {
            grade_id,
            grade_start: grade.start_date,
            grade_end: grade.end_date,
            event_end: event.end_date,
            group_codes,
            items: self.item_repo.list_by_grade(&self.pool, grade_id).await?,
            skus: self.item_repo.list_skus_by_grade(&self.pool, grade_id).await?,
            distributions: self.distribution_repo.list_by_grade(&self.pool, grade_id).await?,
        })
    }

    pub async fn dashboard(&self, grade_id: Uuid) -> Result<GradeDashboard, AppError> {
        let ledger = self.load_ledger(grade_id).await?;
        let dashboard = reconcile_ledger(self.warehouse.as_ref(), &ledger).await?;

        tracing::info!(
            "📊 Apuração da grade {}: meta {} / aderente {} / fora do prazo {} / outros {}",
            grade_id,
            dashboard.totals.meta,
            dashboard.totals.aderente,
            dashboard.totals.fora_prazo,
            dashboard.totals.outros
        );
        Ok(dashboard)
    }
}
