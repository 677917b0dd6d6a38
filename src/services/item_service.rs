// src/services/item_service.rs

use std::collections::HashSet;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::fits_numeric, error::AppError},
    db::{
        item_repo::{ItemFields, NewSku},
        GradeRepository, ItemRepository,
    },
    models::item::{Item, ItemDetail},
    services::grade_service::ensure_editable,
};

pub fn check_item_fields(fields: &ItemFields<'_>) -> Result<(), AppError> {
    if fields.description.trim().is_empty() {
        return Err(AppError::InvalidInput("A descrição do item é obrigatória.".into()));
    }
    if fields.package_quantity <= Decimal::ZERO {
        return Err(AppError::InvalidInput(
            "A quantidade por embalagem deve ser maior que zero.".into(),
        ));
    }

    let non_negative = [
        ("volume negociado", fields.negotiated_volume),
        ("custo bruto", fields.gross_unit_cost),
        ("custo líquido", fields.net_unit_cost),
        ("verba sell-in", fields.sell_in_allowance),
        ("desconto em nota", fields.invoice_discount_pct),
    ];
    if let Some((label, _)) = non_negative.iter().find(|(_, v)| v.is_sign_negative() && !v.is_zero()) {
        return Err(AppError::InvalidInput(format!("O campo {} não pode ser negativo.", label)));
    }

    // NUMERIC(precisão, escala) de grade_items
    let columns = [
        ("quantidade por embalagem", fields.package_quantity, 10, 2),
        ("volume negociado", fields.negotiated_volume, 12, 2),
        ("custo bruto", fields.gross_unit_cost, 10, 2),
        ("custo líquido", fields.net_unit_cost, 10, 2),
        ("verba sell-in", fields.sell_in_allowance, 10, 2),
        ("desconto em nota", fields.invoice_discount_pct, 5, 2),
    ];
    if let Some((label, _, precision, scale)) = columns
        .iter()
        .find(|(_, v, precision, scale)| !fits_numeric(*v, *precision, *scale))
    {
        return Err(AppError::InvalidInput(format!(
            "O campo {} aceita até {} dígitos inteiros e {} casas decimais.",
            label,
            precision - scale,
            scale
        )));
    }
    Ok(())
}

/// Um código de produto aparece no máximo uma vez por item.
pub fn check_skus(skus: &[NewSku<'_>]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for sku in skus {
        let code = sku.product_code.trim();
        if code.is_empty() {
            return Err(AppError::InvalidInput("Código de SKU vazio.".into()));
        }
        if !seen.insert(code) {
            return Err(AppError::InvalidInput(format!("SKU {} informado mais de uma vez.", code)));
        }
    }
    Ok(())
}

fn trimmed_codes(skus: &[NewSku<'_>]) -> Vec<String> {
    skus.iter().map(|s| s.product_code.trim().to_string()).collect()
}

/// Um código de produto pertence a um único item da grade.
pub fn check_codes_free(taken: &[String]) -> Result<(), AppError> {
    if taken.is_empty() {
        return Ok(());
    }
    Err(AppError::Conflict(format!(
        "SKU já vinculado a outro item da grade: {}.",
        taken.join(", ")
    )))
}

#[derive(Clone)]
pub struct ItemService {
    pool: PgPool,
    item_repo: ItemRepository,
    grade_repo: GradeRepository,
}

impl ItemService {
    pub fn new(pool: PgPool, item_repo: ItemRepository, grade_repo: GradeRepository) -> Self {
        Self { pool, item_repo, grade_repo }
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<ItemDetail, AppError> {
        let item = self.item_repo
            .find(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Item"))?;
        let skus = self.item_repo.list_skus(&self.pool, id).await?;
        Ok(ItemDetail { item, skus })
    }

    pub async fn create(
        &self,
        grade_id: Uuid,
        fields: &ItemFields<'_>,
        skus: &[NewSku<'_>],
    ) -> Result<ItemDetail, AppError> {
        check_item_fields(fields)?;
        check_skus(skus)?;

        let mut tx = self.pool.begin().await?;

        let grade = self.grade_repo
            .find_for_update(&mut *tx, grade_id)
            .await?
            .ok_or(AppError::NotFound("Grade"))?;
        ensure_editable(&grade)?;

        let taken = self.item_repo
            .sku_codes_taken_in_grade(&mut *tx, grade_id, None, &trimmed_codes(skus))
            .await?;
        check_codes_free(&taken)?;

        let item = self.item_repo.create(&mut *tx, grade_id, fields).await?;
        self.item_repo.insert_skus(&mut *tx, item.id, skus).await?;
        let skus = self.item_repo.list_skus(&mut *tx, item.id).await?;

        tx.commit().await?;

        tracing::info!("📦 Item '{}' adicionado à grade {} ({} SKUs).", item.description, grade_id, skus.len());
        Ok(ItemDetail { item, skus })
    }

    /// Busca o item e trava a grade dona dele; falha se a grade não aceita mais alterações.
    async fn lock_item_grade(&self, tx: &mut sqlx::PgConnection, id: Uuid) -> Result<Item, AppError> {
        let item = self.item_repo
            .find(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Item"))?;
        let grade = self.grade_repo
            .find_for_update(&mut *tx, item.grade_id)
            .await?
            .ok_or(AppError::NotFound("Grade"))?;
        ensure_editable(&grade)?;
        Ok(item)
    }

    /// Atualiza o item e substitui a lista de SKUs.
    /// O volume físico das distribuições acompanha a nova embalagem.
    pub async fn update(&self, id: Uuid, fields: &ItemFields<'_>, skus: &[NewSku<'_>]) -> Result<ItemDetail, AppError> {
        check_item_fields(fields)?;
        check_skus(skus)?;

        let mut tx = self.pool.begin().await?;

        let current = self.lock_item_grade(&mut tx, id).await?;
        let taken = self.item_repo
            .sku_codes_taken_in_grade(&mut *tx, current.grade_id, Some(id), &trimmed_codes(skus))
            .await?;
        check_codes_free(&taken)?;

        let item: Item = self.item_repo.update(&mut *tx, id, fields).await?;
        self.item_repo.delete_skus(&mut *tx, id).await?;
        self.item_repo.insert_skus(&mut *tx, id, skus).await?;
        self.item_repo.refresh_physical_volume(&mut *tx, id).await?;
        let skus = self.item_repo.list_skus(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(ItemDetail { item, skus })
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.lock_item_grade(&mut tx, id).await?;
        self.item_repo.delete(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::UnitOfMeasure;

    fn fields() -> ItemFields<'static> {
        ItemFields {
            description: "Biscoito Oreo 90g",
            unit: UnitOfMeasure::Box,
            package_quantity: Decimal::from(12),
            negotiated_volume: Decimal::from(1000),
            gross_unit_cost: Decimal::new(4590, 2),
            net_unit_cost: Decimal::new(4100, 2),
            sell_in_allowance: Decimal::ZERO,
            invoice_discount_pct: Decimal::from(5),
        }
    }

    fn sku(code: &'static str) -> NewSku<'static> {
        NewSku { product_code: code, product_description: "Oreo", package: Some("CX12") }
    }

    #[test]
    fn valid_item_passes() {
        assert!(check_item_fields(&fields()).is_ok());
    }

    #[test]
    fn package_quantity_must_be_positive() {
        let mut f = fields();
        f.package_quantity = Decimal::ZERO;
        assert!(matches!(check_item_fields(&f), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn negative_cost_is_rejected() {
        let mut f = fields();
        f.net_unit_cost = Decimal::from(-1);
        let err = check_item_fields(&f).unwrap_err();
        assert!(err.to_string().contains("custo líquido"));
    }

    #[test]
    fn blank_description_is_rejected() {
        let mut f = fields();
        f.description = "   ";
        assert!(check_item_fields(&f).is_err());
    }

    #[test]
    fn sku_codes_must_be_unique_per_item() {
        assert!(check_skus(&[sku("100"), sku("200")]).is_ok());
        assert!(matches!(check_skus(&[sku("100"), sku(" 100 ")]), Err(AppError::InvalidInput(_))));
        assert!(check_skus(&[sku(" ")]).is_err());
    }

    #[test]
    fn values_beyond_the_columns_are_rejected() {
        let mut f = fields();
        f.negotiated_volume = Decimal::from(10_000_000_000_i64);
        assert!(check_item_fields(&f).unwrap_err().to_string().contains("volume negociado"));

        let mut f = fields();
        f.gross_unit_cost = Decimal::new(45901, 3);
        assert!(matches!(check_item_fields(&f), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn codes_used_by_other_items_are_a_conflict() {
        assert!(check_codes_free(&[]).is_ok());
        let err = check_codes_free(&["100".to_string(), "200".to_string()]).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains("100, 200"));
    }

    // ---
    // Postgres
    // ---

    use crate::db::fixtures::{seed_grade, seed_item, seed_sku};
    use crate::models::grade::GradeStatus;

    fn service(pool: &PgPool) -> ItemService {
        ItemService::new(pool.clone(), ItemRepository::new(pool.clone()), GradeRepository::new(pool.clone()))
    }

    #[sqlx::test]
    async fn sku_already_linked_in_the_grade_is_rejected(pool: PgPool) {
        let grade = seed_grade(&pool).await;
        let oreo = seed_item(&pool, &grade, "Biscoito Oreo", 100, 12).await;
        seed_sku(&pool, &oreo, "100").await;

        let result = service(&pool).create(grade.id, &fields(), &[sku(" 100 ")]).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        // O próprio item pode manter o código na edição
        let updated = service(&pool).update(oreo.id, &fields(), &[sku("100"), sku("200")]).await.unwrap();
        assert_eq!(updated.skus.len(), 2);
    }

    #[sqlx::test]
    async fn concluded_grade_freezes_its_items(pool: PgPool) {
        let grade = seed_grade(&pool).await;
        let item = seed_item(&pool, &grade, "Biscoito Oreo", 100, 12).await;
        GradeRepository::new(pool.clone())
            .set_status(&pool, grade.id, GradeStatus::Concluded)
            .await
            .unwrap();

        let svc = service(&pool);
        assert!(matches!(svc.create(grade.id, &fields(), &[sku("300")]).await, Err(AppError::Conflict(_))));
        assert!(matches!(svc.update(item.id, &fields(), &[]).await, Err(AppError::Conflict(_))));
        assert!(matches!(svc.delete(item.id).await, Err(AppError::Conflict(_))));
        assert!(svc.get_detail(item.id).await.is_ok());
    }
}
