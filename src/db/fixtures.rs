// src/db/fixtures.rs
//
// Cenários mínimos gravados no banco para os testes com `#[sqlx::test]`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    db::{
        grade_repo::GradeHeader,
        item_repo::{ItemFields, NewSku},
        EventRepository, GradeRepository, ItemRepository,
    },
    models::{grade::Grade, item::{Item, UnitOfMeasure}},
};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

/// Evento + grade em rascunho com um grupo de fornecedores.
pub async fn seed_grade(pool: &PgPool) -> Grade {
    let event = EventRepository::new(pool.clone())
        .create(pool, "Aniversário Supersync", date(3, 1), date(3, 31))
        .await
        .unwrap();

    let grades = GradeRepository::new(pool.clone());
    let header = GradeHeader {
        event_id: event.id,
        buyer_id: None,
        start_date: date(3, 1),
        end_date: date(3, 15),
        notes: None,
    };
    let grade = grades.create(pool, &header).await.unwrap();
    grades
        .insert_groups(pool, grade.id, &[("1043".to_string(), "MONDELEZ".to_string())])
        .await
        .unwrap();
    grade
}

pub async fn seed_item(pool: &PgPool, grade: &Grade, description: &str, negotiated: i64, package: i64) -> Item {
    let fields = ItemFields {
        description,
        unit: UnitOfMeasure::Box,
        package_quantity: Decimal::from(package),
        negotiated_volume: Decimal::from(negotiated),
        gross_unit_cost: Decimal::from(12),
        net_unit_cost: Decimal::from(10),
        sell_in_allowance: Decimal::ZERO,
        invoice_discount_pct: Decimal::ZERO,
    };
    ItemRepository::new(pool.clone()).create(pool, grade.id, &fields).await.unwrap()
}

pub async fn seed_sku(pool: &PgPool, item: &Item, code: &str) {
    let sku = NewSku { product_code: code, product_description: "PRODUTO TESTE", package: None };
    ItemRepository::new(pool.clone())
        .insert_skus(pool, item.id, &[sku])
        .await
        .unwrap();
}

pub async fn seed_store(pool: &PgPool, id: i32, name: &str) {
    sqlx::query("INSERT INTO stores (id, name, is_active) VALUES ($1, $2, TRUE)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
}
