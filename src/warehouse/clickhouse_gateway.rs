// src/warehouse/clickhouse_gateway.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use clickhouse::{Client, Row};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    models::{
        catalog::{ProductHit, PurchaseRecord, StoreSales, SupplierGroupHit},
        contract::{ContractFilter, ContractHeader, ContractProduct, ContractSummary, ContractSupplier},
    },
    warehouse::{PurchaseQuery, SupplierMembership, WarehouseGateway},
};

/// Conexão com o ClickHouse
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    pub url: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl ClickHouseConfig {
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            user: None,
            password: None,
        }
    }

    pub fn with_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }
}

// --- Linhas cruas (a ordem dos campos segue a ordem do SELECT) ---

#[derive(Debug, Row, Deserialize)]
struct TaxIdRow {
    cnpj: String,
}

#[derive(Debug, Row, Deserialize)]
struct PurchaseRow {
    data: String,
    loja: String,
    codigo_produto: String,
    cnpj: String,
    fornecedor: String,
    quantidade: f64,
}

#[derive(Debug, Row, Deserialize)]
struct StoreSalesRow {
    loja: String,
    quantidade: f64,
    valor: f64,
}

#[derive(Debug, Row, Deserialize)]
struct ProductRow {
    codigo: String,
    descricao: String,
    embalagem: String,
}

#[derive(Debug, Row, Deserialize)]
struct GroupRow {
    codigo: String,
    nome: String,
}

#[derive(Debug, Row, Deserialize)]
struct ContractRow {
    nomesubcontrato: String,
    nomecontrato: String,
    nrocontrato: i64,
    contrato: i64,
    subcontrato: i64,
}

#[derive(Debug, Row, Deserialize)]
struct ContractHeaderRow {
    nomecontrato: String,
    nomesubcontrato: String,
    percdesconto: f64,
    vlrdescontofixo: f64,
    inicio: String,
    fim: String,
    subcontrato: i64,
}

#[derive(Debug, Row, Deserialize)]
struct ContractSupplierRow {
    razao: String,
    fantasia: String,
    cnpj: String,
}

#[derive(Debug, Row, Deserialize)]
struct ContractProductRow {
    codigo: String,
    descricao: String,
}

// Filtro "contém" sem diferenciar maiúsculas; termo vazio aceita tudo
const CONTRACT_FILTER: &str = r#"
    positionCaseInsensitiveUTF8(ifNull(nomesubcontrato, ''), ?) > 0
    AND positionCaseInsensitiveUTF8(ifNull(nomecontrato, ''), ?) > 0
"#;

#[derive(Clone)]
pub struct ClickHouseWarehouse {
    client: Client,
}

impl ClickHouseWarehouse {
    pub fn new(config: &ClickHouseConfig) -> Self {
        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database);

        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            client = client.with_user(user).with_password(password);
        }

        Self { client }
    }

    /// Verifica a conexão (usado só para log na inicialização)
    pub async fn check_connection(&self) -> Result<(), AppError> {
        self.client
            .query("SELECT 1")
            .fetch_one::<u8>()
            .await
            .map_err(|e| AppError::WarehouseError(format!("health check falhou: {}", e)))?;
        Ok(())
    }
}

fn to_decimal(value: f64) -> Result<Decimal, AppError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(4))
        .ok_or_else(|| AppError::WarehouseError(format!("valor numérico inválido: {}", value)))
}

fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AppError::WarehouseError(format!("data inválida '{}': {}", value, e)))
}

/// Datas de validade chegam como texto; vazio significa sem data.
fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse_date(value.get(..10).unwrap_or(value)).map(Some)
}

fn filter_term(term: &Option<String>) -> &str {
    term.as_deref().unwrap_or("")
}

#[async_trait]
impl WarehouseGateway for ClickHouseWarehouse {
    async fn supplier_tax_ids(&self, group_codes: &[String]) -> Result<Vec<String>, AppError> {
        let rows: Vec<TaxIdRow> = self
            .client
            .query(
                r#"
                SELECT DISTINCT cnpj_completo AS cnpj
                FROM gold.dim_fornecedor
                WHERE has(?, toString(SEQREDE))
                  AND cnpj_completo != ''
                "#,
            )
            .bind(group_codes)
            .fetch_all()
            .await
            .map_err(|e| AppError::WarehouseError(format!("falha ao resolver fornecedores: {}", e)))?;

        tracing::debug!(groups = group_codes.len(), cnpjs = rows.len(), "Fornecedores resolvidos");
        Ok(rows.into_iter().map(|r| r.cnpj).collect())
    }

    async fn purchases(&self, query: &PurchaseQuery) -> Result<Vec<PurchaseRecord>, AppError> {
        // O sentinela em `supplier_tax_ids` mantém o NOT IN bem formado quando a lista vem vazia.
        let supplier_filter = match query.membership {
            SupplierMembership::Within => "has(?, cnpj_fornecedor)",
            SupplierMembership::Outside => "NOT has(?, cnpj_fornecedor)",
        };

        let sql = format!(
            r#"
            SELECT
                toString(data_entrada) AS data,
                upper(trim(nome_associado)) AS loja,
                toString(seq_produto) AS codigo_produto,
                cnpj_fornecedor AS cnpj,
                any(nome_fornecedor) AS fornecedor,
                toFloat64(sum(quantidade)) AS quantidade
            FROM gold.fato_compras
            WHERE data_entrada BETWEEN toDate(?) AND toDate(?)
              AND has(?, toString(seq_produto))
              AND {}
            GROUP BY data, loja, codigo_produto, cnpj
            ORDER BY data, loja
            "#,
            supplier_filter
        );

        let rows: Vec<PurchaseRow> = self
            .client
            .query(&sql)
            .bind(query.start.to_string())
            .bind(query.end.to_string())
            .bind(&query.product_codes)
            .bind(&query.supplier_tax_ids)
            .fetch_all()
            .await
            .map_err(|e| AppError::WarehouseError(format!("falha ao consultar compras: {}", e)))?;

        rows.into_iter()
            .map(|r| {
                Ok(PurchaseRecord {
                    date: parse_date(&r.data)?,
                    store_name: r.loja,
                    product_code: r.codigo_produto,
                    supplier_tax_id: r.cnpj,
                    supplier_name: r.fornecedor,
                    quantity: to_decimal(r.quantidade)?,
                })
            })
            .collect()
    }

    async fn store_sales(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<StoreSales>, AppError> {
        let rows: Vec<StoreSalesRow> = self
            .client
            .query(
                r#"
                SELECT
                    NomeAssociado AS loja,
                    toFloat64(sum(quantidadeItem)) AS quantidade,
                    toFloat64(sum(valorTotalItem - valorDescontoItem)) AS valor
                FROM gold.obt_tb_venda_sumarizada_prodcrm
                WHERE dataVenda BETWEEN toDate(?) AND toDate(?)
                GROUP BY NomeAssociado
                ORDER BY NomeAssociado
                "#,
            )
            .bind(start.to_string())
            .bind(end.to_string())
            .fetch_all()
            .await
            .map_err(|e| AppError::WarehouseError(format!("falha ao consultar vendas: {}", e)))?;

        rows.into_iter()
            .map(|r| {
                Ok(StoreSales {
                    store_name: r.loja,
                    quantity: to_decimal(r.quantidade)?,
                    gross_value: to_decimal(r.valor)?,
                })
            })
            .collect()
    }

    async fn search_products(&self, term: &str, limit: u32) -> Result<Vec<ProductHit>, AppError> {
        let rows: Vec<ProductRow> = self
            .client
            .query(
                r#"
                SELECT DISTINCT
                    toString(SEQPRODUTO) AS codigo,
                    DESCCOMPLETA AS descricao,
                    ifNull(EMBALAGEM, '') AS embalagem
                FROM gold.dim_produto
                WHERE toString(SEQPRODUTO) = ?
                   OR positionCaseInsensitiveUTF8(DESCCOMPLETA, ?) > 0
                ORDER BY descricao
                LIMIT ?
                "#,
            )
            .bind(term)
            .bind(term)
            .bind(limit)
            .fetch_all()
            .await
            .map_err(|e| AppError::WarehouseError(format!("falha ao buscar produtos: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|r| ProductHit {
                code: r.codigo,
                description: r.descricao,
                package: Some(r.embalagem).filter(|p| !p.is_empty()),
            })
            .collect())
    }

    async fn search_supplier_groups(&self, term: &str, limit: u32) -> Result<Vec<SupplierGroupHit>, AppError> {
        let rows: Vec<GroupRow> = self
            .client
            .query(
                r#"
                SELECT DISTINCT
                    toString(SEQREDE) AS codigo,
                    ifNull(NOME_REDE, '') AS nome
                FROM gold.dim_fornecedor
                WHERE positionCaseInsensitiveUTF8(ifNull(NOME_REDE, ''), ?) > 0
                ORDER BY nome
                LIMIT ?
                "#,
            )
            .bind(term)
            .bind(limit)
            .fetch_all()
            .await
            .map_err(|e| AppError::WarehouseError(format!("falha ao buscar grupos: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|r| SupplierGroupHit { code: r.codigo, name: r.nome })
            .collect())
    }

    async fn count_contracts(&self, filter: &ContractFilter) -> Result<u64, AppError> {
        let sql = format!("SELECT count() FROM gold.dim_contrato WHERE {}", CONTRACT_FILTER);
        self.client
            .query(&sql)
            .bind(filter_term(&filter.subcontract_name))
            .bind(filter_term(&filter.contract_name))
            .fetch_one::<u64>()
            .await
            .map_err(|e| AppError::WarehouseError(format!("falha ao contar contratos: {}", e)))
    }

    async fn contracts(&self, filter: &ContractFilter, limit: u32, offset: u64) -> Result<Vec<ContractSummary>, AppError> {
        let sql = format!(
            r#"
            SELECT
                ifNull(nomesubcontrato, '') AS nomesubcontrato,
                ifNull(nomecontrato, '') AS nomecontrato,
                toInt64(nrocontrato) AS nrocontrato,
                toInt64(contrato) AS contrato,
                toInt64(subcontrato) AS subcontrato
            FROM gold.dim_contrato
            WHERE {}
            ORDER BY nomesubcontrato
            LIMIT ? OFFSET ?
            "#,
            CONTRACT_FILTER
        );

        let rows: Vec<ContractRow> = self
            .client
            .query(&sql)
            .bind(filter_term(&filter.subcontract_name))
            .bind(filter_term(&filter.contract_name))
            .bind(limit)
            .bind(offset)
            .fetch_all()
            .await
            .map_err(|e| AppError::WarehouseError(format!("falha ao listar contratos: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|r| ContractSummary {
                subcontract_name: r.nomesubcontrato,
                contract_name: r.nomecontrato,
                contract_number: r.nrocontrato,
                contract: r.contrato,
                subcontract: r.subcontrato,
            })
            .collect())
    }

    async fn contract_header(&self, subcontract: i64) -> Result<Option<ContractHeader>, AppError> {
        let row: Option<ContractHeaderRow> = self
            .client
            .query(
                r#"
                SELECT DISTINCT
                    ifNull(nomecontrato, '') AS nomecontrato,
                    ifNull(nomesubcontrato, '') AS nomesubcontrato,
                    toFloat64(ifNull(percdesconto, 0)) / 100 AS percdesconto,
                    toFloat64(ifNull(vlrdescontofixo, 0)) AS vlrdescontofixo,
                    ifNull(toString(dtainiciovalidade), '') AS inicio,
                    ifNull(toString(dtafimvalidade), '') AS fim,
                    toInt64(subcontrato) AS subcontrato
                FROM gold.dim_contrato
                WHERE subcontrato = ?
                LIMIT 1
                "#,
            )
            .bind(subcontract)
            .fetch_optional()
            .await
            .map_err(|e| AppError::WarehouseError(format!("falha ao detalhar contrato: {}", e)))?;

        row.map(|r| {
            Ok(ContractHeader {
                contract_name: r.nomecontrato,
                subcontract_name: r.nomesubcontrato,
                discount_rate: to_decimal(r.percdesconto)?,
                fixed_discount: to_decimal(r.vlrdescontofixo)?,
                valid_from: parse_optional_date(&r.inicio)?,
                valid_until: parse_optional_date(&r.fim)?,
                subcontract: r.subcontrato,
            })
        })
        .transpose()
    }

    async fn contract_suppliers(&self, subcontract: i64) -> Result<Vec<ContractSupplier>, AppError> {
        let rows: Vec<ContractSupplierRow> = self
            .client
            .query(
                r#"
                SELECT
                    ifNull(b.NOMERAZAO, '') AS razao,
                    ifNull(b.FANTASIA, '') AS fantasia,
                    b.cnpj_completo AS cnpj
                FROM gold.dim_contrato AS a
                INNER JOIN gold.dim_fornecedor AS b ON a.seqrede = b.SEQREDE
                WHERE a.subcontrato = ?
                  AND b.cnpj_completo != ''
                ORDER BY razao
                "#,
            )
            .bind(subcontract)
            .fetch_all()
            .await
            .map_err(|e| AppError::WarehouseError(format!("falha ao buscar fornecedores do contrato: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|r| ContractSupplier { corporate_name: r.razao, trade_name: r.fantasia, tax_id: r.cnpj })
            .collect())
    }

    async fn contract_products(&self, subcontract: i64, limit: u32) -> Result<Vec<ContractProduct>, AppError> {
        let rows: Vec<ContractProductRow> = self
            .client
            .query(
                r#"
                SELECT
                    toString(a.SEQPRODUTO) AS codigo,
                    ifNull(b.DESCCOMPLETA, '') AS descricao
                FROM gold.dim_produto_por_contrato AS a
                LEFT JOIN (
                    SELECT DISTINCT SEQPRODUTO, DESCCOMPLETA FROM gold.dim_produto
                ) AS b ON a.SEQPRODUTO = b.SEQPRODUTO
                WHERE a.seqidentificador = ?
                ORDER BY descricao
                LIMIT ?
                "#,
            )
            .bind(subcontract)
            .bind(limit)
            .fetch_all()
            .await
            .map_err(|e| AppError::WarehouseError(format!("falha ao buscar produtos do contrato: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|r| ContractProduct { code: r.codigo, description: r.descricao })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_dates_accept_blank_and_datetime_text() {
        assert_eq!(parse_optional_date("").unwrap(), None);
        assert_eq!(
            parse_optional_date("2025-01-31 00:00:00").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31)
        );
        assert!(parse_optional_date("31/01/2025").is_err());
    }
}
