use rust_decimal::Decimal;

use crate::common::error::AppError;

// ---
// Helper de constraints: traduz violações do Postgres em erros amigáveis
// ---
/// Converte violações de unicidade/chave estrangeira em `AppError::Conflict`.
/// Qualquer outro erro segue como `DatabaseError`.
pub(crate) fn map_constraint_error(
    e: sqlx::Error,
    on_unique: impl FnOnce() -> String,
    on_foreign_key: impl FnOnce() -> String,
) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict(on_unique());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::Conflict(on_foreign_key());
        }
    }
    e.into()
}

/// `true` quando o erro indica que a tabela consultada não existe (SQLSTATE 42P01).
pub(crate) fn is_undefined_table(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code == "42P01")
        .unwrap_or(false)
}

/// `true` quando o valor cabe em uma coluna NUMERIC(precision, scale) sem arredondamento.
pub(crate) fn fits_numeric(value: Decimal, precision: u32, scale: u32) -> bool {
    let value = value.normalize();
    if value.scale() > scale {
        return false;
    }
    value.abs() < Decimal::from(10_i64.pow(precision - scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fit_checks_integer_digits_and_scale() {
        assert!(fits_numeric(Decimal::new(999_999_999_999, 2), 12, 2));
        assert!(!fits_numeric(Decimal::from(10_000_000_000_i64), 12, 2));
        assert!(fits_numeric(Decimal::new(33330, 3), 5, 2)); // 33.330
        assert!(!fits_numeric(Decimal::new(33333, 3), 5, 2)); // 33.333
        assert!(fits_numeric(Decimal::ZERO, 5, 2));
    }
}
