// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::list_buyers,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::toggle_user_status,
        handlers::users::delete_user,

        // --- Eventos ---
        handlers::events::list_events,
        handlers::events::create_event,
        handlers::events::update_event,
        handlers::events::delete_event,

        // --- Grades ---
        handlers::grades::list_grades,
        handlers::grades::create_grade,
        handlers::grades::get_grade,
        handlers::grades::update_grade,
        handlers::grades::delete_grade,
        handlers::grades::finalize_grade,

        // --- Apuração ---
        handlers::grades::get_dashboard,
        handlers::grades::export_grade,

        // --- Itens / Distribuição ---
        handlers::items::create_item,
        handlers::items::get_item,
        handlers::items::update_item,
        handlers::items::delete_item,
        handlers::items::get_distribution,
        handlers::items::save_distribution,

        // --- Histórico / Catálogo ---
        handlers::history::refresh_history,
        handlers::catalog::search_products,
        handlers::catalog::search_supplier_groups,

        // --- Contratos ---
        handlers::contracts::list_contracts,
        handlers::contracts::contract_detail,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::NewUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::UserPage,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Cadastro ---
            models::event::Event,
            models::grade::GradeStatus,
            models::grade::Grade,
            models::grade::GradeSummary,
            models::grade::GradeDetail,
            models::grade::SupplierGroupLink,
            models::grade::ItemOverview,
            models::item::UnitOfMeasure,
            models::item::Item,
            models::item::Sku,
            models::item::ItemDetail,

            // --- Distribuição ---
            models::distribution::Distribution,
            models::distribution::Store,
            models::distribution::PlanRow,
            models::distribution::DistributionPlan,

            // --- Apuração ---
            models::dashboard::ReconciliationRow,
            models::dashboard::ReconciliationTotals,
            models::dashboard::TimelineEntry,
            models::dashboard::Offender,
            models::dashboard::GradeDashboard,

            // --- Histórico / Catálogo ---
            models::history::QuarterWindow,
            models::history::StoreShareSnapshot,
            models::history::RefreshSummary,
            models::catalog::ProductHit,
            models::catalog::SupplierGroupHit,

            // --- Contratos ---
            models::contract::ContractSummary,
            models::contract::ContractPage,
            models::contract::ContractHeader,
            models::contract::ContractSupplier,
            models::contract::ContractProduct,
            models::contract::ContractDetail,

            // --- Payloads ---
            handlers::events::EventPayload,
            handlers::grades::GradePayload,
            handlers::grades::SupplierGroupPayload,
            handlers::items::ItemPayload,
            handlers::items::SkuPayload,
            handlers::items::SaveDistributionPayload,
            services::allocation_service::PlanRowInput,
        )
    ),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Users", description = "Usuário logado, compradores e administração de usuários"),
        (name = "Eventos", description = "Eventos comerciais"),
        (name = "Grades", description = "Grades de compra e finalização"),
        (name = "Itens", description = "Itens negociados e SKUs"),
        (name = "Distribuição", description = "Distribuição do volume por associado"),
        (name = "Apuração", description = "Meta x realizado e exportação"),
        (name = "Histórico", description = "Participação histórica dos associados"),
        (name = "Catálogo", description = "Busca no warehouse"),
        (name = "Contratos", description = "Contratos comerciais do warehouse")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_the_distribution_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/items/{id}/distribution"));
        assert!(doc.paths.paths.contains_key("/api/grades/{id}/finalize"));
    }

    #[test]
    fn registration_is_not_public() {
        let doc = ApiDoc::openapi();
        assert!(!doc.paths.paths.contains_key("/api/auth/register"));
        assert!(doc.paths.paths.contains_key("/api/users/{id}/toggle-status"));
        assert!(doc.paths.paths.contains_key("/api/contracts/{subcontract}"));
    }
}
