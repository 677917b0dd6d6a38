pub mod auth;
pub mod event_service;
pub mod grade_service;
pub mod item_service;
pub mod allocation_service;
pub mod history_service;
pub mod reconciliation_service;
pub mod export_service;
pub mod catalog_service;
pub mod user_service;
pub mod contract_service;
