pub mod user_repo;
pub use user_repo::UserRepository;
pub mod event_repo;
pub use event_repo::EventRepository;
pub mod grade_repo;
pub use grade_repo::GradeRepository;
pub mod item_repo;
pub use item_repo::ItemRepository;
pub mod distribution_repo;
pub use distribution_repo::DistributionRepository;
pub mod history_repo;
pub use history_repo::HistoryRepository;

#[cfg(test)]
pub mod fixtures;
