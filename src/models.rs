pub mod auth;
pub mod catalog;
pub mod contract;
pub mod dashboard;
pub mod distribution;
pub mod event;
pub mod grade;
pub mod history;
pub mod item;
