pub mod auth;
pub mod events;
pub mod grades;
pub mod items;
pub mod history;
pub mod catalog;
pub mod users;
pub mod contracts;
