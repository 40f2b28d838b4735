pub mod alerts;
pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod events;
pub mod inventory;
pub mod transactions;
