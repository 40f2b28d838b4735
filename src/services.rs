pub mod alert_evaluator;
pub mod auth;
pub mod catalog_service;
pub mod dashboard_service;
pub mod inventory_service;
pub mod ledger;
pub mod notifier;
pub mod transaction_recorder;
