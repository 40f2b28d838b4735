pub mod user_repo;
pub use user_repo::UserRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod transaction_repo;
pub use transaction_repo::TransactionRepository;
pub mod alert_repo;
pub use alert_repo::AlertRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
