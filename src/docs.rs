// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- INVENTORY ---
        handlers::inventory::create_item,
        handlers::inventory::list_items,
        handlers::inventory::get_item,
        handlers::inventory::update_item,
        handlers::inventory::delete_item,
        handlers::inventory::adjust_stock,
        handlers::inventory::reserve_stock,
        handlers::inventory::release_stock,
        handlers::inventory::item_history,

        // --- Transactions ---
        handlers::transactions::list_transactions,

        // --- Alerts ---
        handlers::alerts::list_alerts,
        handlers::alerts::resolve_alert,

        // --- Catalog ---
        handlers::catalog::list_categories,
        handlers::catalog::create_category,
        handlers::catalog::list_suppliers,
        handlers::catalog::create_supplier,

        // --- Dashboard ---
        handlers::dashboard::get_stats,

        // --- Events ---
        handlers::events::stream_events,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Inventory ---
            models::inventory::ItemType,
            models::inventory::StockStatus,
            models::inventory::Location,
            models::inventory::InventoryItem,
            models::inventory::NewItem,
            models::inventory::ItemPatch,
            models::inventory::AdjustStockPayload,
            models::inventory::ReservationPayload,
            models::inventory::DeleteConfirmation,

            // --- Transactions ---
            models::transaction::LedgerType,
            models::transaction::LedgerSubType,
            models::transaction::TransactionStatus,
            models::transaction::StockTransaction,
            models::transaction::MovementReceipt,

            // --- Alerts ---
            models::alert::AlertKind,
            models::alert::AlertPriority,
            models::alert::ActionTaken,
            models::alert::StockAlert,
            models::alert::ResolveAlertPayload,

            // --- Catalog ---
            models::catalog::Category,
            models::catalog::CreateCategoryPayload,
            models::catalog::Supplier,
            models::catalog::SupplierAddress,
            models::catalog::CreateSupplierPayload,

            // --- Dashboard ---
            models::dashboard::DashboardStats,

            // --- Events ---
            services::notifier::EventKind,
            services::notifier::InventoryEvent,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Inventory", description = "Itens, saldos e movimentações de estoque"),
        (name = "Transactions", description = "Livro-razão de movimentações"),
        (name = "Alerts", description = "Alertas de estoque baixo, zerado e excesso"),
        (name = "Catalog", description = "Categorias e Fornecedores"),
        (name = "Dashboard", description = "Indicadores do Estoque"),
        (name = "Events", description = "Notificações em tempo real (SSE)")
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
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
