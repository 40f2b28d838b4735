// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::error::AppError;
use crate::models::transaction::{LedgerSubType, LedgerType};

pub const DEFAULT_WAREHOUSE: &str = "Main Warehouse";
pub const DEFAULT_MAX_THRESHOLD: i64 = 1000;
pub const DEFAULT_LEAD_TIME_DAYS: i32 = 7;

// Colunas NUMERIC(18, 4): 14 dígitos inteiros e 4 casas decimais
pub const NUMERIC_SCALE: u32 = 4;
const NUMERIC_INTEGER_DIGITS: u32 = 14;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_type", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum ItemType {
    RawMaterial,     // Vira "RAW_MATERIAL"
    FinishedProduct, // Vira "FINISHED_PRODUCT"
    WorkInProgress,
    Consumable,
}

// Situação do estoque, derivada de qtyOnHand e dos limites. Nunca é gravada.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Overstock,
    #[default]
    InStock,
}

impl StockStatus {
    /// Ordem das regras: zerado > abaixo do mínimo > acima do máximo.
    pub fn classify(on_hand: Decimal, min_threshold: Decimal, max_threshold: Decimal) -> Self {
        if on_hand.is_zero() {
            StockStatus::OutOfStock
        } else if on_hand <= min_threshold {
            StockStatus::LowStock
        } else if on_hand >= max_threshold {
            StockStatus::Overstock
        } else {
            StockStatus::InStock
        }
    }
}

// --- Localização física (armazém / corredor / prateleira) ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[schema(example = "Main Warehouse")]
    pub warehouse: String,
    #[serde(default)]
    #[schema(example = "A3")]
    pub aisle: String,
    #[serde(default)]
    #[schema(example = "S2")]
    pub shelf: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            warehouse: DEFAULT_WAREHOUSE.to_string(),
            aisle: String::new(),
            shelf: String::new(),
        }
    }
}

// --- Saldo de um item ---
// Só guardamos físico e reservado; o disponível é sempre calculado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevels {
    pub on_hand: Decimal,
    pub reserved: Decimal,
}

impl StockLevels {
    pub const ZERO: StockLevels = StockLevels {
        on_hand: Decimal::ZERO,
        reserved: Decimal::ZERO,
    };

    pub fn new(on_hand: Decimal, reserved: Decimal) -> Self {
        Self { on_hand, reserved }
    }

    pub fn available(&self) -> Decimal {
        self.on_hand - self.reserved
    }
}

// --- Item de estoque (tabela 'items') ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    #[schema(example = "SKU001")]
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category_id: Uuid,
    pub item_type: ItemType,
    #[schema(example = "pcs")]
    pub unit: String,
    pub unit_cost: Decimal,
    pub selling_price: Decimal,

    pub qty_on_hand: Decimal,
    pub qty_reserved: Decimal,
    pub qty_ordered: Decimal,
    // Derivado: qty_on_hand - qty_reserved. Recalculado em todo write.
    pub qty_available: Decimal,

    pub min_threshold: Decimal,
    pub max_threshold: Decimal,
    pub reorder_point: Decimal,

    pub supplier_id: Option<Uuid>,
    #[sqlx(flatten)]
    pub location: Location,
    pub is_active: bool,
    pub is_hazardous: bool,
    pub hazard_info: String,
    pub tags: Vec<String>,
    pub lead_time_days: i32,

    pub version: i64,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(default)]
    pub stock_status: StockStatus,
}

impl InventoryItem {
    pub fn levels(&self) -> StockLevels {
        StockLevels::new(self.qty_on_hand, self.qty_reserved)
    }

    /// Único caminho para alterar quantidades: recalcula disponível e status.
    pub fn apply_levels(&mut self, levels: StockLevels) {
        self.qty_on_hand = levels.on_hand;
        self.qty_reserved = levels.reserved;
        self.qty_available = levels.available();
        self.refresh_status();
    }

    pub fn refresh_status(&mut self) {
        self.stock_status =
            StockStatus::classify(self.qty_on_hand, self.min_threshold, self.max_threshold);
    }

    /// Usado pelos repositórios ao devolver linhas do banco.
    pub fn with_status(mut self) -> Self {
        self.refresh_status();
        self
    }
}

/// SKU único é comparado sem espaços nas pontas e em maiúsculas.
pub fn normalize_sku(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Maior valor absoluto (exclusivo) que uma coluna NUMERIC(18, 4) aceita.
pub fn numeric_limit() -> Decimal {
    Decimal::from(10_i64.pow(NUMERIC_INTEGER_DIGITS))
}

/// Cabe na coluna sem estourar e sem o Postgres arredondar as casas decimais.
pub fn fits_numeric(value: Decimal) -> bool {
    value.abs() < numeric_limit() && value.normalize().scale() <= NUMERIC_SCALE
}

/// Quantidade fora do livro-razão (ex.: qtyOrdered): >= 0 e armazenável.
pub fn check_quantity(value: Decimal, field: &str) -> Result<(), AppError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::InvalidQuantity(format!(
            "{} não pode ser negativo",
            field
        )));
    }
    if !fits_numeric(value) {
        return Err(AppError::InvalidQuantity(format!(
            "{} deve ter no máximo {} dígitos inteiros e {} casas decimais ({})",
            field, NUMERIC_INTEGER_DIGITS, NUMERIC_SCALE, value
        )));
    }
    Ok(())
}

// ---
// Validação Customizada
// ---
// Valores monetários e limites: não negativos e armazenáveis em NUMERIC(18, 4)
pub(crate) fn validate_amount(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    if !fits_numeric(*val) {
        let mut err = ValidationError::new("numeric");
        err.add_param("scale".into(), &NUMERIC_SCALE);
        err.message = Some(
            "O valor deve ter no máximo 14 dígitos inteiros e 4 casas decimais.".into(),
        );
        return Err(err);
    }
    Ok(())
}

// Campo ausente vira None (via `default`); `null` explícito vira Some(None)
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_lead_time(days: i32) -> Result<(), ValidationError> {
    if days < 0 {
        let mut err = ValidationError::new("range");
        err.message = Some("O prazo de entrega não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_thresholds(min: Decimal, max: Decimal) -> Result<(), AppError> {
    if min > max {
        return Err(AppError::ValidationFailed(format!(
            "minThreshold ({}) não pode ser maior que maxThreshold ({})",
            min, max
        )));
    }
    Ok(())
}

// ---
// Payload: NewItem (criação)
// ---
// Não existe campo qtyAvailable: ele nunca vem do cliente.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    #[validate(length(min = 1, message = "O SKU é obrigatório."))]
    #[schema(example = "SKU001")]
    pub sku: String,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    pub description: Option<String>,

    pub category_id: Uuid,

    pub item_type: ItemType,

    #[validate(length(min = 1, message = "A unidade é obrigatória."))]
    pub unit: String,

    #[validate(custom(function = "validate_amount"))]
    #[serde(default)]
    pub unit_cost: Decimal,

    #[validate(custom(function = "validate_amount"))]
    #[serde(default)]
    pub selling_price: Decimal,

    // Quantidades não passam pelo validator: o livro-razão devolve InvalidQuantity.
    #[serde(default)]
    pub qty_on_hand: Decimal,
    #[serde(default)]
    pub qty_reserved: Decimal,
    #[serde(default)]
    pub qty_ordered: Decimal,

    #[validate(custom(function = "validate_amount"))]
    #[serde(default)]
    pub min_threshold: Decimal,

    #[validate(custom(function = "validate_amount"))]
    pub max_threshold: Option<Decimal>,

    #[validate(custom(function = "validate_amount"))]
    pub reorder_point: Option<Decimal>,

    pub supplier_id: Option<Uuid>,
    pub location: Option<Location>,

    #[serde(default)]
    pub is_hazardous: bool,
    pub hazard_info: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(custom(function = "validate_lead_time"))]
    pub lead_time_days: Option<i32>,
    pub is_active: Option<bool>,
}

impl NewItem {
    /// Monta o item ainda sem id/datas, com quantidades zeradas.
    /// As quantidades iniciais entram pelo livro-razão (mutação Create).
    pub fn into_item(self, actor: Uuid) -> Result<InventoryItem, AppError> {
        let max_threshold = self
            .max_threshold
            .unwrap_or_else(|| Decimal::from(DEFAULT_MAX_THRESHOLD));
        validate_thresholds(self.min_threshold, max_threshold)?;

        check_quantity(self.qty_ordered, "qtyOrdered")?;

        let now = Utc::now();
        let mut item = InventoryItem {
            id: Uuid::nil(),
            sku: normalize_sku(&self.sku),
            name: self.name.trim().to_string(),
            description: self.description.unwrap_or_default(),
            category_id: self.category_id,
            item_type: self.item_type,
            unit: self.unit.trim().to_string(),
            unit_cost: self.unit_cost,
            selling_price: self.selling_price,
            qty_on_hand: Decimal::ZERO,
            qty_reserved: Decimal::ZERO,
            qty_ordered: self.qty_ordered,
            qty_available: Decimal::ZERO,
            min_threshold: self.min_threshold,
            max_threshold,
            // Ponto de pedido: se não vier, usa o mínimo
            reorder_point: self.reorder_point.unwrap_or(self.min_threshold),
            supplier_id: self.supplier_id,
            location: self.location.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            is_hazardous: self.is_hazardous,
            hazard_info: self.hazard_info.unwrap_or_default(),
            tags: clean_tags(self.tags),
            lead_time_days: self.lead_time_days.unwrap_or(DEFAULT_LEAD_TIME_DAYS),
            version: 0,
            created_by: actor,
            updated_by: actor,
            created_at: now,
            updated_at: now,
            stock_status: StockStatus::default(),
        };
        item.apply_levels(StockLevels::ZERO);
        Ok(item)
    }

    pub fn initial_levels(&self) -> StockLevels {
        StockLevels::new(self.qty_on_hand, self.qty_reserved)
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// ---
// Payload: ItemPatch (edição)
// ---
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[validate(length(min = 1, message = "O SKU não pode ser vazio."))]
    pub sku: Option<String>,
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub item_type: Option<ItemType>,
    #[validate(length(min = 1, message = "A unidade não pode ser vazia."))]
    pub unit: Option<String>,
    #[validate(custom(function = "validate_amount"))]
    pub unit_cost: Option<Decimal>,
    #[validate(custom(function = "validate_amount"))]
    pub selling_price: Option<Decimal>,

    /// Novo saldo físico absoluto. Gera uma movimentação IN/OUT.
    pub qty_on_hand: Option<Decimal>,
    pub qty_ordered: Option<Decimal>,

    #[validate(custom(function = "validate_amount"))]
    pub min_threshold: Option<Decimal>,
    #[validate(custom(function = "validate_amount"))]
    pub max_threshold: Option<Decimal>,
    #[validate(custom(function = "validate_amount"))]
    pub reorder_point: Option<Decimal>,

    /// Ausente = mantém; `null` = remove o fornecedor.
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<Uuid>)]
    pub supplier_id: Option<Option<Uuid>>,
    pub location: Option<Location>,
    pub is_active: Option<bool>,
    pub is_hazardous: Option<bool>,
    pub hazard_info: Option<String>,
    pub tags: Option<Vec<String>>,
    #[validate(custom(function = "validate_lead_time"))]
    pub lead_time_days: Option<i32>,

    /// Motivo gravado na movimentação quando qtyOnHand muda.
    pub reason: Option<String>,
    pub reference: Option<String>,
}

impl ItemPatch {
    /// Aplica os campos descritivos. Quantidades do livro-razão ficam de fora.
    pub fn apply_descriptive(&self, item: &mut InventoryItem, actor: Uuid) -> Result<(), AppError> {
        if let Some(sku) = &self.sku {
            item.sku = normalize_sku(sku);
        }
        if let Some(name) = &self.name {
            item.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(category_id) = self.category_id {
            item.category_id = category_id;
        }
        if let Some(item_type) = self.item_type {
            item.item_type = item_type;
        }
        if let Some(unit) = &self.unit {
            item.unit = unit.trim().to_string();
        }
        if let Some(unit_cost) = self.unit_cost {
            item.unit_cost = unit_cost;
        }
        if let Some(selling_price) = self.selling_price {
            item.selling_price = selling_price;
        }
        if let Some(qty_ordered) = self.qty_ordered {
            check_quantity(qty_ordered, "qtyOrdered")?;
            item.qty_ordered = qty_ordered;
        }
        if let Some(min) = self.min_threshold {
            item.min_threshold = min;
        }
        if let Some(max) = self.max_threshold {
            item.max_threshold = max;
        }
        if let Some(reorder_point) = self.reorder_point {
            item.reorder_point = reorder_point;
        }
        if let Some(supplier_id) = self.supplier_id {
            item.supplier_id = supplier_id;
        }
        if let Some(location) = &self.location {
            item.location = location.clone();
        }
        if let Some(is_active) = self.is_active {
            item.is_active = is_active;
        }
        if let Some(is_hazardous) = self.is_hazardous {
            item.is_hazardous = is_hazardous;
        }
        if let Some(hazard_info) = &self.hazard_info {
            item.hazard_info = hazard_info.clone();
        }
        if let Some(tags) = &self.tags {
            item.tags = clean_tags(tags.clone());
        }
        if let Some(lead_time_days) = self.lead_time_days {
            item.lead_time_days = lead_time_days;
        }

        validate_thresholds(item.min_threshold, item.max_threshold)?;

        item.updated_by = actor;
        item.refresh_status();
        Ok(())
    }
}

// ---
// Payload: ajuste de estoque por delta (entrada/saída avulsa)
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    /// Positivo = entrada, negativo = saída
    #[schema(example = 25)]
    pub delta: Decimal,
    /// IN, OUT ou ADJUST. Se vier vazio, é deduzido do sinal do delta.
    pub ledger_type: Option<LedgerType>,
    pub sub_type: Option<LedgerSubType>,
    #[validate(custom(function = "validate_amount"))]
    pub unit_cost: Option<Decimal>,
    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    pub reason: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub customer_ref: Option<String>,
}

// ---
// Payload: reserva / liberação de reserva
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPayload {
    #[schema(example = 5)]
    pub quantity: Decimal,
    /// ORDER_RESERVE / PRODUCTION_RESERVE (ou *_RELEASE na liberação)
    pub sub_type: Option<LedgerSubType>,
    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    pub reason: String,
    pub reference: Option<String>,
}

// ---
// Filtros da listagem de itens (?itemType=&search=&lowStock=true ...)
// ---
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ItemFilter {
    pub item_type: Option<ItemType>,
    pub category_id: Option<Uuid>,
    /// Busca por nome ou SKU (sem diferenciar maiúsculas)
    pub search: Option<String>,
    /// qtyOnHand <= minThreshold
    pub low_stock: Option<bool>,
    pub hazardous: Option<bool>,
    /// qtyReserved > 0
    pub reserved: Option<bool>,
    /// qtyAvailable > 0
    pub available: Option<bool>,
    #[serde(default)]
    pub include_inactive: bool,
}

// Confirmação de exclusão
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConfirmation {
    pub id: Uuid,
    pub sku: String,
    pub transaction_id: String,
    pub message: String,
}
