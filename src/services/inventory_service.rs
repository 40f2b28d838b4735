// src/services/inventory_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{AlertRepository, InventoryRepository, TransactionRepository},
    models::{
        alert::{AlertFilter, ResolveAlertPayload, StockAlert},
        inventory::{
            AdjustStockPayload, DeleteConfirmation, InventoryItem, ItemFilter, ItemPatch,
            NewItem, ReservationPayload,
        },
        transaction::{LedgerType, MovementReceipt, StockTransaction, TransactionFilter},
    },
    services::{
        alert_evaluator::{self, AlertAction},
        ledger::{self, LedgerPlan, Movement, StockMutation},
        notifier::{EventKind, StockNotifier},
        transaction_recorder::{self, EntryDetails, MAX_ID_ATTEMPTS},
    },
};

pub const DEFAULT_ITEM_PAGE_SIZE: i64 = 20;
pub const DEFAULT_TRANSACTION_PAGE_SIZE: i64 = 50;

#[derive(Clone)]
pub struct InventoryService {
    pool: PgPool,
    inventory_repo: InventoryRepository,
    transaction_repo: TransactionRepository,
    alert_repo: AlertRepository,
    notifier: StockNotifier,
}

impl InventoryService {
    pub fn new(
        pool: PgPool,
        inventory_repo: InventoryRepository,
        transaction_repo: TransactionRepository,
        alert_repo: AlertRepository,
        notifier: StockNotifier,
    ) -> Self {
        Self {
            pool,
            inventory_repo,
            transaction_repo,
            alert_repo,
            notifier,
        }
    }

    // ---
    // Mutações
    // ---
    // Cada mutação é uma transação do banco: item, movimentação e alerta
    // são gravados juntos ou nada é gravado. A notificação só sai depois do commit.

    // --- CREATE ITEM ---
    pub async fn create_item(&self, payload: NewItem, actor: Uuid) -> Result<InventoryItem, AppError> {
        let initial = payload.initial_levels();
        let plans = ledger::plan_creation(initial.on_hand, initial.reserved)?;

        let mut item = payload.into_item(actor)?;
        if let Some(last) = plans.last() {
            item.apply_levels(last.after);
        }

        let mut tx = self.pool.begin().await?;

        let created = self.inventory_repo.insert(&mut *tx, &item).await?;

        // Um lançamento por plano; cada um com o saldo daquele passo
        let mut step = created.clone();
        for plan in &plans {
            step.apply_levels(plan.after);
            let reason = match plan.ledger_type {
                LedgerType::Reserve => "Reserva inicial",
                _ => "Estoque inicial",
            };
            self.write_transaction(&mut tx, &step, plan, &EntryDetails::new(reason), actor)
                .await?;
        }
        self.reconcile_alerts(&mut tx, &created).await?;

        tx.commit().await?;

        tracing::info!("📦 Item {} criado com saldo {}", created.sku, created.qty_on_hand);
        self.notifier.publish(EventKind::Created, created.clone());
        Ok(created)
    }

    // --- UPDATE ITEM ---
    /// Campos descritivos não geram movimentação. Só `qtyOnHand` diferente
    /// do atual gera um lançamento IN/OUT.
    pub async fn update_item(
        &self,
        id: Uuid,
        patch: ItemPatch,
        actor: Uuid,
    ) -> Result<InventoryItem, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut item = self.lock_item(&mut tx, id).await?;
        patch.apply_descriptive(&mut item, actor)?;

        let plan = match patch.qty_on_hand {
            Some(target) => ledger::plan(item.levels(), StockMutation::QuantitySet { target })?,
            None => None,
        };
        if let Some(plan) = &plan {
            item.apply_levels(plan.after);
        }

        let updated = self.inventory_repo.update(&mut *tx, &item).await?;

        if let Some(plan) = &plan {
            let reason = patch
                .reason
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "Atualização de estoque".to_string());
            let details = EntryDetails::new(reason).with_reference(patch.reference.clone());
            self.write_transaction(&mut tx, &updated, plan, &details, actor)
                .await?;
        }
        self.reconcile_alerts(&mut tx, &updated).await?;

        tx.commit().await?;

        tracing::info!("✏️ Item {} atualizado (versão {})", updated.sku, updated.version);
        self.notifier.publish(EventKind::Updated, updated.clone());
        Ok(updated)
    }

    // --- DELETE ITEM ---
    /// Exclusão física, precedida de um lançamento OUT que zera o saldo.
    pub async fn delete_item(&self, id: Uuid, actor: Uuid) -> Result<DeleteConfirmation, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut snapshot = self.lock_item(&mut tx, id).await?;
        let plan = ledger::plan_required(snapshot.levels(), StockMutation::Delete)?;
        snapshot.apply_levels(plan.after);
        snapshot.updated_by = actor;

        let transaction = self
            .write_transaction(&mut tx, &snapshot, &plan, &EntryDetails::new("Item excluído"), actor)
            .await?;
        self.inventory_repo.delete(&mut *tx, id).await?;

        tx.commit().await?;

        tracing::info!("🗑️ Item {} excluído ({})", snapshot.sku, transaction.transaction_id);
        let confirmation = DeleteConfirmation {
            id,
            sku: snapshot.sku.clone(),
            transaction_id: transaction.transaction_id,
            message: format!("Item {} excluído", snapshot.sku),
        };
        self.notifier.publish(EventKind::Deleted, snapshot);
        Ok(confirmation)
    }

    // --- ADJUST (entrada/saída avulsa) ---
    pub async fn adjust_stock(
        &self,
        id: Uuid,
        payload: AdjustStockPayload,
        actor: Uuid,
    ) -> Result<MovementReceipt, AppError> {
        let movement = match (payload.ledger_type, payload.sub_type) {
            (Some(ledger_type), sub_type) => Some(Movement { ledger_type, sub_type }),
            (None, Some(sub_type)) => Some(Movement {
                ledger_type: sub_type.parent(),
                sub_type: Some(sub_type),
            }),
            (None, None) => None,
        };
        let details = EntryDetails {
            reason: payload.reason,
            reference: payload.reference,
            notes: payload.notes,
            unit_cost: payload.unit_cost,
            supplier_id: payload.supplier_id,
            customer_ref: payload.customer_ref,
        };
        self.apply_movement(
            id,
            StockMutation::QuantityDelta {
                delta: payload.delta,
                movement,
            },
            details,
            actor,
        )
        .await
    }

    // --- RESERVE / RELEASE ---
    pub async fn reserve_stock(
        &self,
        id: Uuid,
        payload: ReservationPayload,
        actor: Uuid,
    ) -> Result<MovementReceipt, AppError> {
        let mutation = StockMutation::Reserve {
            quantity: payload.quantity,
            sub_type: payload.sub_type,
        };
        let details = EntryDetails::new(payload.reason).with_reference(payload.reference);
        self.apply_movement(id, mutation, details, actor).await
    }

    pub async fn release_stock(
        &self,
        id: Uuid,
        payload: ReservationPayload,
        actor: Uuid,
    ) -> Result<MovementReceipt, AppError> {
        let mutation = StockMutation::Release {
            quantity: payload.quantity,
            sub_type: payload.sub_type,
        };
        let details = EntryDetails::new(payload.reason).with_reference(payload.reference);
        self.apply_movement(id, mutation, details, actor).await
    }

    // --- RESOLVE ALERT ---
    pub async fn resolve_alert(
        &self,
        id: Uuid,
        payload: ResolveAlertPayload,
        actor: Uuid,
    ) -> Result<StockAlert, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut alert = self
            .alert_repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("alerta {}", id)))?;
        alert.resolve(actor, payload.notes, payload.action_taken)?;
        let saved = self.alert_repo.save_resolution(&mut *tx, &alert).await?;

        tx.commit().await?;

        tracing::info!("✅ Alerta {} resolvido ({:?})", saved.id, saved.action_taken);
        Ok(saved)
    }

    // ---
    // Leituras (sem lock e sem efeitos colaterais)
    // ---

    pub async fn get_item(&self, id: Uuid) -> Result<InventoryItem, AppError> {
        self.inventory_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))
    }

    pub async fn list_items(
        &self,
        filter: ItemFilter,
        page: PageParams,
    ) -> Result<Paginated<InventoryItem>, AppError> {
        let request = page.resolve(DEFAULT_ITEM_PAGE_SIZE);
        let (items, total) = self.inventory_repo.list(&filter, request).await?;
        Ok(Paginated::new(items, total, request))
    }

    /// O histórico sobrevive à exclusão do item, por isso não exige que ele exista.
    pub async fn item_history(&self, id: Uuid, limit: i64) -> Result<Vec<StockTransaction>, AppError> {
        self.transaction_repo.history(&self.pool, id, limit).await
    }

    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: PageParams,
    ) -> Result<Paginated<StockTransaction>, AppError> {
        let request = page.resolve(DEFAULT_TRANSACTION_PAGE_SIZE);
        let (rows, total) = self.transaction_repo.list(&filter, request).await?;
        Ok(Paginated::new(rows, total, request))
    }

    pub async fn list_alerts(&self, filter: AlertFilter) -> Result<Vec<StockAlert>, AppError> {
        self.alert_repo.list(&filter).await
    }

    // ---
    // Auxiliares
    // ---

    async fn apply_movement(
        &self,
        id: Uuid,
        mutation: StockMutation,
        details: EntryDetails,
        actor: Uuid,
    ) -> Result<MovementReceipt, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut item = self.lock_item(&mut tx, id).await?;
        let plan = ledger::plan_required(item.levels(), mutation)?;
        item.apply_levels(plan.after);
        item.updated_by = actor;

        let updated = self.inventory_repo.update(&mut *tx, &item).await?;
        let transaction = self
            .write_transaction(&mut tx, &updated, &plan, &details, actor)
            .await?;
        self.reconcile_alerts(&mut tx, &updated).await?;

        tx.commit().await?;

        tracing::info!(
            "🔁 {} {:?}/{:?} {} -> saldo {} (disponível {})",
            updated.sku,
            transaction.ledger_type,
            transaction.sub_type,
            transaction.quantity,
            updated.qty_on_hand,
            updated.qty_available
        );
        self.notifier.publish(EventKind::Updated, updated.clone());
        Ok(MovementReceipt {
            item: updated,
            transaction,
        })
    }

    async fn lock_item(&self, conn: &mut PgConnection, id: Uuid) -> Result<InventoryItem, AppError> {
        self.inventory_repo
            .find_for_update(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))
    }

    /// Grava o lançamento; se o `transaction_id` colidir, gera outro.
    async fn write_transaction(
        &self,
        conn: &mut PgConnection,
        item: &InventoryItem,
        plan: &LedgerPlan,
        details: &EntryDetails,
        actor: Uuid,
    ) -> Result<StockTransaction, AppError> {
        let mut draft = transaction_recorder::record(item, plan, details, actor)?;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            if let Some(saved) = self.transaction_repo.insert(&mut *conn, &draft).await? {
                return Ok(saved);
            }
            tracing::warn!(
                "ID de movimentação {} já existe (tentativa {}/{})",
                draft.transaction_id,
                attempt,
                MAX_ID_ATTEMPTS
            );
            draft.transaction_id = transaction_recorder::generate_transaction_id();
        }

        Err(AppError::DuplicateKey(format!(
            "não foi possível gerar um ID de movimentação único para {}",
            item.sku
        )))
    }

    async fn reconcile_alerts(&self, conn: &mut PgConnection, item: &InventoryItem) -> Result<(), AppError> {
        let open = self.alert_repo.open_for_item(&mut *conn, item.id).await?;

        if let AlertAction::Opened(alert) = alert_evaluator::reconcile(item, &open) {
            if let Some(created) = self.alert_repo.insert(&mut *conn, &alert).await? {
                tracing::warn!("⚠️ Alerta {:?} aberto para {}: {}", created.kind, item.sku, created.message);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::{tests::sample_item, StockLevels};
    use crate::models::transaction::{LedgerSubType, LedgerType};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    // Mesmo encadeamento das mutações, sem banco: plano -> item -> lançamento -> alerta
    fn run(item: &mut InventoryItem, mutation: StockMutation, reason: &str) -> (StockTransaction, AlertAction) {
        let plan = ledger::plan_required(item.levels(), mutation).unwrap();
        item.apply_levels(plan.after);
        let draft = transaction_recorder::record(item, &plan, &EntryDetails::new(reason), item.created_by)
            .unwrap();
        let txn = StockTransaction {
            id: Uuid::new_v4(),
            transaction_id: draft.transaction_id,
            item_id: draft.item_id,
            item_sku: draft.item_sku,
            ledger_type: draft.ledger_type,
            sub_type: draft.sub_type,
            quantity: draft.quantity,
            inbound: draft.inbound,
            unit_cost: draft.unit_cost,
            total_value: draft.total_value,
            balance_after: draft.balance_after,
            available_after: draft.available_after,
            reason: draft.reason,
            reference: draft.reference,
            notes: draft.notes,
            supplier_id: draft.supplier_id,
            customer_ref: draft.customer_ref,
            created_by: draft.created_by,
            approved_by: None,
            approved_at: None,
            status: draft.status,
            created_at: chrono::Utc::now(),
        };
        (txn, alert_evaluator::reconcile(item, &[]))
    }

    #[test]
    fn create_then_draw_down_below_minimum() {
        let mut item = sample_item(Decimal::ZERO, dec!(5), dec!(1000));
        item.apply_levels(StockLevels::ZERO);

        let (created, alert) = run(
            &mut item,
            StockMutation::Create { on_hand: dec!(100) },
            "Estoque inicial",
        );
        assert_eq!((created.ledger_type, created.sub_type), (LedgerType::In, LedgerSubType::Production));
        assert_eq!(created.balance_after, dec!(100));
        assert_eq!(alert, AlertAction::None);

        let (out, alert) = run(&mut item, StockMutation::QuantitySet { target: dec!(3) }, "Contagem");
        assert_eq!((out.ledger_type, out.sub_type), (LedgerType::Out, LedgerSubType::Consumption));
        assert_eq!(out.quantity, dec!(97));
        assert_eq!(out.balance_after, dec!(3));
        assert_eq!(item.qty_available, dec!(3));
        assert!(matches!(alert, AlertAction::Opened(a) if a.priority == crate::models::alert::AlertPriority::Medium));
    }

    #[test]
    fn failed_mutation_leaves_the_item_untouched() {
        let item = sample_item(dec!(3), dec!(5), dec!(1000));
        let before = item.clone();
        let err = ledger::plan_required(item.levels(), StockMutation::QuantityDelta { delta: dec!(-4), movement: None })
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)));
        assert_eq!(item.levels(), before.levels());
        assert_eq!(item.qty_available, before.qty_available);
    }

    #[test]
    fn every_committed_step_records_the_post_state() {
        let mut item = sample_item(dec!(50), dec!(5), dec!(1000));
        let steps = [
            StockMutation::Reserve { quantity: dec!(20), sub_type: None },
            StockMutation::QuantityDelta { delta: dec!(-10), movement: None },
            StockMutation::Release { quantity: dec!(5), sub_type: None },
            StockMutation::QuantityDelta { delta: dec!(7.5), movement: None },
        ];
        for step in steps {
            let (txn, _) = run(&mut item, step, "Movimento");
            assert_eq!(txn.balance_after, item.qty_on_hand);
            assert_eq!(txn.available_after, item.qty_available);
            assert_eq!(item.qty_available, item.qty_on_hand - item.qty_reserved);
        }
        assert_eq!(item.levels(), StockLevels::new(dec!(47.5), dec!(15)));
    }
}

// Contra o Postgres de verdade: cada teste recebe um banco novo com as migrações aplicadas
#[cfg(all(test, feature = "db-tests"))]
mod db_tests {
    use super::*;
    use crate::models::alert::{ActionTaken, AlertKind};
    use crate::models::transaction::LedgerSubType;
    use futures::future::join_all;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    struct Fixture {
        service: InventoryService,
        pool: PgPool,
        actor: Uuid,
        category: Uuid,
    }

    async fn fixture(pool: PgPool) -> Fixture {
        let actor: Uuid = sqlx::query_scalar(
            "INSERT INTO users (email, username, first_name, last_name, password_hash)
             VALUES ('estoque@example.com', 'estoque', 'Equipe', 'Estoque', 'x') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        let category: Uuid = sqlx::query_scalar(
            "INSERT INTO categories (name, code, created_by) VALUES ('Fixadores', 'FIX', $1) RETURNING id",
        )
        .bind(actor)
        .fetch_one(&pool)
        .await
        .unwrap();

        let service = InventoryService::new(
            pool.clone(),
            InventoryRepository::new(pool.clone()),
            TransactionRepository::new(pool.clone()),
            AlertRepository::new(pool.clone()),
            StockNotifier::new(16),
        );
        Fixture { service, pool, actor, category }
    }

    fn new_item(category: Uuid, sku: &str, on_hand: Decimal, min: Decimal) -> NewItem {
        serde_json::from_value(serde_json::json!({
            "sku": sku,
            "name": "Parafuso",
            "categoryId": category,
            "itemType": "RAW_MATERIAL",
            "unit": "pcs",
            "unitCost": 2.5,
            "qtyOnHand": on_hand,
            "minThreshold": min
        }))
        .unwrap()
    }

    fn set_on_hand(target: Decimal) -> ItemPatch {
        ItemPatch {
            qty_on_hand: Some(target),
            ..Default::default()
        }
    }

    fn delta(value: Decimal) -> AdjustStockPayload {
        AdjustStockPayload {
            delta: value,
            ledger_type: None,
            sub_type: None,
            unit_cost: None,
            reason: "Movimento".into(),
            reference: None,
            notes: None,
            supplier_id: None,
            customer_ref: None,
        }
    }

    async fn count_transactions(pool: &PgPool, item_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM stock_transactions WHERE item_id = $1")
            .bind(item_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn open_alerts(service: &InventoryService, item_id: Uuid) -> Vec<StockAlert> {
        service
            .list_alerts(AlertFilter {
                resolved: Some(false),
                priority: None,
                item_id: Some(item_id),
            })
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn item_lifecycle_from_creation_to_deletion(pool: PgPool) {
        let f = fixture(pool).await;
        let svc = &f.service;

        // Criação: um IN/PRODUCTION com o saldo inicial, sem alerta
        let item = svc
            .create_item(new_item(f.category, "sku001", dec!(10), dec!(5)), f.actor)
            .await
            .unwrap();
        assert_eq!(item.sku, "SKU001");
        let history = svc.item_history(item.id, 50).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!((history[0].ledger_type, history[0].sub_type), (LedgerType::In, LedgerSubType::Production));
        assert_eq!(history[0].balance_after, dec!(10));
        assert_eq!(history[0].available_after, dec!(10));
        assert!(open_alerts(svc, item.id).await.is_empty());

        // Baixa para 3: OUT/CONSUMPTION de 7 e alerta de estoque baixo
        svc.update_item(item.id, set_on_hand(dec!(3)), f.actor).await.unwrap();
        let history = svc.item_history(item.id, 50).await.unwrap();
        assert_eq!((history[0].ledger_type, history[0].sub_type), (LedgerType::Out, LedgerSubType::Consumption));
        assert_eq!(history[0].quantity, dec!(7));
        assert_eq!(history[0].balance_after, dec!(3));
        let alerts = open_alerts(svc, item.id).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowStock);

        // Zerado: abre OUT_OF_STOCK e o LOW_STOCK continua aberto
        svc.update_item(item.id, set_on_hand(dec!(0)), f.actor).await.unwrap();
        let kinds: HashSet<AlertKind> = open_alerts(svc, item.id).await.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, HashSet::from([AlertKind::LowStock, AlertKind::OutOfStock]));

        // Saldo negativo: rejeitado e nada muda
        let before = svc.get_item(item.id).await.unwrap();
        let err = svc
            .update_item(item.id, set_on_hand(dec!(-5)), f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)));
        let after = svc.get_item(item.id).await.unwrap();
        assert_eq!(after.version, before.version);
        assert_eq!(after.qty_on_hand, Decimal::ZERO);
        assert_eq!(count_transactions(&f.pool, item.id).await, 3);

        // Resolver duas vezes: a segunda falha
        let low = open_alerts(svc, item.id)
            .await
            .into_iter()
            .find(|a| a.kind == AlertKind::LowStock)
            .unwrap();
        let payload = ResolveAlertPayload {
            notes: Some("Pedido de compra emitido".into()),
            action_taken: ActionTaken::Reordered,
        };
        let resolved = svc.resolve_alert(low.id, payload.clone(), f.actor).await.unwrap();
        assert!(resolved.is_resolved);
        assert_eq!(resolved.resolved_by, Some(f.actor));
        let err = svc.resolve_alert(low.id, payload.clone(), f.actor).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyResolved(id) if id == low.id));
        let err = svc.resolve_alert(Uuid::new_v4(), payload, f.actor).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Exclusão: item some, o histórico fica com o OUT final
        let confirmation = svc.delete_item(item.id, f.actor).await.unwrap();
        assert_eq!(confirmation.sku, "SKU001");
        assert!(matches!(svc.get_item(item.id).await, Err(AppError::NotFound(_))));
        let history = svc.item_history(item.id, 50).await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].transaction_id, confirmation.transaction_id);
        assert_eq!((history[0].ledger_type, history[0].sub_type), (LedgerType::Out, LedgerSubType::Consumption));
        assert_eq!(history[0].balance_after, Decimal::ZERO);
        assert_eq!(history[0].available_after, Decimal::ZERO);
    }

    #[sqlx::test]
    async fn every_mutation_leaves_one_matching_entry(pool: PgPool) {
        let f = fixture(pool).await;
        let svc = &f.service;
        let item = svc
            .create_item(new_item(f.category, "SKU-AUDIT", dec!(50), dec!(5)), f.actor)
            .await
            .unwrap();

        let reserve = ReservationPayload {
            quantity: dec!(20),
            sub_type: None,
            reason: "Pedido 42".into(),
            reference: Some("PED-42".into()),
        };
        let receipt = svc.reserve_stock(item.id, reserve, f.actor).await.unwrap();
        assert_eq!(receipt.item.qty_available, dec!(30));
        assert_eq!(receipt.transaction.available_after, dec!(30));

        let receipt = svc.adjust_stock(item.id, delta(dec!(-10)), f.actor).await.unwrap();
        assert_eq!(receipt.transaction.balance_after, receipt.item.qty_on_hand);

        let release = ReservationPayload {
            quantity: dec!(5),
            sub_type: None,
            reason: "Pedido 42 parcial".into(),
            reference: None,
        };
        svc.release_stock(item.id, release, f.actor).await.unwrap();
        let receipt = svc.adjust_stock(item.id, delta(dec!(7.5)), f.actor).await.unwrap();

        let current = svc.get_item(item.id).await.unwrap();
        assert_eq!(current.qty_on_hand, dec!(47.5));
        assert_eq!(current.qty_reserved, dec!(15));
        assert_eq!(current.qty_available, current.qty_on_hand - current.qty_reserved);
        assert_eq!(receipt.transaction.balance_after, current.qty_on_hand);
        assert_eq!(receipt.transaction.available_after, current.qty_available);
        assert_eq!(count_transactions(&f.pool, item.id).await, 5);
    }

    #[sqlx::test]
    async fn failure_after_the_item_write_rolls_everything_back(pool: PgPool) {
        let f = fixture(pool).await;
        let svc = &f.service;
        let item = svc
            .create_item(new_item(f.category, "SKU-ROLLBACK", dec!(10), dec!(5)), f.actor)
            .await
            .unwrap();

        // O item já foi atualizado dentro da transação quando o lançamento falha
        let mut payload = delta(dec!(2));
        payload.unit_cost = Some(dec!(99999999999999));
        let err = svc.adjust_stock(item.id, payload, f.actor).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(_)));

        let after = svc.get_item(item.id).await.unwrap();
        assert_eq!(after.qty_on_hand, dec!(10));
        assert_eq!(after.version, item.version);
        assert_eq!(count_transactions(&f.pool, item.id).await, 1);
    }

    #[sqlx::test]
    async fn concurrent_decrements_are_serialized(pool: PgPool) {
        let f = fixture(pool).await;
        let item = f
            .service
            .create_item(new_item(f.category, "SKU-RACE", dec!(10), dec!(0)), f.actor)
            .await
            .unwrap();

        let item_id = item.id;
        let results = join_all((0..10).map(|_| {
            let service = f.service.clone();
            let actor = f.actor;
            async move { service.adjust_stock(item_id, delta(dec!(-1)), actor).await }
        }))
        .await;
        assert!(results.iter().all(|r| r.is_ok()));

        // Cada baixa viu o saldo deixado pela anterior
        let balances: HashSet<Decimal> = results
            .into_iter()
            .map(|r| r.unwrap().transaction.balance_after.normalize())
            .collect();
        assert_eq!(balances.len(), 10);

        let current = f.service.get_item(item.id).await.unwrap();
        assert_eq!(current.qty_on_hand, Decimal::ZERO);
        assert_eq!(current.version, item.version + 10);

        let err = f.service.adjust_stock(item.id, delta(dec!(-1)), f.actor).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)));
        assert_eq!(count_transactions(&f.pool, item.id).await, 11);
    }

    #[sqlx::test]
    async fn repeated_low_stock_keeps_a_single_open_alert(pool: PgPool) {
        let f = fixture(pool).await;
        let svc = &f.service;
        let item = svc
            .create_item(new_item(f.category, "SKU-ALERT", dec!(10), dec!(5)), f.actor)
            .await
            .unwrap();

        svc.adjust_stock(item.id, delta(dec!(-6)), f.actor).await.unwrap();
        svc.adjust_stock(item.id, delta(dec!(-1)), f.actor).await.unwrap();
        svc.update_item(item.id, set_on_hand(dec!(2)), f.actor).await.unwrap();

        let alerts = open_alerts(svc, item.id).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowStock);
        assert_eq!(alerts[0].qty_at_trigger, dec!(4));
    }

    #[sqlx::test]
    async fn initial_reservation_is_recorded_separately(pool: PgPool) {
        let f = fixture(pool).await;
        let mut payload = new_item(f.category, "SKU-RES", dec!(10), dec!(2));
        payload.qty_reserved = dec!(4);
        let item = f.service.create_item(payload, f.actor).await.unwrap();
        assert_eq!(item.qty_available, dec!(6));

        let history = f.service.item_history(item.id, 50).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!((history[0].ledger_type, history[0].sub_type), (LedgerType::Reserve, LedgerSubType::OrderReserve));
        assert_eq!(history[0].quantity, dec!(4));
        assert_eq!(history[0].available_after, dec!(6));
        assert_eq!(history[1].ledger_type, LedgerType::In);
        assert_eq!(history[1].balance_after, dec!(10));
        assert_eq!(history[1].available_after, dec!(10));
    }

    #[sqlx::test]
    async fn duplicate_sku_is_rejected_without_side_effects(pool: PgPool) {
        let f = fixture(pool).await;
        f.service
            .create_item(new_item(f.category, "SKU-DUP", dec!(1), dec!(0)), f.actor)
            .await
            .unwrap();
        let err = f
            .service
            .create_item(new_item(f.category, " sku-dup ", dec!(5), dec!(0)), f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey(_)));

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_transactions")
            .fetch_one(&f.pool)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }
}
