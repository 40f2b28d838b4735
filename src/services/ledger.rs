// src/services/ledger.rs

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::{
        inventory::{fits_numeric, StockLevels, NUMERIC_SCALE},
        transaction::{LedgerSubType, LedgerType},
    },
};

/// Tipo/subtipo informado pelo cliente num ajuste avulso.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub ledger_type: LedgerType,
    pub sub_type: Option<LedgerSubType>,
}

// Toda mudança de quantidade entra no sistema por uma destas variantes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockMutation {
    Create { on_hand: Decimal },
    QuantitySet { target: Decimal },
    QuantityDelta { delta: Decimal, movement: Option<Movement> },
    Reserve { quantity: Decimal, sub_type: Option<LedgerSubType> },
    Release { quantity: Decimal, sub_type: Option<LedgerSubType> },
    Delete,
}

/// Resultado do planejamento: novo saldo + o lançamento que o justifica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPlan {
    pub after: StockLevels,
    pub ledger_type: LedgerType,
    pub sub_type: LedgerSubType,
    /// Sempre em módulo (>= 0)
    pub quantity: Decimal,
    pub inbound: bool,
}

/// Calcula o novo saldo a partir do saldo lido sob lock.
/// `Ok(None)` significa que nada mudou e nenhuma movimentação deve ser gravada.
pub fn plan(before: StockLevels, mutation: StockMutation) -> Result<Option<LedgerPlan>, AppError> {
    let plan = match mutation {
        StockMutation::Create { on_hand } => {
            ensure_not_negative(on_hand, "qtyOnHand")?;
            ensure_storable(on_hand, "qtyOnHand")?;
            let after = checked(StockLevels::new(on_hand, Decimal::ZERO))?;
            LedgerPlan {
                after,
                ledger_type: LedgerType::In,
                sub_type: LedgerSubType::Production,
                quantity: on_hand,
                inbound: true,
            }
        }

        StockMutation::QuantitySet { target } => {
            ensure_not_negative(target, "qtyOnHand")?;
            ensure_storable(target, "qtyOnHand")?;
            let diff = target - before.on_hand;
            if diff.is_zero() {
                return Ok(None);
            }
            let after = checked(StockLevels::new(target, before.reserved))?;
            let (ledger_type, inbound) = if diff > Decimal::ZERO {
                (LedgerType::In, true)
            } else {
                (LedgerType::Out, false)
            };
            LedgerPlan {
                after,
                ledger_type,
                sub_type: ledger_type.default_sub_type(),
                quantity: diff.abs(),
                inbound,
            }
        }

        StockMutation::QuantityDelta { delta, movement } => {
            ensure_storable(delta, "delta")?;
            if delta.is_zero() {
                return Err(AppError::ValidationFailed(
                    "delta deve ser diferente de zero".into(),
                ));
            }
            let inbound = delta > Decimal::ZERO;
            let ledger_type = match movement.map(|m| m.ledger_type) {
                None if inbound => LedgerType::In,
                None => LedgerType::Out,
                Some(LedgerType::In) if inbound => LedgerType::In,
                Some(LedgerType::Out) if !inbound => LedgerType::Out,
                Some(LedgerType::Adjust) => LedgerType::Adjust,
                Some(other) => {
                    return Err(AppError::ValidationFailed(format!(
                        "tipo {:?} não combina com delta {}",
                        other, delta
                    )));
                }
            };
            let sub_type = resolve_sub_type(ledger_type, movement.and_then(|m| m.sub_type))?;
            let after = checked(StockLevels::new(before.on_hand + delta, before.reserved))?;
            LedgerPlan {
                after,
                ledger_type,
                sub_type,
                quantity: delta.abs(),
                inbound,
            }
        }

        StockMutation::Reserve { quantity, sub_type } => {
            ensure_positive(quantity, "quantidade a reservar")?;
            ensure_storable(quantity, "quantidade a reservar")?;
            let sub_type = resolve_sub_type(LedgerType::Reserve, sub_type)?;
            let after = checked(StockLevels::new(before.on_hand, before.reserved + quantity))?;
            LedgerPlan {
                after,
                ledger_type: LedgerType::Reserve,
                sub_type,
                quantity,
                inbound: false,
            }
        }

        StockMutation::Release { quantity, sub_type } => {
            ensure_positive(quantity, "quantidade a liberar")?;
            ensure_storable(quantity, "quantidade a liberar")?;
            let sub_type = resolve_sub_type(LedgerType::Unreserve, sub_type)?;
            let after = checked(StockLevels::new(before.on_hand, before.reserved - quantity))?;
            LedgerPlan {
                after,
                ledger_type: LedgerType::Unreserve,
                sub_type,
                quantity,
                inbound: false,
            }
        }

        StockMutation::Delete => LedgerPlan {
            after: StockLevels::ZERO,
            ledger_type: LedgerType::Out,
            sub_type: LedgerSubType::Consumption,
            quantity: before.on_hand,
            inbound: false,
        },
    };

    Ok(Some(plan))
}

/// Criação de item: IN/PRODUCTION com o saldo inicial e, havendo reserva
/// inicial, um RESERVE/ORDER_RESERVE em seguida. Cada plano parte do anterior.
pub fn plan_creation(on_hand: Decimal, reserved: Decimal) -> Result<Vec<LedgerPlan>, AppError> {
    ensure_not_negative(reserved, "qtyReserved")?;

    let mut plans = Vec::with_capacity(2);
    let stocked = plan_required(StockLevels::ZERO, StockMutation::Create { on_hand })?;
    plans.push(stocked);

    if reserved > Decimal::ZERO {
        plans.push(plan_required(
            stocked.after,
            StockMutation::Reserve {
                quantity: reserved,
                sub_type: None,
            },
        )?);
    }
    Ok(plans)
}

/// Mutações que sempre produzem um plano (tudo menos QuantitySet).
pub fn plan_required(before: StockLevels, mutation: StockMutation) -> Result<LedgerPlan, AppError> {
    plan(before, mutation)?.ok_or_else(|| {
        AppError::InternalServerError(anyhow::anyhow!(
            "mutação {:?} não gerou lançamento",
            mutation
        ))
    })
}

fn resolve_sub_type(
    ledger_type: LedgerType,
    requested: Option<LedgerSubType>,
) -> Result<LedgerSubType, AppError> {
    match requested {
        None => Ok(ledger_type.default_sub_type()),
        Some(sub_type) if ledger_type.allows(sub_type) => Ok(sub_type),
        Some(sub_type) => Err(AppError::InvalidSubType {
            ledger_type,
            sub_type,
        }),
    }
}

// Invariantes do saldo depois da mutação
fn checked(after: StockLevels) -> Result<StockLevels, AppError> {
    if after.on_hand < Decimal::ZERO {
        return Err(AppError::InvalidQuantity(format!(
            "saldo físico ficaria negativo ({})",
            after.on_hand
        )));
    }
    if after.reserved < Decimal::ZERO {
        return Err(AppError::InvalidQuantity(format!(
            "reserva ficaria negativa ({})",
            after.reserved
        )));
    }
    if !fits_numeric(after.on_hand) {
        return Err(AppError::InvalidQuantity(format!(
            "saldo físico ficaria fora do limite armazenável ({})",
            after.on_hand
        )));
    }
    if after.reserved > after.on_hand {
        return Err(AppError::InvalidQuantity(format!(
            "reserva ({}) maior que o saldo físico ({})",
            after.reserved, after.on_hand
        )));
    }
    Ok(after)
}

fn ensure_not_negative(value: Decimal, field: &str) -> Result<(), AppError> {
    if value < Decimal::ZERO {
        return Err(AppError::InvalidQuantity(format!(
            "{} não pode ser negativo ({})",
            field, value
        )));
    }
    Ok(())
}

// NUMERIC(18, 4): nada de arredondamento silencioso nem estouro no banco
fn ensure_storable(value: Decimal, field: &str) -> Result<(), AppError> {
    if !fits_numeric(value) {
        return Err(AppError::InvalidQuantity(format!(
            "{} fora do limite armazenável ou com mais de {} casas decimais ({})",
            field, NUMERIC_SCALE, value
        )));
    }
    Ok(())
}

fn ensure_positive(value: Decimal, field: &str) -> Result<(), AppError> {
    if value <= Decimal::ZERO {
        return Err(AppError::InvalidQuantity(format!(
            "{} deve ser maior que zero ({})",
            field, value
        )));
    }
    Ok(())
}
