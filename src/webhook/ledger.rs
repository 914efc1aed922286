use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::RoundingStrategy;

use super::{PaymentEvent, WebhookError};
use crate::db::queries;
use crate::models::{Account, Transaction};

/// Outcome of a successfully applied event.
#[derive(Debug)]
pub struct AppliedEvent {
    pub account: Account,
    pub transaction: Transaction,
}

/// Resolve the event's entities and credit the account, all inside one
/// immediate transaction.
///
/// The write lock is taken up front so concurrent deliveries of the same
/// event serialize. The duplicate pre-check gives the common replay a clean
/// answer; the INSERT OR IGNORE on the transaction id is the final arbiter
/// for races the pre-check cannot see.
pub fn apply_event(
    conn: &mut Connection,
    event: &PaymentEvent,
) -> Result<AppliedEvent, WebhookError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if queries::transaction_exists(&tx, &event.transaction_id)? {
        return Err(WebhookError::DuplicateTransaction(event.transaction_id));
    }

    let user = queries::get_user_by_id(&tx, event.user_id)?;
    let account = queries::get_account(&tx, event.account_id)?;
    if user.is_none()
        || account
            .as_ref()
            .is_some_and(|acc| acc.user_id != event.user_id)
    {
        return Err(WebhookError::UnknownUser(event.user_id));
    }

    // First event for an account creates it on the fly.
    let account = match account {
        Some(account) => account,
        None => queries::create_account(&tx, event.account_id, event.user_id)?,
    };

    let amount = event
        .amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let transaction = Transaction {
        id: event.transaction_id,
        amount,
        account_id: account.id,
        user_id: event.user_id,
        created_at: queries::now(),
    };
    if !queries::try_insert_transaction(&tx, &transaction)? {
        return Err(WebhookError::DuplicateTransaction(event.transaction_id));
    }

    let balance = account.balance + amount;
    queries::set_account_balance(&tx, account.id, balance)?;

    tx.commit()?;

    Ok(AppliedEvent {
        account: Account { balance, ..account },
        transaction,
    })
}
