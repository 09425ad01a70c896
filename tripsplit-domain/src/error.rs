use crate::model::{ExpenseId, Money};
use std::fmt;
use thiserror::Error;

/// Which input carried a rejected amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountKind {
    Expense,
    Share,
}

impl fmt::Display for AmountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountKind::Expense => f.write_str("expense"),
            AmountKind::Share => f.write_str("share"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error(
        "cannot split expense {} between zero participants",
        .expense_id.as_ref().map_or("<unsaved>", ExpenseId::as_str)
    )]
    EmptyParticipants { expense_id: Option<ExpenseId> },
    #[error("{kind} amount must not be negative (found {amount})")]
    NegativeAmount { kind: AmountKind, amount: Money },
}

impl SplitError {
    /// Attaches the expense id to an `EmptyParticipants` error raised before it was known.
    pub fn for_expense(self, id: &ExpenseId) -> Self {
        match self {
            SplitError::EmptyParticipants { expense_id: None } => SplitError::EmptyParticipants {
                expense_id: Some(id.clone()),
            },
            other => other,
        }
    }
}
