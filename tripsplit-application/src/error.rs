use thiserror::Error;
use tripsplit_domain::{ExpenseId, MemberId, Money, SplitError, TripId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("trip {0} does not exist")]
    TripNotFound(TripId),
    #[error("ledger storage failed: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("expense {expense_id} does not exist in trip {trip_id}")]
    ExpenseNotFound {
        trip_id: TripId,
        expense_id: ExpenseId,
    },
    #[error("custom shares add up to {actual} but the expense is {expected}")]
    CustomSplitMismatch { expected: Money, actual: Money },
    #[error("member {0} appears more than once in the split")]
    DuplicateParticipant(MemberId),
}
