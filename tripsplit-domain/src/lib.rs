#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod model;
pub mod services;

pub use error::{AmountKind, SplitError};
pub use model::{
    Expense, ExpenseId, ExpenseSplit, MemberBalances, MemberId, Money, MoneyParseError, Share,
    Transfer, TripId,
};
pub use services::{
    Aggregation, BalanceAggregator, BalanceInconsistency, ReconcileOutcome, Reconciliation,
    SettlementPlan, SettlementPlanner, SplitAllocator, SplitIndex, SplitReconciler,
};
