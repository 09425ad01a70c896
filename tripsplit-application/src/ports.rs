use crate::{error::LedgerError, model::LedgerSnapshot};
use std::collections::HashMap;
use tripsplit_domain::{Expense, ExpenseId, ExpenseSplit, MemberId, TripId};

/// Storage collaborator holding expenses and their splits.
pub trait ExpenseLedger: Send + Sync {
    fn snapshot(&self, trip_id: &TripId) -> Result<LedgerSnapshot, LedgerError>;

    fn next_expense_id(&self, trip_id: &TripId) -> Result<ExpenseId, LedgerError>;

    /// Inserts the expense, or replaces it and all of its splits.
    fn put_expense(&self, expense: Expense, splits: Vec<ExpenseSplit>) -> Result<(), LedgerError>;

    /// Removes the expense and its splits. Returns `false` if it did not exist.
    fn remove_expense(&self, trip_id: &TripId, expense_id: &ExpenseId)
    -> Result<bool, LedgerError>;
}

pub trait MemberDirectory: Send + Sync {
    fn display_name(&self, member_id: &MemberId) -> Option<&str>;
}

impl MemberDirectory for HashMap<MemberId, String> {
    fn display_name(&self, member_id: &MemberId) -> Option<&str> {
        self.get(member_id).map(String::as_str)
    }
}
