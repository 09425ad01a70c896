use tripsplit_domain::{
    BalanceInconsistency, Expense, ExpenseId, ExpenseSplit, MemberId, Money, Reconciliation,
    Share, SplitIndex, Transfer, TripId,
};

/// Everything the ledger holds for one trip, read at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub trip_id: TripId,
    pub expenses: Vec<Expense>,
    pub splits: Vec<ExpenseSplit>,
}

impl LedgerSnapshot {
    pub fn new(trip_id: TripId) -> Self {
        Self {
            trip_id,
            expenses: Vec::new(),
            splits: Vec::new(),
        }
    }

    pub fn split_index(&self) -> SplitIndex<'_> {
        SplitIndex::new(&self.splits)
    }

    pub fn expense(&self, expense_id: &ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|expense| &expense.id == expense_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitDraft {
    /// Equal split between these members, remainder to the first.
    Equal(Vec<MemberId>),
    /// Shares entered by hand; they must add up to the amount.
    Custom(Vec<Share>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub amount: Money,
    pub payer_id: MemberId,
    pub description: Option<String>,
    pub split: SplitDraft,
}

impl ExpenseDraft {
    pub fn equal<I, M>(amount: Money, payer_id: impl Into<MemberId>, participants: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MemberId>,
    {
        Self {
            amount,
            payer_id: payer_id.into(),
            description: None,
            split: SplitDraft::Equal(participants.into_iter().map(Into::into).collect()),
        }
    }

    pub fn custom(amount: Money, payer_id: impl Into<MemberId>, shares: Vec<Share>) -> Self {
        Self {
            amount,
            payer_id: payer_id.into(),
            description: None,
            split: SplitDraft::Custom(shares),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Authoritative shares of one expense, as any "who owes what" view shows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseShares {
    pub expense: Expense,
    pub reconciliation: Reconciliation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonBalance {
    pub id: MemberId,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub member: MemberId,
    /// Sum of this member's shares.
    pub my_spend: Money,
    /// Sum of the expenses this member paid.
    pub my_advance: Money,
    pub my_balance: Money,
    pub trip_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReport {
    pub balances: Vec<PersonBalance>,
    pub transfers: Vec<Transfer>,
    pub unsettled: Vec<PersonBalance>,
    pub unallocated: Vec<ExpenseId>,
    pub inconsistency: Option<BalanceInconsistency>,
}

impl SettlementReport {
    pub fn is_consistent(&self) -> bool {
        self.inconsistency.is_none() && self.unsettled.is_empty()
    }
}
