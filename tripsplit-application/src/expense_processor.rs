use crate::{
    error::AppError,
    model::{
        Dashboard, ExpenseDraft, ExpenseShares, LedgerSnapshot, PersonBalance, SettlementReport,
        SplitDraft,
    },
    ports::ExpenseLedger,
};
use fxhash::FxHashSet;
use tripsplit_domain::{
    AmountKind, Aggregation, BalanceAggregator, Expense, ExpenseId, ExpenseSplit, MemberId, Money,
    SettlementPlanner, SplitAllocator, SplitError, SplitReconciler, TripId,
};

/// Entry point for every caller that writes expenses or reads shares,
/// balances and settlements. All of them go through the same reconciler,
/// aggregator and planner.
#[derive(Clone, Copy)]
pub struct ExpenseProcessor<'a> {
    ledger: &'a dyn ExpenseLedger,
}

impl<'a> ExpenseProcessor<'a> {
    pub fn new(ledger: &'a dyn ExpenseLedger) -> Self {
        Self { ledger }
    }

    pub fn create_expense(
        &self,
        trip_id: &TripId,
        draft: ExpenseDraft,
    ) -> Result<Expense, AppError> {
        let expense_id = self.ledger.next_expense_id(trip_id)?;
        self.write_expense(trip_id, expense_id, draft)
    }

    /// Replaces amount, payer and splits of an existing expense. The old splits
    /// are discarded.
    pub fn edit_expense(
        &self,
        trip_id: &TripId,
        expense_id: &ExpenseId,
        draft: ExpenseDraft,
    ) -> Result<Expense, AppError> {
        let snapshot = self.ledger.snapshot(trip_id)?;
        if snapshot.expense(expense_id).is_none() {
            return Err(Self::not_found(trip_id, expense_id));
        }
        self.write_expense(trip_id, expense_id.clone(), draft)
    }

    pub fn delete_expense(&self, trip_id: &TripId, expense_id: &ExpenseId) -> Result<(), AppError> {
        if !self.ledger.remove_expense(trip_id, expense_id)? {
            return Err(Self::not_found(trip_id, expense_id));
        }
        tracing::info!(trip_id = %trip_id, expense_id = %expense_id, "Deleted expense");
        Ok(())
    }

    pub fn expense_shares(
        &self,
        trip_id: &TripId,
        expense_id: &ExpenseId,
    ) -> Result<ExpenseShares, AppError> {
        let snapshot = self.ledger.snapshot(trip_id)?;
        let expense = snapshot
            .expense(expense_id)
            .ok_or_else(|| Self::not_found(trip_id, expense_id))?;
        let index = snapshot.split_index();
        let reconciliation = SplitReconciler::reconcile(expense, index.splits_for(expense_id))?;

        Ok(ExpenseShares {
            expense: expense.clone(),
            reconciliation,
        })
    }

    pub fn balances(&self, trip_id: &TripId) -> Result<Aggregation, AppError> {
        let snapshot = self.ledger.snapshot(trip_id)?;
        Self::aggregate(&snapshot)
    }

    pub fn dashboard(&self, trip_id: &TripId, member: &MemberId) -> Result<Dashboard, AppError> {
        let snapshot = self.ledger.snapshot(trip_id)?;
        let aggregation = Self::aggregate(&snapshot)?;

        let trip_total: Money = snapshot.expenses.iter().map(|expense| expense.amount).sum();
        let my_advance: Money = snapshot
            .expenses
            .iter()
            .filter(|expense| &expense.payer_id == member)
            .map(|expense| expense.amount)
            .sum();
        let my_spend: Money = aggregation
            .reconciliations
            .iter()
            .filter_map(|reconciliation| reconciliation.share_of(member))
            .sum();

        Ok(Dashboard {
            member: member.clone(),
            my_spend,
            my_advance,
            my_balance: aggregation.balance_of(member),
            trip_total,
        })
    }

    pub fn settle_up(&self, trip_id: &TripId) -> Result<SettlementReport, AppError> {
        let snapshot = self.ledger.snapshot(trip_id)?;
        let aggregation = Self::aggregate(&snapshot)?;
        let plan = SettlementPlanner.plan(&aggregation.balances);

        let mut balances: Vec<PersonBalance> = aggregation
            .balances
            .iter()
            .map(|(id, balance)| PersonBalance {
                id: id.clone(),
                balance: *balance,
            })
            .collect();
        balances.sort_by(|a, b| a.id.cmp(&b.id));

        let unsettled = plan
            .unsettled
            .into_iter()
            .map(|(id, balance)| PersonBalance { id, balance })
            .collect();

        Ok(SettlementReport {
            balances,
            transfers: plan.transfers,
            unsettled,
            unallocated: aggregation.unallocated,
            inconsistency: aggregation.inconsistency,
        })
    }

    fn aggregate(snapshot: &LedgerSnapshot) -> Result<Aggregation, AppError> {
        let index = snapshot.split_index();
        Ok(BalanceAggregator::aggregate(&snapshot.expenses, &index)?)
    }

    fn write_expense(
        &self,
        trip_id: &TripId,
        expense_id: ExpenseId,
        draft: ExpenseDraft,
    ) -> Result<Expense, AppError> {
        let splits = Self::build_splits(&expense_id, &draft)?;
        let expense = Expense {
            id: expense_id,
            trip_id: trip_id.clone(),
            amount: draft.amount,
            payer_id: draft.payer_id,
            description: draft.description,
        };

        tracing::info!(
            trip_id = %trip_id,
            expense_id = %expense.id,
            amount = %expense.amount,
            payer_id = %expense.payer_id,
            participant_count = splits.len(),
            "Saving expense"
        );
        self.ledger.put_expense(expense.clone(), splits)?;
        Ok(expense)
    }

    fn build_splits(
        expense_id: &ExpenseId,
        draft: &ExpenseDraft,
    ) -> Result<Vec<ExpenseSplit>, AppError> {
        match &draft.split {
            SplitDraft::Equal(participants) => {
                let shares = SplitAllocator::allocate(draft.amount, participants.iter().cloned())
                    .map_err(|err| err.for_expense(expense_id))?;
                Ok(shares
                    .into_iter()
                    .map(|share| share.into_split(expense_id))
                    .collect())
            }
            SplitDraft::Custom(shares) => {
                if draft.amount.is_negative() {
                    return Err(SplitError::NegativeAmount {
                        kind: AmountKind::Expense,
                        amount: draft.amount,
                    }
                    .into());
                }
                if shares.is_empty() {
                    return Err(SplitError::EmptyParticipants {
                        expense_id: Some(expense_id.clone()),
                    }
                    .into());
                }

                let mut seen = FxHashSet::default();
                for share in shares {
                    if share.amount.is_negative() {
                        return Err(SplitError::NegativeAmount {
                            kind: AmountKind::Share,
                            amount: share.amount,
                        }
                        .into());
                    }
                    if !seen.insert(&share.member) {
                        return Err(AppError::DuplicateParticipant(share.member.clone()));
                    }
                }

                let actual: Money = shares.iter().map(|share| share.amount).sum();
                if !actual.approx_eq(draft.amount) {
                    return Err(AppError::CustomSplitMismatch {
                        expected: draft.amount,
                        actual,
                    });
                }

                Ok(shares
                    .iter()
                    .cloned()
                    .map(|share| share.into_split(expense_id))
                    .collect())
            }
        }
    }

    fn not_found(trip_id: &TripId, expense_id: &ExpenseId) -> AppError {
        AppError::ExpenseNotFound {
            trip_id: trip_id.clone(),
            expense_id: expense_id.clone(),
        }
    }
}
