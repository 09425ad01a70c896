use crate::{
    error::SplitError,
    model::{Expense, ExpenseId, MemberBalances, MemberId, Money},
    services::{Reconciliation, SplitIndex, SplitReconciler},
};

/// Credits and debits did not cancel out after aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceInconsistency {
    pub credits: Money,
    pub debits: Money,
}

impl BalanceInconsistency {
    pub fn discrepancy(&self) -> Money {
        self.credits - self.debits
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Aggregation {
    /// Net balance per member (positive: owed by the group).
    pub balances: MemberBalances,
    /// Authoritative shares of every debited expense, in input order.
    pub reconciliations: Vec<Reconciliation>,
    /// Expenses that were credited to their payer but had nobody to debit.
    pub unallocated: Vec<ExpenseId>,
    pub inconsistency: Option<BalanceInconsistency>,
}

impl Aggregation {
    pub fn balance_of(&self, member: &MemberId) -> Money {
        self.balances.get(member).copied().unwrap_or(Money::ZERO)
    }

    pub fn is_settled(&self, member: &MemberId) -> bool {
        self.balance_of(member).is_negligible()
    }

    pub fn reconciliation(&self, expense_id: &ExpenseId) -> Option<&Reconciliation> {
        self.reconciliations
            .iter()
            .find(|reconciliation| &reconciliation.expense_id == expense_id)
    }
}

/// Folds expenses and their reconciled splits into net member balances.
pub struct BalanceAggregator;

impl BalanceAggregator {
    /// Credits every payer with the expense amount and debits every
    /// participant with their reconciled share.
    ///
    /// An expense with no participants cannot be debited; it is listed in
    /// [`Aggregation::unallocated`] and the resulting imbalance is reported as
    /// [`Aggregation::inconsistency`] instead of failing the whole trip.
    ///
    /// # Errors
    /// [`SplitError::NegativeAmount`] for any negative expense or share amount.
    pub fn aggregate(
        expenses: &[Expense],
        splits: &SplitIndex<'_>,
    ) -> Result<Aggregation, SplitError> {
        let mut aggregation = Aggregation::default();
        let mut credits = Money::ZERO;
        let mut debits = Money::ZERO;

        for expense in expenses {
            let stored = splits.splits_for(&expense.id);
            let reconciliation = match SplitReconciler::reconcile(expense, stored) {
                Ok(reconciliation) => Some(reconciliation),
                Err(SplitError::EmptyParticipants { .. }) => {
                    tracing::warn!(
                        expense_id = %expense.id,
                        payer_id = %expense.payer_id,
                        amount = %expense.amount,
                        "Expense has no participants; only the payer is credited"
                    );
                    None
                }
                Err(err) => return Err(err),
            };

            *aggregation
                .balances
                .entry(expense.payer_id.clone())
                .or_insert(Money::ZERO) += expense.amount;
            credits += expense.amount;

            let Some(reconciliation) = reconciliation else {
                aggregation.unallocated.push(expense.id.clone());
                continue;
            };

            for share in &reconciliation.shares {
                *aggregation
                    .balances
                    .entry(share.member.clone())
                    .or_insert(Money::ZERO) -= share.amount;
                debits += share.amount;
            }
            aggregation.reconciliations.push(reconciliation);
        }

        if !credits.approx_eq(debits) {
            tracing::error!(
                credits = %credits,
                debits = %debits,
                discrepancy = %(credits - debits),
                unallocated = aggregation.unallocated.len(),
                member_count = aggregation.balances.len(),
                "Aggregated balances do not cancel out"
            );
            aggregation.inconsistency = Some(BalanceInconsistency { credits, debits });
        }

        tracing::debug!(
            expense_count = expenses.len(),
            member_count = aggregation.balances.len(),
            recomputed = aggregation
                .reconciliations
                .iter()
                .filter(|reconciliation| reconciliation.was_recomputed())
                .count(),
            "Aggregated trip balances"
        );

        Ok(aggregation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AmountKind,
        model::{ExpenseSplit, TripId},
    };
    use rstest::rstest;

    fn expense(id: &str, cents: i64, payer: &str) -> Expense {
        Expense {
            id: ExpenseId::from(id),
            trip_id: TripId::from("trip"),
            amount: Money::from_cents(cents),
            payer_id: MemberId::from(payer),
            description: None,
        }
    }

    fn split(expense_id: &str, user: &str, cents: i64) -> ExpenseSplit {
        ExpenseSplit {
            expense_id: ExpenseId::from(expense_id),
            user_id: MemberId::from(user),
            amount: Money::from_cents(cents),
        }
    }

    fn balances(entries: &[(&str, i64)]) -> MemberBalances {
        entries
            .iter()
            .map(|(id, cents)| (MemberId::from(*id), Money::from_cents(*cents)))
            .collect()
    }

    #[rstest]
    #[case::payer_included(
        vec![expense("e1", 30_000, "A")],
        vec![split("e1", "A", 10_000), split("e1", "B", 10_000), split("e1", "C", 10_000)],
        balances(&[("A", 20_000), ("B", -10_000), ("C", -10_000)])
    )]
    #[case::two_expenses(
        vec![expense("e1", 15_000, "A"), expense("e2", 5_000, "B")],
        vec![
            split("e1", "A", 7_500),
            split("e1", "B", 7_500),
            split("e2", "A", 2_500),
            split("e2", "B", 2_500),
        ],
        balances(&[("A", 5_000), ("B", -5_000)])
    )]
    #[case::payer_not_participating(
        vec![expense("e1", 5_000, "A")],
        vec![split("e1", "B", 2_500), split("e1", "C", 2_500)],
        balances(&[("A", 5_000), ("B", -2_500), ("C", -2_500)])
    )]
    #[case::corrupted_splits_are_healed(
        vec![expense("e1", 9_000, "A")],
        vec![split("e1", "A", 1_000), split("e1", "B", 1_000)],
        balances(&[("A", 4_500), ("B", -4_500)])
    )]
    #[case::no_expenses(vec![], vec![], balances(&[]))]
    fn aggregates_balances(
        #[case] expenses: Vec<Expense>,
        #[case] splits: Vec<ExpenseSplit>,
        #[case] expected: MemberBalances,
    ) {
        let index = SplitIndex::new(&splits);
        let aggregation = BalanceAggregator::aggregate(&expenses, &index).unwrap();

        assert_eq!(aggregation.balances, expected);
        assert_eq!(aggregation.inconsistency, None);
        assert!(aggregation.unallocated.is_empty());
    }

    #[test]
    fn balances_follow_first_appearance_order() {
        let expenses = vec![expense("e1", 300, "C"), expense("e2", 300, "A")];
        let splits = vec![
            split("e1", "B", 150),
            split("e1", "C", 150),
            split("e2", "A", 300),
        ];
        let aggregation =
            BalanceAggregator::aggregate(&expenses, &SplitIndex::new(&splits)).unwrap();

        let order: Vec<&str> = aggregation.balances.keys().map(MemberId::as_str).collect();
        assert_eq!(order, ["C", "B", "A"]);
    }

    #[test]
    fn expense_without_participants_is_reported() {
        let expenses = vec![expense("e1", 1_000, "A"), expense("e2", 2_000, "B")];
        let splits = vec![split("e2", "A", 1_000), split("e2", "B", 1_000)];
        let aggregation =
            BalanceAggregator::aggregate(&expenses, &SplitIndex::new(&splits)).unwrap();

        assert_eq!(aggregation.unallocated, vec![ExpenseId::from("e1")]);
        assert_eq!(
            aggregation.inconsistency,
            Some(BalanceInconsistency {
                credits: Money::from_cents(3_000),
                debits: Money::from_cents(2_000),
            })
        );
        assert_eq!(aggregation.balance_of(&MemberId::from("A")), Money::ZERO);
        assert_eq!(aggregation.balance_of(&MemberId::from("B")), Money::from_cents(1_000));
    }

    #[test]
    fn negative_expense_is_rejected() {
        let expenses = vec![expense("e1", -100, "A")];
        let splits = vec![split("e1", "A", -100)];

        assert_eq!(
            BalanceAggregator::aggregate(&expenses, &SplitIndex::new(&splits)),
            Err(SplitError::NegativeAmount {
                kind: AmountKind::Expense,
                amount: Money::from_cents(-100),
            })
        );
    }

    #[test]
    fn settled_members_are_within_one_cent() {
        let expenses = vec![expense("e1", 100, "A")];
        let splits = vec![split("e1", "A", 99), split("e1", "B", 1)];
        let aggregation =
            BalanceAggregator::aggregate(&expenses, &SplitIndex::new(&splits)).unwrap();

        assert!(aggregation.is_settled(&MemberId::from("A")));
        assert!(aggregation.is_settled(&MemberId::from("B")));
        assert!(aggregation.is_settled(&MemberId::from("nobody")));
    }
}
