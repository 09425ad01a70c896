use crate::{
    error::{AmountKind, SplitError},
    model::{Expense, ExpenseId, ExpenseSplit, MemberId, Money, Share},
    services::SplitAllocator,
};
use fxhash::FxHashMap;
use indexmap::IndexMap;

/// How the authoritative shares of an expense were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Stored splits matched the expense amount.
    Trusted,
    /// Duplicate rows for the same member were summed; the total matched.
    Merged { duplicates: usize },
    /// Stored splits did not match and were recomputed as an equal split.
    Recomputed { stored_total: Money },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub expense_id: ExpenseId,
    pub shares: Vec<Share>,
    pub outcome: ReconcileOutcome,
}

impl Reconciliation {
    pub fn total(&self) -> Money {
        self.shares.iter().map(|share| share.amount).sum()
    }

    pub fn share_of(&self, member: &MemberId) -> Option<Money> {
        self.shares
            .iter()
            .find(|share| &share.member == member)
            .map(|share| share.amount)
    }

    pub fn participants(&self) -> impl Iterator<Item = &MemberId> + '_ {
        self.shares.iter().map(|share| &share.member)
    }

    pub fn was_recomputed(&self) -> bool {
        matches!(self.outcome, ReconcileOutcome::Recomputed { .. })
    }
}

/// Validates stored splits against their expense and heals mismatches.
///
/// Balance and report code must read share amounts only through
/// [`SplitReconciler::reconcile`].
pub struct SplitReconciler;

impl SplitReconciler {
    /// Returns the authoritative shares for `expense`.
    ///
    /// Rows belonging to other expenses are ignored. Rows for the same member
    /// are summed. If the merged total is within one cent of the expense amount
    /// the merged rows are kept, otherwise shares are recomputed with
    /// [`SplitAllocator::allocate`] over the stored participants in
    /// first-appearance order.
    ///
    /// # Errors
    /// * [`SplitError::NegativeAmount`] if the expense or any stored share is negative
    /// * [`SplitError::EmptyParticipants`] if there are no stored participants
    ///   for a non-zero expense
    pub fn reconcile<'s, I>(expense: &Expense, splits: I) -> Result<Reconciliation, SplitError>
    where
        I: IntoIterator<Item = &'s ExpenseSplit>,
    {
        if expense.amount.is_negative() {
            return Err(SplitError::NegativeAmount {
                kind: AmountKind::Expense,
                amount: expense.amount,
            });
        }

        let mut merged: IndexMap<&MemberId, Money> = IndexMap::new();
        let mut duplicates = 0usize;

        for split in splits {
            if split.expense_id != expense.id {
                tracing::debug!(
                    expense_id = %expense.id,
                    foreign_expense_id = %split.expense_id,
                    user_id = %split.user_id,
                    "Ignoring split that belongs to another expense"
                );
                continue;
            }
            if split.amount.is_negative() {
                return Err(SplitError::NegativeAmount {
                    kind: AmountKind::Share,
                    amount: split.amount,
                });
            }
            match merged.get_mut(&split.user_id) {
                Some(amount) => {
                    *amount += split.amount;
                    duplicates += 1;
                }
                None => {
                    merged.insert(&split.user_id, split.amount);
                }
            }
        }

        let stored_total: Money = merged.values().sum();

        if stored_total.approx_eq(expense.amount) {
            if duplicates > 0 {
                tracing::debug!(
                    expense_id = %expense.id,
                    duplicates,
                    "Merged duplicate split rows"
                );
            }
            return Ok(Reconciliation {
                expense_id: expense.id.clone(),
                shares: merged
                    .into_iter()
                    .map(|(member, amount)| Share {
                        member: member.clone(),
                        amount,
                    })
                    .collect(),
                outcome: if duplicates > 0 {
                    ReconcileOutcome::Merged { duplicates }
                } else {
                    ReconcileOutcome::Trusted
                },
            });
        }

        tracing::warn!(
            expense_id = %expense.id,
            expected = %expense.amount,
            stored_total = %stored_total,
            participant_count = merged.len(),
            duplicates,
            "Stored splits do not match expense amount; recomputing equal shares"
        );

        let shares = SplitAllocator::allocate(expense.amount, merged.into_keys().cloned())
            .map_err(|err| err.for_expense(&expense.id))?;

        Ok(Reconciliation {
            expense_id: expense.id.clone(),
            shares,
            outcome: ReconcileOutcome::Recomputed { stored_total },
        })
    }
}

/// Stored splits grouped by expense id.
#[derive(Debug, Default)]
pub struct SplitIndex<'a> {
    by_expense: FxHashMap<&'a ExpenseId, Vec<&'a ExpenseSplit>>,
}

impl<'a> SplitIndex<'a> {
    pub fn new<I>(splits: I) -> Self
    where
        I: IntoIterator<Item = &'a ExpenseSplit>,
    {
        let mut by_expense: FxHashMap<&'a ExpenseId, Vec<&'a ExpenseSplit>> =
            FxHashMap::default();
        for split in splits {
            by_expense.entry(&split.expense_id).or_default().push(split);
        }
        Self { by_expense }
    }

    pub fn splits_for(
        &self,
        expense_id: &ExpenseId,
    ) -> impl Iterator<Item = &'a ExpenseSplit> + '_ {
        self.by_expense
            .get(expense_id)
            .into_iter()
            .flat_map(|splits| splits.iter().copied())
    }

    pub fn expense_count(&self) -> usize {
        self.by_expense.len()
    }
}
