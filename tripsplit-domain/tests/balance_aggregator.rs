use proptest::prelude::*;
use tripsplit_domain::{
    BalanceAggregator, Expense, ExpenseId, ExpenseSplit, MemberId, Money, SettlementPlanner,
    SplitAllocator, SplitIndex, SplitReconciler, TripId,
};

type RawExpense = (i64, usize, u8, bool, bool);

fn member(idx: usize) -> MemberId {
    MemberId::new(format!("m{}", idx + 1))
}

/// Builds a ledger snapshot from generated data. Splits are produced by the
/// allocator and then optionally corrupted (forcing recomputation) or split
/// into duplicate rows (forcing a merge).
fn build_ledger(member_count: usize, raw: &[RawExpense]) -> (Vec<Expense>, Vec<ExpenseSplit>) {
    let mut expenses = Vec::with_capacity(raw.len());
    let mut splits = Vec::new();

    for (idx, &(cents, payer_idx, mask, corrupt, duplicate)) in raw.iter().enumerate() {
        let id = ExpenseId::new(format!("e{}", idx + 1));
        let payer = member(payer_idx % member_count);
        let mut participants: Vec<MemberId> = (0..member_count)
            .filter(|bit| mask & (1 << bit) != 0)
            .map(member)
            .collect();
        if participants.is_empty() {
            participants.push(payer.clone());
        }

        let amount = Money::from_cents(cents);
        let shares = SplitAllocator::allocate(amount, participants).expect("allocation");
        let mut rows: Vec<ExpenseSplit> = shares
            .into_iter()
            .map(|share| share.into_split(&id))
            .collect();

        if corrupt {
            rows[0].amount += Money::from_cents(100);
        } else if duplicate {
            let half = rows[0].amount.divide_truncated(2);
            rows[0].amount -= half;
            let mut extra = rows[0].clone();
            extra.amount = half;
            rows.push(extra);
        }

        expenses.push(Expense {
            id,
            trip_id: TripId::from("trip"),
            amount,
            payer_id: payer,
            description: None,
        });
        splits.extend(rows);
    }

    (expenses, splits)
}

fn raw_expenses(max_cents: i64) -> impl Strategy<Value = Vec<RawExpense>> {
    prop::collection::vec(
        (
            0i64..=max_cents,
            0usize..6,
            1u8..=63,
            any::<bool>(),
            any::<bool>(),
        ),
        0..=20,
    )
}

proptest! {
    #[test]
    fn allocation_sums_exactly(cents in 0i64..=10_000_000, member_count in 1usize..=12) {
        let amount = Money::from_cents(cents);
        let shares = SplitAllocator::allocate(amount, (0..member_count).map(member))
            .expect("allocation");

        prop_assert_eq!(shares.len(), member_count);
        prop_assert_eq!(shares.iter().map(|share| share.amount).sum::<Money>(), amount);
        prop_assert!(shares.iter().all(|share| !share.amount.is_negative()));
        for share in &shares[1..] {
            prop_assert!((share.amount - shares[1].amount).is_zero());
        }
    }
}

proptest! {
    #[test]
    fn balances_sum_to_zero(member_count in 1usize..=6, raw in raw_expenses(100_000)) {
        let (expenses, splits) = build_ledger(member_count, &raw);
        let aggregation = BalanceAggregator::aggregate(&expenses, &SplitIndex::new(&splits))
            .expect("aggregation");

        let total: Money = aggregation.balances.values().sum();
        prop_assert!(total.is_zero());

        let credits: Money = aggregation.balances.values().filter(|b| b.is_positive()).sum();
        let debits: Money = aggregation.balances.values().filter(|b| b.is_negative()).sum();
        prop_assert!(credits.approx_eq(-debits));
        prop_assert_eq!(aggregation.inconsistency, None);
        prop_assert_eq!(aggregation.reconciliations.len(), expenses.len());
    }
}

proptest! {
    #[test]
    fn reconcile_heals_and_is_idempotent(member_count in 1usize..=6, raw in raw_expenses(100_000)) {
        let (expenses, splits) = build_ledger(member_count, &raw);
        let index = SplitIndex::new(&splits);

        for expense in &expenses {
            let first = SplitReconciler::reconcile(expense, index.splits_for(&expense.id))
                .expect("reconcile");
            let second = SplitReconciler::reconcile(expense, index.splits_for(&expense.id))
                .expect("reconcile");

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.total(), expense.amount);
        }
    }
}

proptest! {
    #[test]
    fn settlement_is_within_tolerance(member_count in 1usize..=6, raw in raw_expenses(100_000)) {
        let (expenses, splits) = build_ledger(member_count, &raw);
        let aggregation = BalanceAggregator::aggregate(&expenses, &SplitIndex::new(&splits))
            .expect("aggregation");
        let plan = SettlementPlanner.plan(&aggregation.balances);

        for transfer in &plan.transfers {
            prop_assert!(transfer.from != transfer.to);
            prop_assert!(transfer.amount > Money::TOLERANCE);
        }

        // A consistent ledger never reports unsettled balances. Members left
        // within one cent, by the input or by a partial match, can strand at
        // most one cent each as dust with the last matched party.
        prop_assert!(plan.is_complete());
        let bound = Money::from_cents(member_count as i64);
        let dust: Money = plan.dust.iter().map(|(_, balance)| balance.abs()).sum();
        prop_assert!(dust <= bound);
        for balance in plan.apply_to(&aggregation.balances).values() {
            prop_assert!(balance.abs() <= bound);
        }
    }
}

proptest! {
    #[test]
    fn settlement_clears_every_balance(member_count in 1usize..=6, raw in raw_expenses(500)) {
        // Multiples of 6.00 split evenly between up to six people in steps of
        // ten cents, so no balance ever sits inside the tolerance band.
        let raw: Vec<RawExpense> = raw
            .into_iter()
            .map(|(units, payer, mask, corrupt, duplicate)| {
                (units * 600, payer, mask, corrupt, duplicate)
            })
            .collect();
        let (expenses, splits) = build_ledger(member_count, &raw);
        let aggregation = BalanceAggregator::aggregate(&expenses, &SplitIndex::new(&splits))
            .expect("aggregation");
        let plan = SettlementPlanner.plan(&aggregation.balances);

        prop_assert!(plan.is_complete());
        for balance in plan.apply_to(&aggregation.balances).values() {
            prop_assert!(balance.is_zero());
        }
    }
}
