use crate::model::{MemberBalances, MemberId, Money, Transfer};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettlementPlan {
    pub transfers: Vec<Transfer>,
    /// Balances left over once debtors or creditors ran out. Only non-empty
    /// when the input balances did not cancel out.
    pub unsettled: Vec<(MemberId, Money)>,
    /// Leftovers of a balanced ledger whose counterpart sits with members
    /// inside the one-cent band. Each is at most one cent per such member.
    pub dust: Vec<(MemberId, Money)>,
}

impl SettlementPlan {
    pub fn is_complete(&self) -> bool {
        self.unsettled.is_empty()
    }

    /// Returns `balances` after every transfer has been paid.
    pub fn apply_to(&self, balances: &MemberBalances) -> MemberBalances {
        let mut result = balances.clone();
        for transfer in &self.transfers {
            *result.entry(transfer.from.clone()).or_insert(Money::ZERO) += transfer.amount;
            *result.entry(transfer.to.clone()).or_insert(Money::ZERO) -= transfer.amount;
        }
        result
    }
}

/// Greedy debtor/creditor matching.
///
/// Not an optimal minimum-transfer solver: pairing the largest debt with the
/// largest credit first usually keeps the transfer count low, nothing more.
pub struct SettlementPlanner;

impl SettlementPlanner {
    /// Plans transfers that settle every balance outside the one-cent band.
    ///
    /// # Arguments
    /// * `balances` - Net balance table (positive: owed by the group)
    ///
    /// # Returns
    /// Transfers from debtors to creditors, largest balances first. Members
    /// whose balance is within tolerance take part in no transfer, so a
    /// balanced ledger can still leave a few cents with one member; those are
    /// reported as [`SettlementPlan::dust`], never as unsettled.
    pub fn plan(&self, balances: &MemberBalances) -> SettlementPlan {
        let mut debtors: Vec<(&MemberId, Money)> = balances
            .iter()
            .filter(|(_, balance)| **balance < -Money::TOLERANCE)
            .map(|(member, balance)| (member, *balance))
            .collect();
        let mut creditors: Vec<(&MemberId, Money)> = balances
            .iter()
            .filter(|(_, balance)| **balance > Money::TOLERANCE)
            .map(|(member, balance)| (member, *balance))
            .collect();

        // Stable sorts: equal balances keep the input order.
        debtors.sort_by(|(_, a), (_, b)| a.cmp(b));
        creditors.sort_by(|(_, a), (_, b)| b.cmp(a));

        let mut transfers = Vec::new();
        let (mut debtor_idx, mut creditor_idx) = (0, 0);

        while debtor_idx < debtors.len() && creditor_idx < creditors.len() {
            let (debtor, debt) = debtors[debtor_idx];
            let (creditor, credit) = creditors[creditor_idx];

            let amount = debt.abs().min(credit);
            if amount > Money::TOLERANCE {
                transfers.push(Transfer {
                    from: debtor.clone(),
                    to: creditor.clone(),
                    amount,
                });
            }

            debtors[debtor_idx].1 += amount;
            creditors[creditor_idx].1 -= amount;

            if debtors[debtor_idx].1.is_negligible() {
                debtor_idx += 1;
            }
            if creditors[creditor_idx].1.is_negligible() {
                creditor_idx += 1;
            }
        }

        let leftovers: Vec<(MemberId, Money)> = debtors[debtor_idx..]
            .iter()
            .chain(&creditors[creditor_idx..])
            .map(|(member, balance)| ((*member).clone(), *balance))
            .collect();

        let net: Money = balances.values().sum();
        let (unsettled, dust) = if net.is_negligible() {
            (Vec::new(), leftovers)
        } else {
            (leftovers, Vec::new())
        };

        if !unsettled.is_empty() {
            tracing::error!(
                unsettled_count = unsettled.len(),
                net = %net,
                transfer_count = transfers.len(),
                "Settlement left balances unmatched; input balances do not cancel out"
            );
        }
        if !dust.is_empty() {
            tracing::debug!(
                dust_count = dust.len(),
                "Leftovers offset by members within one cent of zero"
            );
        }

        tracing::debug!(
            member_count = balances.len(),
            transfer_count = transfers.len(),
            "Planned settlement"
        );

        SettlementPlan {
            transfers,
            unsettled,
            dust,
        }
    }
}
