use crate::{
    labels::{self, format_balance, format_member_label},
    text_table::{Align, TextTable},
};
use std::{borrow::Cow, fmt::Write as _};
use tripsplit_application::MemberDirectory;
use tripsplit_domain::{Aggregation, BalanceInconsistency, ExpenseId};

pub struct BalancePresenter;

impl BalancePresenter {
    pub fn render(aggregation: &Aggregation, member_directory: &dyn MemberDirectory) -> String {
        let mut reply = TextTable::new()
            .column(labels::MEMBER, Align::Left)
            .column(labels::BALANCE, Align::Right)
            .rows(aggregation.balances.iter().map(|(member, balance)| {
                [
                    format_member_label(member, member_directory),
                    Cow::Owned(format_balance(*balance)),
                ]
            }))
            .render();

        write_diagnostics(
            &mut reply,
            &aggregation.unallocated,
            aggregation.inconsistency.as_ref(),
        );
        reply
    }
}

/// Appends warnings about expenses nobody shares and about credits and debits
/// that do not cancel out.
pub(crate) fn write_diagnostics(
    reply: &mut String,
    unallocated: &[ExpenseId],
    inconsistency: Option<&BalanceInconsistency>,
) {
    if !unallocated.is_empty() {
        let ids: Vec<&str> = unallocated.iter().map(ExpenseId::as_str).collect();
        let _ = writeln!(reply, "Expenses without participants: {}", ids.join(", "));
    }
    if let Some(inconsistency) = inconsistency {
        let _ = writeln!(
            reply,
            "Credits {} and debits {} differ by {}.",
            inconsistency.credits,
            inconsistency.debits,
            inconsistency.discrepancy()
        );
    }
}
