use crate::{
    labels::{self, format_member_label},
    text_table::{Align, TextTable},
};
use std::{borrow::Cow, fmt::Write as _};
use tripsplit_application::{ExpenseShares, MemberDirectory};
use tripsplit_domain::ReconcileOutcome;

/// "Who owes what" for a single expense.
pub struct SharesPresenter;

impl SharesPresenter {
    pub fn render(view: &ExpenseShares, member_directory: &dyn MemberDirectory) -> String {
        let expense = &view.expense;
        let mut reply = String::with_capacity(256);

        let _ = write!(&mut reply, "{}", expense.id);
        if let Some(description) = &expense.description {
            let _ = write!(&mut reply, " {description}");
        }
        let _ = writeln!(
            &mut reply,
            ": {} paid by {}",
            expense.amount,
            format_member_label(&expense.payer_id, member_directory)
        );

        let table = TextTable::new()
            .column(labels::MEMBER, Align::Left)
            .column(labels::SHARE, Align::Right)
            .rows(view.reconciliation.shares.iter().map(|share| {
                [
                    format_member_label(&share.member, member_directory),
                    Cow::Owned(share.amount.to_string()),
                ]
            }))
            .render();
        reply.push_str(&table);

        match view.reconciliation.outcome {
            ReconcileOutcome::Trusted => {}
            ReconcileOutcome::Merged { duplicates } => {
                let _ = writeln!(
                    &mut reply,
                    "Merged {duplicates} duplicate split row(s)."
                );
            }
            ReconcileOutcome::Recomputed { stored_total } => {
                let _ = writeln!(
                    &mut reply,
                    "Stored splits totalled {stored_total}; shares were recomputed equally."
                );
            }
        }

        reply
    }
}
