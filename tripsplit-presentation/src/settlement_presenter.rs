use crate::{
    balance_presenter::write_diagnostics,
    labels::{self, format_balance, format_member_label},
    text_table::{Align, TextTable},
};
use std::{borrow::Cow, fmt};
use tripsplit_application::{MemberDirectory, PersonBalance, SettlementReport};
use tripsplit_domain::Transfer;

pub struct SettlementPresenter;

pub struct SettlementView {
    pub balance_table: String,
    /// `None` when nobody has to pay anybody.
    pub transfer_table: Option<String>,
    /// Warnings about the ledger itself; empty for a consistent report.
    pub notes: String,
}

impl fmt::Display for SettlementView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.balance_table)?;
        writeln!(f)?;
        match &self.transfer_table {
            Some(table) => f.write_str(table)?,
            None => writeln!(f, "{}", labels::NOTHING_TO_SETTLE)?,
        }
        if !self.notes.is_empty() {
            writeln!(f)?;
            f.write_str(&self.notes)?;
        }
        Ok(())
    }
}

impl SettlementPresenter {
    /// Transfers keep the planner's order, largest balances first.
    pub fn render(
        report: &SettlementReport,
        member_directory: &dyn MemberDirectory,
    ) -> SettlementView {
        let balance_table = Self::build_balance_table(&report.balances, member_directory);
        let transfer_table = (!report.transfers.is_empty())
            .then(|| Self::build_transfer_table(&report.transfers, member_directory));

        let mut notes = String::new();
        if !report.unsettled.is_empty() {
            notes.push_str(labels::UNSETTLED);
            notes.push('\n');
            notes.push_str(&Self::build_balance_table(&report.unsettled, member_directory));
        }
        write_diagnostics(
            &mut notes,
            &report.unallocated,
            report.inconsistency.as_ref(),
        );

        SettlementView {
            balance_table,
            transfer_table,
            notes,
        }
    }

    fn build_balance_table(
        balances: &[PersonBalance],
        member_directory: &dyn MemberDirectory,
    ) -> String {
        TextTable::new()
            .column(labels::MEMBER, Align::Left)
            .column(labels::BALANCE, Align::Right)
            .rows(balances.iter().map(|person| {
                [
                    format_member_label(&person.id, member_directory),
                    Cow::Owned(format_balance(person.balance)),
                ]
            }))
            .render()
    }

    fn build_transfer_table(
        transfers: &[Transfer],
        member_directory: &dyn MemberDirectory,
    ) -> String {
        TextTable::new()
            .column(labels::FROM, Align::Left)
            .column(labels::TO, Align::Left)
            .column(labels::AMOUNT, Align::Right)
            .rows(transfers.iter().map(|transfer| {
                [
                    format_member_label(&transfer.from, member_directory),
                    format_member_label(&transfer.to, member_directory),
                    Cow::Owned(transfer.amount.to_string()),
                ]
            }))
            .render()
    }
}
