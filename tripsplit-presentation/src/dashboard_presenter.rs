use crate::{
    labels::{self, format_balance, format_member_label},
    text_table::{Align, TextTable},
};
use std::{borrow::Cow, fmt::Write as _};
use tripsplit_application::{Dashboard, MemberDirectory};

pub struct DashboardPresenter;

impl DashboardPresenter {
    pub fn render(dashboard: &Dashboard, member_directory: &dyn MemberDirectory) -> String {
        let mut reply = String::with_capacity(256);
        let _ = writeln!(
            &mut reply,
            "{}",
            format_member_label(&dashboard.member, member_directory)
        );

        let table = TextTable::new()
            .column(labels::ITEM, Align::Left)
            .column(labels::AMOUNT, Align::Right)
            .row([
                Cow::Borrowed(labels::MY_SPEND),
                Cow::Owned(dashboard.my_spend.to_string()),
            ])
            .row([
                Cow::Borrowed(labels::MY_ADVANCE),
                Cow::Owned(dashboard.my_advance.to_string()),
            ])
            .row([
                Cow::Borrowed(labels::BALANCE),
                Cow::Owned(format_balance(dashboard.my_balance)),
            ])
            .row([
                Cow::Borrowed(labels::TRIP_TOTAL),
                Cow::Owned(dashboard.trip_total.to_string()),
            ])
            .render();
        reply.push_str(&table);
        reply
    }
}
