use std::borrow::Cow;
use tripsplit_application::MemberDirectory;
use tripsplit_domain::{MemberId, Money};

pub const MEMBER: &str = "Member";
pub const SHARE: &str = "Share";
pub const BALANCE: &str = "Balance";
pub const FROM: &str = "From";
pub const TO: &str = "To";
pub const AMOUNT: &str = "Amount";
pub const ITEM: &str = "Item";
pub const MY_SPEND: &str = "My spend";
pub const MY_ADVANCE: &str = "Paid in advance";
pub const TRIP_TOTAL: &str = "Trip total";
pub const NOTHING_TO_SETTLE: &str = "Everyone is settled up.";
pub const UNSETTLED: &str = "Unmatched balances (the ledger does not balance):";

/// Display name from the directory, or the raw id when there is none.
pub fn format_member_label<'a>(
    member_id: &'a MemberId,
    member_directory: &'a dyn MemberDirectory,
) -> Cow<'a, str> {
    match member_directory.display_name(member_id) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Borrowed(member_id.as_str()),
    }
}

/// Balance with an explicit `+` for amounts owed to the member.
pub fn format_balance(balance: Money) -> String {
    if balance.is_positive() {
        format!("+{balance}")
    } else {
        balance.to_string()
    }
}
