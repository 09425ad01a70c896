#![warn(clippy::uninlined_format_args)]

pub mod balance_presenter;
pub mod dashboard_presenter;
pub mod labels;
pub mod settlement_presenter;
pub mod shares_presenter;
pub mod text_table;

pub use balance_presenter::BalancePresenter;
pub use dashboard_presenter::DashboardPresenter;
pub use settlement_presenter::{SettlementPresenter, SettlementView};
pub use shares_presenter::SharesPresenter;
