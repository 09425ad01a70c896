#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod expense_processor;
pub mod model;
pub mod ports;

pub use error::{AppError, LedgerError};
pub use expense_processor::ExpenseProcessor;
pub use model::{
    Dashboard, ExpenseDraft, ExpenseShares, LedgerSnapshot, PersonBalance, SettlementReport,
    SplitDraft,
};
pub use ports::{ExpenseLedger, MemberDirectory};
