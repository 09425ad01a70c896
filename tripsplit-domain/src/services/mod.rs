pub mod balance_aggregator;
pub mod settlement_planner;
pub mod split_allocator;
pub mod split_reconciler;

pub use balance_aggregator::{Aggregation, BalanceAggregator, BalanceInconsistency};
pub use settlement_planner::{SettlementPlan, SettlementPlanner};
pub use split_allocator::SplitAllocator;
pub use split_reconciler::{ReconcileOutcome, Reconciliation, SplitIndex, SplitReconciler};
