// ==========================================
// 版税对账结算系统 - 引擎层
// ==========================================
// 职责: 佣金与汇总业务规则,纯函数无副作用
// ==========================================

pub mod commission;
pub mod payout_aggregator;

pub use commission::{resolve_commission_rate, split_gross, CommissionSplit};
pub use payout_aggregator::aggregate_unpaid;
