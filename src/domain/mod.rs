// ==========================================
// 版税对账结算系统 - 领域层
// ==========================================
// 职责: 实体与类型定义,不含业务逻辑
// ==========================================

pub mod payout;
pub mod platform;
pub mod revenue;
pub mod types;
pub mod vendor;

// 重导出核心实体
pub use payout::{Payout, PayoutCreated, PayoutSummary};
pub use platform::{MappingTemplate, Platform, PlatformSplit};
pub use revenue::{ManualReportRow, NormalizedRecord, RevenueRecord, RevenueReport};
pub use types::{PayoutStatus, RecordStatus, ReportPaymentStatus};
pub use vendor::Vendor;
