// ==========================================
// 版税对账结算系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod payout_repo;
pub mod platform_repo;
pub mod revenue_repo;
pub mod vendor_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use payout_repo::{PayoutRepository, RecordAmounts};
pub use platform_repo::PlatformRepository;
pub use revenue_repo::RevenueRepository;
pub use vendor_repo::VendorRepository;
