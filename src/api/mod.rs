// ==========================================
// 版税对账结算系统 - API 层
// ==========================================
// 职责: 面向调用方的业务接口与错误翻译
// 说明: HTTP/会话/权限由外层系统承担,此处只暴露业务操作
// ==========================================

pub mod error;
pub mod payout_api;
pub mod revenue_api;

pub use error::{ApiError, ApiResult};
pub use payout_api::PayoutApi;
pub use revenue_api::RevenueApi;
