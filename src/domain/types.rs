// ==========================================
// 版税对账结算系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 营收记录状态 (Record Status)
// ==========================================
// 状态机: UNPROCESSED → {MATCHED | UNMATCHED} → PENDING_PAYMENT → PAID
// 红线: payout_id 非空 当且仅当 状态 ∈ {PENDING_PAYMENT, PAID}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Unprocessed,    // 刚入库,尚未匹配供应商
    Matched,        // 已匹配到供应商
    Unmatched,      // 匹配失败,待人工处理
    PendingPayment, // 已被某次出账认领
    Paid,           // 出账已结清
}

impl RecordStatus {
    /// 数据库存储格式（全大写下划线）
    pub fn to_db_str(self) -> &'static str {
        match self {
            RecordStatus::Unprocessed => "UNPROCESSED",
            RecordStatus::Matched => "MATCHED",
            RecordStatus::Unmatched => "UNMATCHED",
            RecordStatus::PendingPayment => "PENDING_PAYMENT",
            RecordStatus::Paid => "PAID",
        }
    }

    /// 从数据库存储格式解析（未知值回退为 UNPROCESSED）
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "MATCHED" => RecordStatus::Matched,
            "UNMATCHED" => RecordStatus::Unmatched,
            "PENDING_PAYMENT" => RecordStatus::PendingPayment,
            "PAID" => RecordStatus::Paid,
            _ => RecordStatus::Unprocessed,
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 出账状态 (Payout Status)
// ==========================================
// 状态机: PENDING → PAID (终态,重复结清被拒绝而非幂等覆盖)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Pending, // 已生成,待付款
    Paid,    // 已付款结清
}

impl PayoutStatus {
    pub fn to_db_str(self) -> &'static str {
        match self {
            PayoutStatus::Pending => "PENDING",
            PayoutStatus::Paid => "PAID",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "PAID" => PayoutStatus::Paid,
            _ => PayoutStatus::Pending,
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 报表收款状态 (Report Payment Status)
// ==========================================
// 记录平台侧的发票/到账情况,与出账状态相互独立
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportPaymentStatus {
    Pending, // 平台款项未到账
    Paid,    // 平台款项已到账
}

impl ReportPaymentStatus {
    pub fn to_db_str(self) -> &'static str {
        match self {
            ReportPaymentStatus::Pending => "PENDING",
            ReportPaymentStatus::Paid => "PAID",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "PAID" => ReportPaymentStatus::Paid,
            _ => ReportPaymentStatus::Pending,
        }
    }
}

impl fmt::Display for ReportPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_status_db_roundtrip() {
        for status in [
            RecordStatus::Unprocessed,
            RecordStatus::Matched,
            RecordStatus::Unmatched,
            RecordStatus::PendingPayment,
            RecordStatus::Paid,
        ] {
            assert_eq!(RecordStatus::from_db_str(status.to_db_str()), status);
        }
    }

    #[test]
    fn test_payout_status_db_roundtrip() {
        assert_eq!(
            PayoutStatus::from_db_str(PayoutStatus::Pending.to_db_str()),
            PayoutStatus::Pending
        );
        assert_eq!(
            PayoutStatus::from_db_str(PayoutStatus::Paid.to_db_str()),
            PayoutStatus::Paid
        );
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        let json = serde_json::to_string(&RecordStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"PENDING_PAYMENT\"");
    }
}
