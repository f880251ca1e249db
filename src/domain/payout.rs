// ==========================================
// 版税对账结算系统 - 出账领域模型
// ==========================================
// 用途: 出账台账,每次聚合认领操作精确生成一条
// ==========================================

use crate::domain::types::PayoutStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Payout - 出账单
// ==========================================
// 红线: total_amount 创建后不可变,且等于所辖记录净额之和
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub payout_id: String,
    pub vendor_id: String,
    pub payout_number: i64,              // 顺序展示编号 (MAX+1 分配)
    pub total_amount: f64,               // 净额合计
    pub status: PayoutStatus,            // PENDING → PAID
    pub payment_date: Option<NaiveDate>, // 结清日期
    pub created_at: DateTime<Utc>,
}

// ==========================================
// PayoutSummary - 未付汇总 (按平台×账期分组)
// ==========================================
// record_ids 必须携带,供调用方勾选子集发起出账
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutSummary {
    pub platform_id: String,
    pub platform_name: String,
    pub month: NaiveDate,
    pub gross_amount: f64,
    pub commission_rate: f64,
    pub commission_amount: f64,
    pub net_payout: f64,
    pub status: String, // 固定为 "Unpaid"
    pub record_ids: Vec<String>,
}

// ==========================================
// PayoutCreated - 出账创建结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutCreated {
    pub payout_id: String,
    pub payout_number: i64,
    pub total_amount: f64,
    pub records_count: usize,
}
