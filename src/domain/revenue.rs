// ==========================================
// 版税对账结算系统 - 营收领域模型
// ==========================================
// 用途: 导入层写入,结算层只读+状态流转
// ==========================================

use crate::domain::types::{RecordStatus, ReportPaymentStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ==========================================
// RevenueReport - 报表头
// ==========================================
// 每次上传/手工录入生成一条,记录来源文件与控制总额
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueReport {
    pub report_id: String,
    pub platform_id: String,
    pub filename: String,             // 源文件名; 手工录入固定为 MANUAL_ENTRY
    pub status: String,               // PROCESSED 等
    pub total_amount: Option<f64>,    // 平台声明的控制总额 (可缺省)
    pub month: NaiveDate,             // 账期月份
    pub invoice_ref: Option<String>,  // 发票号
    pub payment_status: ReportPaymentStatus,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// NormalizedRecord - 归一化中间结构体
// ==========================================
// 导入管道中间产物（表格解析 → 列归一化 → 供应商匹配 → 此结构）
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub raw_vendor_name: String,        // 报表中的原始供应商文本
    pub gross_revenue: f64,             // 毛收入
    pub line_item_name: String,         // 条目标题 (无标题列时为 N/A)
    pub metadata: Map<String, Value>,   // 所有未映射列,原样保留
    pub vendor_id: Option<String>,      // 匹配结果 (匹配失败为 None)
    pub status: RecordStatus,           // MATCHED / UNMATCHED
}

// ==========================================
// RevenueRecord - 营收明细 (持久化形态)
// ==========================================
// 红线1: payout_id 非空 当且仅当 状态 ∈ {PENDING_PAYMENT, PAID}
// 红线2: 记录一经某次出账认领,不可被第二次出账认领
// 正常运营中不删除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueRecord {
    pub record_id: String,
    pub report_id: Option<String>,
    pub platform_id: String,
    pub vendor_id: Option<String>,       // 匹配前为 None
    pub payout_id: Option<String>,       // 被出账认领前为 None
    pub raw_vendor_name: String,
    pub gross_revenue: f64,
    pub line_item_name: String,
    pub metadata: Map<String, Value>,    // 未映射列,键与规范字段互斥
    pub period_start: NaiveDate,         // 账期起 (通常为月首)
    pub period_end: NaiveDate,           // 账期止
    pub status: RecordStatus,
    pub commission_amount: Option<f64>,  // 出账认领时写入
    pub net_amount: Option<f64>,         // 出账认领时写入
    pub created_at: DateTime<Utc>,
}

// ==========================================
// ManualReportRow - 手工录入行
// ==========================================
// 手工报表的单行输入: 供应商已由人工指定,无需匹配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualReportRow {
    pub vendor_id: String,
    pub gross_revenue: f64,
    pub line_item_name: Option<String>, // 缺省为 "Manual Entry"
}
