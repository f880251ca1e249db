// ==========================================
// 版税对账结算系统 - 供应商领域模型
// ==========================================
// 用途: 版税收款方(内容供应商/厂牌)主数据
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Vendor - 供应商
// ==========================================
// sub_labels: 该供应商在各平台报表中可能出现的别名列表
// 用于自由文本供应商名的归一化匹配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: String,        // 供应商唯一标识 (UUID)
    pub company_name: String,     // 公司名称
    pub vendor_number: String,    // 业务编号 (如 V001)
    pub sub_labels: Vec<String>,  // 别名/厂牌列表
    pub created_at: DateTime<Utc>,
}
