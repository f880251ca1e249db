// ==========================================
// 版税对账结算系统 - 平台领域模型
// ==========================================
// 用途: 管理员维护的分销平台主数据
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Platform - 分销平台
// ==========================================
// 红线: platform_id 创建后不可变; default_split 与映射模板可更新
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub platform_id: String,      // 平台唯一标识 (UUID)
    pub name: String,             // 平台显示名 (唯一,同时是内置解析策略的查找键)
    pub default_split: f64,       // 默认佣金比例 (0-1 之间的小数)
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// MappingTemplate - 列映射模板
// ==========================================
// 与平台一对一; 人工确认/编辑映射时创建或整体替换
// 模板是辅助缓存而非财务数据,并发覆盖采用 last-writer-wins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingTemplate {
    pub platform_id: String,
    pub header_row_index: usize,             // 该平台报表的表头行下标
    pub mapping_rules: Vec<(String, String)>, // 规范字段名 → 源列名 (保持声明顺序)
}

impl MappingTemplate {
    /// 反查: 源列名 → 规范字段名
    ///
    /// 多个规范字段映射同一源列时,首个声明生效
    pub fn field_for_column(&self, column: &str) -> Option<&str> {
        self.mapping_rules
            .iter()
            .find(|(_, col)| col == column)
            .map(|(field, _)| field.as_str())
    }
}

// ==========================================
// PlatformSplit - 供应商级佣金覆写
// ==========================================
// 优先级: 供应商覆写 > 平台默认 > 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSplit {
    pub vendor_id: String,
    pub platform_id: String,
    pub commission_rate: f64, // 0-1 之间的小数
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_for_column_inverse_lookup() {
        let template = MappingTemplate {
            platform_id: "p1".to_string(),
            header_row_index: 0,
            mapping_rules: vec![
                ("rawVendorName".to_string(), "Studio".to_string()),
                ("grossRevenue".to_string(), "Payouts, $".to_string()),
            ],
        };

        assert_eq!(template.field_for_column("Studio"), Some("rawVendorName"));
        assert_eq!(
            template.field_for_column("Payouts, $"),
            Some("grossRevenue")
        );
        assert_eq!(template.field_for_column("Views"), None);
    }
}
