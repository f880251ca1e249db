// ==========================================
// 版税对账结算系统 - 供应商匹配器
// ==========================================
// 职责: 把报表中的自由文本供应商名解析到已知供应商
// 规则: 别名归一化 (trim + 小写);原始串按逗号切分,
//       首个命中别名表的 token 胜出 (位置优先,刻意保留)
// ==========================================

use crate::domain::revenue::NormalizedRecord;
use crate::domain::types::RecordStatus;
use crate::domain::vendor::Vendor;
use std::collections::HashMap;

// ==========================================
// VendorMatcher - 别名查找表
// ==========================================
pub struct VendorMatcher {
    // 归一化别名 → vendor_id
    sub_label_map: HashMap<String, String>,
}

impl VendorMatcher {
    /// 由全量供应商构建别名表
    ///
    /// 空白别名跳过;重复别名后写覆盖 (与构建顺序一致)
    pub fn new(vendors: &[Vendor]) -> Self {
        let mut sub_label_map = HashMap::new();
        for vendor in vendors {
            for label in &vendor.sub_labels {
                let normalized = label.trim().to_lowercase();
                if !normalized.is_empty() {
                    sub_label_map.insert(normalized, vendor.vendor_id.clone());
                }
            }
        }
        Self { sub_label_map }
    }

    /// 解析单个原始供应商串
    ///
    /// 按逗号切分为候选 token,逐个归一化查表,首个命中者胜出;
    /// 后续 token 即使命中其他供应商也被忽略
    pub fn resolve(&self, raw_vendor_name: &str) -> Option<&str> {
        for part in raw_vendor_name.split(',') {
            let normalized = part.trim().to_lowercase();
            if let Some(vendor_id) = self.sub_label_map.get(&normalized) {
                return Some(vendor_id.as_str());
            }
        }
        None
    }

    /// 批量匹配归一化记录,就地写入 vendor_id 与状态
    ///
    /// 命中 → MATCHED;未命中 → UNMATCHED (vendor_id 保持 None)
    pub fn match_records(&self, records: &mut [NormalizedRecord]) {
        for record in records.iter_mut() {
            match self.resolve(&record.raw_vendor_name) {
                Some(vendor_id) => {
                    record.vendor_id = Some(vendor_id.to_string());
                    record.status = RecordStatus::Matched;
                }
                None => {
                    record.vendor_id = None;
                    record.status = RecordStatus::Unmatched;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Map;

    fn vendor(id: &str, labels: &[&str]) -> Vendor {
        Vendor {
            vendor_id: id.to_string(),
            company_name: format!("{id} Inc"),
            vendor_number: format!("V-{id}"),
            sub_labels: labels.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn record(raw: &str) -> NormalizedRecord {
        NormalizedRecord {
            raw_vendor_name: raw.to_string(),
            gross_revenue: 1.0,
            line_item_name: "N/A".to_string(),
            metadata: Map::new(),
            vendor_id: None,
            status: RecordStatus::Unprocessed,
        }
    }

    #[test]
    fn test_resolve_normalizes_case_and_whitespace() {
        let matcher = VendorMatcher::new(&[vendor("v1", &["AcmeXXX", "AcmeTeens"])]);
        assert_eq!(matcher.resolve("  acmexxx "), Some("v1"));
        assert_eq!(matcher.resolve("ACMETEENS"), Some("v1"));
        assert_eq!(matcher.resolve("unknown"), None);
    }

    #[test]
    fn test_resolve_first_comma_token_wins() {
        let matcher = VendorMatcher::new(&[
            vendor("v1", &["AcmeXXX"]),
            vendor("v2", &["SomeOtherTag"]),
        ]);

        // 首个命中的 token 胜出,后续 token 命中其他供应商也被忽略
        assert_eq!(matcher.resolve("AcmeXXX, SomeOtherTag"), Some("v1"));
        // 首 token 未命中时继续尝试后续 token
        assert_eq!(matcher.resolve("nobody, SomeOtherTag"), Some("v2"));
    }

    #[test]
    fn test_match_records_sets_status() {
        let matcher = VendorMatcher::new(&[vendor("v1", &["StarOriginals"])]);
        let mut records = vec![record("StarOriginals"), record("Mystery Studio")];

        matcher.match_records(&mut records);

        assert_eq!(records[0].vendor_id.as_deref(), Some("v1"));
        assert_eq!(records[0].status, RecordStatus::Matched);
        assert_eq!(records[1].vendor_id, None);
        assert_eq!(records[1].status, RecordStatus::Unmatched);
    }

    #[test]
    fn test_blank_sub_labels_skipped() {
        let matcher = VendorMatcher::new(&[vendor("v1", &["  ", "Real"])]);
        assert_eq!(matcher.resolve(""), None);
        assert_eq!(matcher.resolve("Real"), Some("v1"));
    }
}
