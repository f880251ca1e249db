// ==========================================
// 版税对账结算系统 - 佣金规则
// ==========================================
// 佣金比例解析优先级: 供应商平台覆写 > 平台默认 > 0
// 金额拆分: commission = gross × rate; net = gross − commission
// ==========================================

use crate::domain::platform::{Platform, PlatformSplit};

// ==========================================
// CommissionSplit - 单笔金额拆分结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommissionSplit {
    pub rate: f64,
    pub commission_amount: f64,
    pub net_amount: f64,
}

/// 解析某供应商在某平台的生效佣金比例
///
/// # 优先级
/// 1. 供应商对该平台的覆写 (platform_split)
/// 2. 平台默认比例 (default_split)
/// 3. 两者皆无 → 0 (全额归供应商)
pub fn resolve_commission_rate(
    splits: &[PlatformSplit],
    platform: Option<&Platform>,
    platform_id: &str,
) -> f64 {
    if let Some(split) = splits.iter().find(|s| s.platform_id == platform_id) {
        return split.commission_rate;
    }
    platform.map(|p| p.default_split).unwrap_or(0.0)
}

/// 按比例拆分毛收入
pub fn split_gross(gross_amount: f64, rate: f64) -> CommissionSplit {
    let commission_amount = gross_amount * rate;
    CommissionSplit {
        rate,
        commission_amount,
        net_amount: gross_amount - commission_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn platform(id: &str, default_split: f64) -> Platform {
        Platform {
            platform_id: id.to_string(),
            name: format!("P-{id}"),
            default_split,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn split(platform_id: &str, rate: f64) -> PlatformSplit {
        PlatformSplit {
            vendor_id: "v1".to_string(),
            platform_id: platform_id.to_string(),
            commission_rate: rate,
        }
    }

    #[test]
    fn test_vendor_override_beats_platform_default() {
        let p = platform("p1", 0.25);
        let splits = vec![split("p1", 0.15)];
        assert_eq!(resolve_commission_rate(&splits, Some(&p), "p1"), 0.15);
    }

    #[test]
    fn test_platform_default_when_no_override() {
        let p = platform("p1", 0.25);
        assert_eq!(resolve_commission_rate(&[], Some(&p), "p1"), 0.25);
    }

    #[test]
    fn test_zero_when_neither_exists() {
        assert_eq!(resolve_commission_rate(&[], None, "p1"), 0.0);
    }

    #[test]
    fn test_split_gross_parts_sum_to_gross() {
        let result = split_gross(150.0, 0.2);
        assert!((result.commission_amount - 30.0).abs() < 1e-6);
        assert!((result.net_amount - 120.0).abs() < 1e-6);
        assert!((result.commission_amount + result.net_amount - 150.0).abs() < 1e-6);
    }
}
