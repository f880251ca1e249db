// ==========================================
// 版税对账结算系统 - 未付汇总聚合器
// ==========================================
// 职责: 把供应商的未出账明细按 (平台, 账期) 分组,
//       套用佣金规则得出每组的毛/佣/净
// 约定: 每组必须携带全部成员 record_id,供调用方勾选出账
// ==========================================

use crate::domain::payout::PayoutSummary;
use crate::domain::platform::{Platform, PlatformSplit};
use crate::domain::revenue::RevenueRecord;
use crate::engine::commission::{resolve_commission_rate, split_gross};
use chrono::NaiveDate;
use std::collections::HashMap;

/// 分组聚合未出账明细
///
/// # 参数
/// - records: 该供应商全部未认领明细 (已按账期升序)
/// - platforms: 涉及平台 (默认佣金比例来源)
/// - splits: 该供应商的平台佣金覆写
///
/// # 返回
/// 每个 (platform_id, period_start) 组一条汇总;
/// 空输入 → 空输出,不是错误
pub fn aggregate_unpaid(
    records: &[RevenueRecord],
    platforms: &[Platform],
    splits: &[PlatformSplit],
) -> Vec<PayoutSummary> {
    let platform_map: HashMap<&str, &Platform> = platforms
        .iter()
        .map(|p| (p.platform_id.as_str(), p))
        .collect();

    // 分组: (platform_id, 账期) → (成员 id, 毛收入合计)
    // 用 Vec 维持首次出现顺序,对齐输入的账期排序
    let mut group_order: Vec<(String, NaiveDate)> = Vec::new();
    let mut groups: HashMap<(String, NaiveDate), (Vec<String>, f64)> = HashMap::new();

    for record in records {
        let key = (record.platform_id.clone(), record.period_start);
        let entry = groups.entry(key.clone()).or_insert_with(|| {
            group_order.push(key);
            (Vec::new(), 0.0)
        });
        entry.0.push(record.record_id.clone());
        entry.1 += record.gross_revenue;
    }

    group_order
        .into_iter()
        .map(|key| {
            let (record_ids, gross_amount) = groups.remove(&key).unwrap_or_default();
            let (platform_id, month) = key;

            let platform = platform_map.get(platform_id.as_str()).copied();
            let rate = resolve_commission_rate(splits, platform, &platform_id);
            let split = split_gross(gross_amount, rate);

            PayoutSummary {
                platform_name: platform
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                platform_id,
                month,
                gross_amount,
                commission_rate: rate,
                commission_amount: split.commission_amount,
                net_payout: split.net_amount,
                status: "Unpaid".to_string(),
                record_ids,
            }
        })
        .collect()
}
