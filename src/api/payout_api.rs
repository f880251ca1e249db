// ==========================================
// 版税对账结算系统 - 出账业务接口
// ==========================================
// 职责: 未付汇总查询 / 出账创建 / 出账结清
// 约定: 读取阶段在事务外完成计算,写入阶段进认领事务
//       (事务内乐观复核兜底并发窗口)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::payout::{Payout, PayoutCreated, PayoutSummary};
use crate::domain::revenue::RevenueRecord;
use crate::engine::commission::{resolve_commission_rate, split_gross};
use crate::engine::payout_aggregator::aggregate_unpaid;
use crate::repository::payout_repo::RecordAmounts;
use crate::repository::{PayoutRepository, PlatformRepository, RevenueRepository, VendorRepository};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// PayoutApi
// ==========================================
pub struct PayoutApi {
    vendor_repo: Arc<VendorRepository>,
    platform_repo: Arc<PlatformRepository>,
    revenue_repo: Arc<RevenueRepository>,
    payout_repo: Arc<PayoutRepository>,
}

impl PayoutApi {
    pub fn new(
        vendor_repo: Arc<VendorRepository>,
        platform_repo: Arc<PlatformRepository>,
        revenue_repo: Arc<RevenueRepository>,
        payout_repo: Arc<PayoutRepository>,
    ) -> Self {
        Self {
            vendor_repo,
            platform_repo,
            revenue_repo,
            payout_repo,
        }
    }

    /// 供应商未付汇总 (按平台×账期分组)
    ///
    /// # 错误
    /// - VendorNotFound: 供应商不存在 (终止性错误)
    ///
    /// # 说明
    /// 无未付明细 → 空列表,不是错误
    pub fn get_unpaid_summaries(&self, vendor_id: &str) -> ApiResult<Vec<PayoutSummary>> {
        // 1. 供应商校验
        self.require_vendor(vendor_id)?;

        // 2. 未认领明细 (已按账期升序)
        let records = self.revenue_repo.find_unpaid_by_vendor(vendor_id)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        // 3. 聚合上下文: 涉及平台 + 供应商佣金覆写
        let platform_ids = distinct_platform_ids(&records);
        let platforms = self.platform_repo.find_by_ids(&platform_ids)?;
        let splits = self.vendor_repo.find_splits(vendor_id)?;

        // 4. 分组计算
        Ok(aggregate_unpaid(&records, &platforms, &splits))
    }

    /// 创建出账单,原子认领所选明细
    ///
    /// # 错误
    /// - RecordsNotFound: 请求的 id 部分不存在/属于他人/已被认领
    /// - ConcurrentClaimConflict: 事务内乐观复核失败 (并发认领抢先),可重试
    #[instrument(skip(self, record_ids), fields(vendor_id = %vendor_id, requested = record_ids.len()))]
    pub fn create_payout(
        &self,
        vendor_id: &str,
        record_ids: &[String],
    ) -> ApiResult<PayoutCreated> {
        self.require_vendor(vendor_id)?;
        if record_ids.is_empty() {
            return Err(ApiError::InvalidInput(
                "出账请求必须至少包含一条明细".to_string(),
            ));
        }

        // === 读取阶段 (事务外) ===
        // 只取"属于该供应商且尚未被认领"的明细
        let records = self
            .revenue_repo
            .find_unassigned_by_ids(vendor_id, record_ids)?;

        if records.len() != record_ids.len() {
            let found: HashSet<&str> = records.iter().map(|r| r.record_id.as_str()).collect();
            let missing: Vec<&str> = record_ids
                .iter()
                .map(String::as_str)
                .filter(|id| !found.contains(id))
                .collect();
            return Err(ApiError::RecordsNotFound(missing.join(", ")));
        }

        let platform_ids = distinct_platform_ids(&records);
        let platforms = self.platform_repo.find_by_ids(&platform_ids)?;
        let splits = self.vendor_repo.find_splits(vendor_id)?;

        // === 计算阶段 ===
        // 每条明细按供应商覆写/平台默认解析比例,累计净额合计
        let mut total_amount = 0.0;
        let updates: Vec<RecordAmounts> = records
            .iter()
            .map(|record| {
                let platform = platforms
                    .iter()
                    .find(|p| p.platform_id == record.platform_id);
                let rate = resolve_commission_rate(&splits, platform, &record.platform_id);
                let split = split_gross(record.gross_revenue, rate);
                total_amount += split.net_amount;

                RecordAmounts {
                    record_id: record.record_id.clone(),
                    commission_amount: split.commission_amount,
                    net_amount: split.net_amount,
                }
            })
            .collect();

        // === 写入阶段 (认领事务,含乐观复核) ===
        let created = self
            .payout_repo
            .create_payout_with_records(vendor_id, &updates, total_amount)?;

        info!(
            payout_id = %created.payout_id,
            payout_number = created.payout_number,
            "出账创建成功"
        );

        Ok(created)
    }

    /// 结清出账单
    ///
    /// # 错误
    /// - PayoutNotFound: 出账单不存在
    /// - AlreadySettled: 出账单已结清 (状态与付款日期保持原样)
    pub fn settle_payout(&self, payout_id: &str, payment_date: NaiveDate) -> ApiResult<Payout> {
        Ok(self.payout_repo.settle(payout_id, payment_date)?)
    }

    /// 出账单详情 (含所辖明细,按毛收入降序)
    pub fn get_payout(&self, payout_id: &str) -> ApiResult<(Payout, Vec<RevenueRecord>)> {
        let payout = self
            .payout_repo
            .find_by_id(payout_id)?
            .ok_or_else(|| ApiError::PayoutNotFound(payout_id.to_string()))?;

        let records = self.revenue_repo.find_by_payout(payout_id)?;
        Ok((payout, records))
    }

    /// 全量出账单,新的在前
    pub fn list_payouts(&self) -> ApiResult<Vec<Payout>> {
        Ok(self.payout_repo.find_all()?)
    }

    /// 供应商存在性校验
    fn require_vendor(&self, vendor_id: &str) -> ApiResult<()> {
        self.vendor_repo
            .find_by_id(vendor_id)?
            .ok_or_else(|| ApiError::VendorNotFound(vendor_id.to_string()))?;
        Ok(())
    }
}

/// 去重平台 id,维持首次出现顺序
fn distinct_platform_ids(records: &[RevenueRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.platform_id.as_str()))
        .map(|r| r.platform_id.clone())
        .collect()
}
