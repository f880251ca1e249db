// ==========================================
// 版税对账结算系统 - 营收仓储
// ==========================================
// 职责: revenue_report / revenue_record 数据访问
// 红线: 报表头与其全部明细在同一事务内落库,整体成败
// ==========================================

use crate::domain::revenue::{RevenueRecord, RevenueReport};
use crate::domain::types::{RecordStatus, ReportPaymentStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::platform_repo::parse_utc;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// RevenueRepository
// ==========================================
pub struct RevenueRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RevenueRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在单事务内写入报表头与全部明细
    ///
    /// # 返回
    /// - Ok(写入的明细条数)
    pub fn insert_report_with_records(
        &self,
        report: &RevenueReport,
        records: &[RevenueRecord],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO revenue_report (
                report_id, platform_id, filename, status, total_amount,
                month, invoice_ref, payment_status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &report.report_id,
                &report.platform_id,
                &report.filename,
                &report.status,
                report.total_amount,
                report.month.format("%Y-%m-%d").to_string(),
                &report.invoice_ref,
                report.payment_status.to_db_str(),
                report.created_at.to_rfc3339(),
            ],
        )?;

        let count = Self::batch_insert_records_tx(&tx, records)?;
        tx.commit()?;

        Ok(count)
    }

    /// 在事务中批量插入营收明细
    fn batch_insert_records_tx(
        tx: &Transaction<'_>,
        records: &[RevenueRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"INSERT INTO revenue_record (
                record_id, report_id, platform_id, vendor_id, payout_id,
                raw_vendor_name, gross_revenue, line_item_name, metadata,
                period_start, period_end, status,
                commission_amount, net_amount, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )?;

        let mut count = 0;
        for record in records {
            let metadata_json = serde_json::to_string(&record.metadata)
                .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

            stmt.execute(params![
                &record.record_id,
                &record.report_id,
                &record.platform_id,
                &record.vendor_id,
                &record.payout_id,
                &record.raw_vendor_name,
                record.gross_revenue,
                &record.line_item_name,
                metadata_json,
                record.period_start.format("%Y-%m-%d").to_string(),
                record.period_end.format("%Y-%m-%d").to_string(),
                record.status.to_db_str(),
                record.commission_amount,
                record.net_amount,
                record.created_at.to_rfc3339(),
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// 查询供应商全部未出账明细,按账期升序
    pub fn find_unpaid_by_vendor(&self, vendor_id: &str) -> RepositoryResult<Vec<RevenueRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM revenue_record
             WHERE vendor_id = ? AND payout_id IS NULL
             ORDER BY period_start ASC"
        ))?;

        let records = stmt
            .query_map(params![vendor_id], map_record_row)?
            .collect::<Result<Vec<RevenueRecord>, _>>()?;

        Ok(records)
    }

    /// 按 id 集合查询"属于该供应商且尚未被认领"的明细 (出账读取阶段)
    ///
    /// 返回条数少于请求条数即说明存在非法/他人/已认领 id,由调用方判定
    pub fn find_unassigned_by_ids(
        &self,
        vendor_id: &str,
        record_ids: &[String],
    ) -> RepositoryResult<Vec<RevenueRecord>> {
        if record_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;

        let placeholders = vec!["?"; record_ids.len()].join(", ");
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM revenue_record
             WHERE record_id IN ({placeholders})
               AND vendor_id = ? AND payout_id IS NULL"
        );

        let mut bind_values: Vec<Value> = record_ids
            .iter()
            .map(|id| Value::Text(id.clone()))
            .collect();
        bind_values.push(Value::Text(vendor_id.to_string()));

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(rusqlite::params_from_iter(bind_values), map_record_row)?
            .collect::<Result<Vec<RevenueRecord>, _>>()?;

        Ok(records)
    }

    /// 查询某次出账认领的全部明细
    pub fn find_by_payout(&self, payout_id: &str) -> RepositoryResult<Vec<RevenueRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM revenue_record
             WHERE payout_id = ? ORDER BY gross_revenue DESC"
        ))?;

        let records = stmt
            .query_map(params![payout_id], map_record_row)?
            .collect::<Result<Vec<RevenueRecord>, _>>()?;

        Ok(records)
    }

    /// 按 record_id 查询单条 (测试/诊断用)
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<RevenueRecord>> {
        let conn = self.get_conn()?;

        conn.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM revenue_record WHERE record_id = ?"),
            params![record_id],
            map_record_row,
        )
        .optional()
        .map_err(Into::into)
    }
}

/// revenue_record 查询列 (与 map_record_row 严格对齐)
const RECORD_COLUMNS: &str = "record_id, report_id, platform_id, vendor_id, payout_id, \
     raw_vendor_name, gross_revenue, line_item_name, metadata, \
     period_start, period_end, status, commission_amount, net_amount, created_at";

/// 行映射: revenue_record 表 → RevenueRecord
fn map_record_row(row: &Row<'_>) -> rusqlite::Result<RevenueRecord> {
    let metadata_json: String = row.get(8)?;
    Ok(RevenueRecord {
        record_id: row.get(0)?,
        report_id: row.get(1)?,
        platform_id: row.get(2)?,
        vendor_id: row.get(3)?,
        payout_id: row.get(4)?,
        raw_vendor_name: row.get(5)?,
        gross_revenue: row.get(6)?,
        line_item_name: row.get(7)?,
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
        period_start: parse_date(row.get::<_, String>(9)?),
        period_end: parse_date(row.get::<_, String>(10)?),
        status: RecordStatus::from_db_str(&row.get::<_, String>(11)?),
        commission_amount: row.get(12)?,
        net_amount: row.get(13)?,
        created_at: parse_utc(row.get::<_, String>(14)?),
    })
}

/// 账期列解析 (解析失败回退纪元日期,不阻断查询)
fn parse_date(s: String) -> NaiveDate {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

// map_report_row 在报表查询处内联,此处仅保留类型转换助手
impl RevenueRepository {
    /// 按 report_id 查询报表头
    pub fn find_report_by_id(&self, report_id: &str) -> RepositoryResult<Option<RevenueReport>> {
        let conn = self.get_conn()?;

        conn.query_row(
            r#"SELECT report_id, platform_id, filename, status, total_amount,
                      month, invoice_ref, payment_status, created_at
               FROM revenue_report WHERE report_id = ?"#,
            params![report_id],
            |row| {
                Ok(RevenueReport {
                    report_id: row.get(0)?,
                    platform_id: row.get(1)?,
                    filename: row.get(2)?,
                    status: row.get(3)?,
                    total_amount: row.get(4)?,
                    month: parse_date(row.get::<_, String>(5)?),
                    invoice_ref: row.get(6)?,
                    payment_status: ReportPaymentStatus::from_db_str(
                        &row.get::<_, String>(7)?,
                    ),
                    created_at: parse_utc(row.get::<_, String>(8)?),
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }
}
