// ==========================================
// 版税对账结算系统 - 出账仓储
// ==========================================
// 职责: payout 创建(认领事务)与结清
// 红线1: 认领事务内必须乐观复核"请求的记录仍未被认领",
//        复核失败整体回滚,绝不静默双重认领
// 红线2: 结清非 PENDING 出账单必须拒绝
// ==========================================

use crate::config::AMOUNT_UPDATE_BATCH_SIZE;
use crate::domain::payout::{Payout, PayoutCreated};
use crate::domain::types::{PayoutStatus, RecordStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::platform_repo::parse_utc;
use chrono::{NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// RecordAmounts - 认领时写回的单条金额
// ==========================================
#[derive(Debug, Clone)]
pub struct RecordAmounts {
    pub record_id: String,
    pub commission_amount: f64,
    pub net_amount: f64,
}

// ==========================================
// PayoutRepository
// ==========================================
pub struct PayoutRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PayoutRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 认领事务: 创建出账单并原子认领全部明细
    ///
    /// # 流程 (单个 IMMEDIATE 事务,整体成败)
    /// 1. 乐观复核: 请求的 record_id 必须全部仍未被认领,
    ///    否则 ConcurrentClaimConflict (并发认领已抢先)
    /// 2. 分配顺序编号 payout_number = MAX+1 (同事务内,避免并发重号)
    /// 3. 写入 PENDING 出账单 (总额为预先算好的净额合计)
    /// 4. 批量挂接明细: payout_id + 状态 → PENDING_PAYMENT
    /// 5. 分批回写每条的佣金/净额 (多行 VALUES 更新,
    ///    批大小受参数上限约束,但所有批仍在同一事务内)
    ///
    /// # 并发
    /// IMMEDIATE 事务使两个重叠认领在写锁处串行化,
    /// 后到者必然观察到复核失败
    pub fn create_payout_with_records(
        &self,
        vendor_id: &str,
        updates: &[RecordAmounts],
        total_amount: f64,
    ) -> RepositoryResult<PayoutCreated> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let record_ids: Vec<&str> = updates.iter().map(|u| u.record_id.as_str()).collect();

        // === 步骤 1: 乐观复核 ===
        let placeholders = vec!["?"; record_ids.len()].join(", ");
        let still_unassigned: i64 = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM revenue_record
                 WHERE record_id IN ({placeholders}) AND payout_id IS NULL"
            ),
            rusqlite::params_from_iter(record_ids.iter()),
            |row| row.get(0),
        )?;

        if still_unassigned as usize != updates.len() {
            return Err(RepositoryError::ConcurrentClaimConflict {
                message: format!(
                    "请求认领 {} 条,复核时仅 {} 条仍未被认领",
                    updates.len(),
                    still_unassigned
                ),
            });
        }

        // === 步骤 2: 分配顺序编号 ===
        let payout_number: i64 = tx.query_row(
            "SELECT COALESCE(MAX(payout_number), 0) + 1 FROM payout",
            [],
            |row| row.get(0),
        )?;

        // === 步骤 3: 写入出账单 ===
        let payout_id = Uuid::new_v4().to_string();
        tx.execute(
            r#"INSERT INTO payout (
                payout_id, vendor_id, payout_number, total_amount, status, payment_date, created_at
            ) VALUES (?, ?, ?, ?, ?, NULL, ?)"#,
            params![
                &payout_id,
                vendor_id,
                payout_number,
                total_amount,
                PayoutStatus::Pending.to_db_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        // === 步骤 4: 批量挂接明细 ===
        let linked = tx.execute(
            &format!(
                "UPDATE revenue_record SET payout_id = ?, status = ?
                 WHERE record_id IN ({placeholders})"
            ),
            rusqlite::params_from_iter(
                [
                    Value::Text(payout_id.clone()),
                    Value::Text(RecordStatus::PendingPayment.to_db_str().to_string()),
                ]
                .into_iter()
                .chain(record_ids.iter().map(|id| Value::Text(id.to_string()))),
            ),
        )?;
        debug!(payout_id = %payout_id, linked = linked, "明细挂接完成");

        // === 步骤 5: 分批回写佣金/净额 ===
        for chunk in updates.chunks(AMOUNT_UPDATE_BATCH_SIZE) {
            Self::batch_write_amounts_tx(&tx, chunk)?;
        }

        tx.commit()?;

        info!(
            payout_id = %payout_id,
            payout_number = payout_number,
            records = updates.len(),
            total_amount = total_amount,
            "出账单创建完成"
        );

        Ok(PayoutCreated {
            payout_id,
            payout_number,
            total_amount,
            records_count: updates.len(),
        })
    }

    /// 多行 VALUES 批量回写 (单条语句更新整批)
    ///
    /// SQLite 对 VALUES 子查询的列命名为 column1/column2/column3;
    /// 每行 3 个绑定参数,批大小由调用方控制以避开参数上限
    fn batch_write_amounts_tx(
        tx: &rusqlite::Transaction<'_>,
        chunk: &[RecordAmounts],
    ) -> RepositoryResult<()> {
        let rows = vec!["(?, ?, ?)"; chunk.len()].join(", ");
        let sql = format!(
            "UPDATE revenue_record
             SET commission_amount = v.column2,
                 net_amount = v.column3
             FROM (VALUES {rows}) AS v
             WHERE revenue_record.record_id = v.column1"
        );

        let bind_values = chunk.iter().flat_map(|u| {
            [
                Value::Text(u.record_id.clone()),
                Value::Real(u.commission_amount),
                Value::Real(u.net_amount),
            ]
        });

        tx.execute(&sql, rusqlite::params_from_iter(bind_values))?;
        Ok(())
    }

    /// 结清出账单
    ///
    /// # 流程 (单事务,小而快)
    /// 1. 读取出账单;不存在 → NotFound
    /// 2. 状态必须是 PENDING,否则 InvalidStateTransition
    ///    (已结清的出账单不允许二次结清,付款日期不可被覆盖)
    /// 3. 出账单 → PAID + 付款日期;所辖明细 → PAID
    pub fn settle(&self, payout_id: &str, payment_date: NaiveDate) -> RepositoryResult<Payout> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let current: Option<Payout> = tx
            .query_row(
                &format!("SELECT {PAYOUT_COLUMNS} FROM payout WHERE payout_id = ?"),
                params![payout_id],
                map_payout_row,
            )
            .optional()?;

        let payout = current.ok_or_else(|| RepositoryError::NotFound {
            entity: "Payout".to_string(),
            id: payout_id.to_string(),
        })?;

        if payout.status != PayoutStatus::Pending {
            return Err(RepositoryError::InvalidStateTransition {
                from: payout.status.to_string(),
                to: PayoutStatus::Paid.to_string(),
            });
        }

        let date_str = payment_date.format("%Y-%m-%d").to_string();
        tx.execute(
            "UPDATE payout SET status = ?, payment_date = ? WHERE payout_id = ?",
            params![PayoutStatus::Paid.to_db_str(), date_str, payout_id],
        )?;

        tx.execute(
            "UPDATE revenue_record SET status = ? WHERE payout_id = ?",
            params![RecordStatus::Paid.to_db_str(), payout_id],
        )?;

        tx.commit()?;

        info!(payout_id = %payout_id, payment_date = %date_str, "出账单已结清");

        Ok(Payout {
            status: PayoutStatus::Paid,
            payment_date: Some(payment_date),
            ..payout
        })
    }

    /// 按 payout_id 查询
    pub fn find_by_id(&self, payout_id: &str) -> RepositoryResult<Option<Payout>> {
        let conn = self.get_conn()?;

        conn.query_row(
            &format!("SELECT {PAYOUT_COLUMNS} FROM payout WHERE payout_id = ?"),
            params![payout_id],
            map_payout_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// 全量出账单,新的在前
    pub fn find_all(&self) -> RepositoryResult<Vec<Payout>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payout ORDER BY created_at DESC"
        ))?;

        let payouts = stmt
            .query_map([], map_payout_row)?
            .collect::<Result<Vec<Payout>, _>>()?;

        Ok(payouts)
    }
}

/// payout 查询列 (与 map_payout_row 严格对齐)
const PAYOUT_COLUMNS: &str =
    "payout_id, vendor_id, payout_number, total_amount, status, payment_date, created_at";

/// 行映射: payout 表 → Payout
fn map_payout_row(row: &Row<'_>) -> rusqlite::Result<Payout> {
    let payment_date: Option<String> = row.get(5)?;
    Ok(Payout {
        payout_id: row.get(0)?,
        vendor_id: row.get(1)?,
        payout_number: row.get(2)?,
        total_amount: row.get(3)?,
        status: PayoutStatus::from_db_str(&row.get::<_, String>(4)?),
        payment_date: payment_date
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        created_at: parse_utc(row.get::<_, String>(6)?),
    })
}
