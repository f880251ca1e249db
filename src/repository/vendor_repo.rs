// ==========================================
// 版税对账结算系统 - 供应商仓储
// ==========================================
// 职责: vendor / platform_split 数据访问
// ==========================================

use crate::domain::platform::PlatformSplit;
use crate::domain::vendor::Vendor;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::platform_repo::parse_utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// VendorRepository
// ==========================================
pub struct VendorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl VendorRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建供应商
    pub fn create(&self, vendor: &Vendor) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let labels_json = serde_json::to_string(&vendor.sub_labels)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

        conn.execute(
            r#"INSERT INTO vendor (vendor_id, company_name, vendor_number, sub_labels, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &vendor.vendor_id,
                &vendor.company_name,
                &vendor.vendor_number,
                labels_json,
                vendor.created_at.to_rfc3339(),
            ],
        )?;

        Ok(vendor.vendor_id.clone())
    }

    /// 按 vendor_id 查询
    pub fn find_by_id(&self, vendor_id: &str) -> RepositoryResult<Option<Vendor>> {
        let conn = self.get_conn()?;

        conn.query_row(
            r#"SELECT vendor_id, company_name, vendor_number, sub_labels, created_at
               FROM vendor WHERE vendor_id = ?"#,
            params![vendor_id],
            map_vendor_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// 全量供应商 (别名匹配表构建用)
    pub fn find_all(&self) -> RepositoryResult<Vec<Vendor>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT vendor_id, company_name, vendor_number, sub_labels, created_at
               FROM vendor ORDER BY vendor_number"#,
        )?;

        let vendors = stmt
            .query_map([], map_vendor_row)?
            .collect::<Result<Vec<Vendor>, _>>()?;

        Ok(vendors)
    }

    /// 按 id 集合批量查询 (手工报表的严格供应商校验)
    pub fn find_by_ids(&self, vendor_ids: &[String]) -> RepositoryResult<Vec<Vendor>> {
        if vendor_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;

        let placeholders = vec!["?"; vendor_ids.len()].join(", ");
        let sql = format!(
            "SELECT vendor_id, company_name, vendor_number, sub_labels, created_at
             FROM vendor WHERE vendor_id IN ({placeholders})"
        );

        let mut stmt = conn.prepare(&sql)?;
        let vendors = stmt
            .query_map(rusqlite::params_from_iter(vendor_ids), map_vendor_row)?
            .collect::<Result<Vec<Vendor>, _>>()?;

        Ok(vendors)
    }

    /// 查询供应商的平台佣金覆写
    pub fn find_splits(&self, vendor_id: &str) -> RepositoryResult<Vec<PlatformSplit>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT vendor_id, platform_id, commission_rate
               FROM platform_split WHERE vendor_id = ?"#,
        )?;

        let splits = stmt
            .query_map(params![vendor_id], |row| {
                Ok(PlatformSplit {
                    vendor_id: row.get(0)?,
                    platform_id: row.get(1)?,
                    commission_rate: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<PlatformSplit>, _>>()?;

        Ok(splits)
    }

    /// 写入或更新供应商的平台佣金覆写
    pub fn upsert_split(&self, split: &PlatformSplit) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO platform_split (vendor_id, platform_id, commission_rate)
               VALUES (?, ?, ?)
               ON CONFLICT(vendor_id, platform_id) DO UPDATE SET
                   commission_rate = excluded.commission_rate"#,
            params![&split.vendor_id, &split.platform_id, split.commission_rate],
        )?;

        Ok(())
    }
}

/// 行映射: vendor 表 → Vendor
fn map_vendor_row(row: &Row<'_>) -> rusqlite::Result<Vendor> {
    let labels_json: String = row.get(3)?;
    Ok(Vendor {
        vendor_id: row.get(0)?,
        company_name: row.get(1)?,
        vendor_number: row.get(2)?,
        sub_labels: serde_json::from_str(&labels_json).unwrap_or_default(),
        created_at: parse_utc(row.get::<_, String>(4)?),
    })
}
