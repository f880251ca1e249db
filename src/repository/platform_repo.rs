// ==========================================
// 版税对账结算系统 - 平台仓储
// ==========================================
// 职责: platform / platform_mapping_template 数据访问
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

use crate::domain::platform::{MappingTemplate, Platform};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// PlatformRepository
// ==========================================
pub struct PlatformRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlatformRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建平台
    pub fn create(&self, platform: &Platform) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO platform (platform_id, name, default_split, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &platform.platform_id,
                &platform.name,
                platform.default_split,
                platform.created_at.to_rfc3339(),
                platform.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(platform.platform_id.clone())
    }

    /// 按 platform_id 查询
    pub fn find_by_id(&self, platform_id: &str) -> RepositoryResult<Option<Platform>> {
        let conn = self.get_conn()?;

        conn.query_row(
            r#"SELECT platform_id, name, default_split, created_at, updated_at
               FROM platform WHERE platform_id = ?"#,
            params![platform_id],
            map_platform_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// 按 id 集合批量查询 (出账聚合上下文)
    pub fn find_by_ids(&self, platform_ids: &[String]) -> RepositoryResult<Vec<Platform>> {
        if platform_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;

        let placeholders = vec!["?"; platform_ids.len()].join(", ");
        let sql = format!(
            "SELECT platform_id, name, default_split, created_at, updated_at
             FROM platform WHERE platform_id IN ({placeholders})"
        );

        let mut stmt = conn.prepare(&sql)?;
        let platforms = stmt
            .query_map(rusqlite::params_from_iter(platform_ids), map_platform_row)?
            .collect::<Result<Vec<Platform>, _>>()?;

        Ok(platforms)
    }

    /// 查询平台的列映射模板
    pub fn find_mapping_template(
        &self,
        platform_id: &str,
    ) -> RepositoryResult<Option<MappingTemplate>> {
        let conn = self.get_conn()?;

        conn.query_row(
            r#"SELECT platform_id, header_row_index, mapping_rules
               FROM platform_mapping_template WHERE platform_id = ?"#,
            params![platform_id],
            |row| {
                let rules_json: String = row.get(2)?;
                Ok(MappingTemplate {
                    platform_id: row.get(0)?,
                    header_row_index: row.get::<_, i64>(1)? as usize,
                    mapping_rules: serde_json::from_str(&rules_json).unwrap_or_default(),
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }

    /// 写入或整体替换列映射模板
    ///
    /// 模板是辅助缓存,并发写入采用 last-writer-wins upsert
    pub fn upsert_mapping_template(&self, template: &MappingTemplate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rules_json = serde_json::to_string(&template.mapping_rules)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

        conn.execute(
            r#"INSERT INTO platform_mapping_template (platform_id, header_row_index, mapping_rules, updated_at)
               VALUES (?, ?, ?, datetime('now'))
               ON CONFLICT(platform_id) DO UPDATE SET
                   header_row_index = excluded.header_row_index,
                   mapping_rules = excluded.mapping_rules,
                   updated_at = excluded.updated_at"#,
            params![
                &template.platform_id,
                template.header_row_index as i64,
                rules_json,
            ],
        )?;

        Ok(())
    }
}

/// 行映射: platform 表 → Platform
fn map_platform_row(row: &Row<'_>) -> rusqlite::Result<Platform> {
    Ok(Platform {
        platform_id: row.get(0)?,
        name: row.get(1)?,
        default_split: row.get(2)?,
        created_at: parse_utc(row.get::<_, String>(3)?),
        updated_at: parse_utc(row.get::<_, String>(4)?),
    })
}

/// 审计时间列解析 (解析失败回退当前时间,不阻断查询)
pub(crate) fn parse_utc(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
