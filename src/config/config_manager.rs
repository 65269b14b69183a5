// ==========================================
// 项目作业分组核心 - 配置管理器
// ==========================================
// 职责: 进程级可调参数的读取与覆写
// 存储: config_kv 表 (key-value)
// 注意: 在进入写事务之前读取，避免与 Store::write 争用同一连接
// ==========================================

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::Store;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 邀请码冲突时的最大生成次数
    pub const INVITE_CODE_MAX_ATTEMPTS: &str = "invite_code.max_attempts";

    // 消息
    pub const MESSAGE_MAX_PAGE_LIMIT: &str = "message.max_page_limit";
    pub const MESSAGE_MAX_CONTENT_CHARS: &str = "message.max_content_chars";

    // 自动分组命名前缀
    pub const AUTO_GROUP_NAME_PREFIX: &str = "auto_assign.group_name_prefix";
}

/// 分组核心参数（类型化）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettings {
    pub invite_code_max_attempts: u32,
    pub message_max_page_limit: u32,
    pub message_max_content_chars: usize,
    pub auto_group_name_prefix: String,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            invite_code_max_attempts: 8,
            message_max_page_limit: 100,
            message_max_content_chars: 2000,
            auto_group_name_prefix: "Group".to_string(),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    store: Store,
}

impl ConfigManager {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// 读取配置值
    pub fn get_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.store.read(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM config_kv WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    /// 写入/覆盖配置值
    pub fn set_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        self.store.write(|tx| {
            tx.execute(
                r#"INSERT INTO config_kv (key, value, updated_at)
                   VALUES (?1, ?2, datetime('now'))
                   ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
                params![key, value],
            )?;
            Ok::<_, RepositoryError>(())
        })?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    /// 解析为指定类型，缺省或非法时使用默认值
    fn get_parsed_or<T: FromStr>(&self, key: &str, default: T) -> RepositoryResult<T> {
        match self.get_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(key, raw = %raw, "配置值无法解析，使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// 读取分组核心参数
    pub fn group_settings(&self) -> RepositoryResult<GroupSettings> {
        let defaults = GroupSettings::default();

        let invite_code_max_attempts = self
            .get_parsed_or(config_keys::INVITE_CODE_MAX_ATTEMPTS, defaults.invite_code_max_attempts)?
            .max(1);
        let message_max_page_limit = self
            .get_parsed_or(config_keys::MESSAGE_MAX_PAGE_LIMIT, defaults.message_max_page_limit)?
            .max(1);
        let message_max_content_chars = self
            .get_parsed_or(
                config_keys::MESSAGE_MAX_CONTENT_CHARS,
                defaults.message_max_content_chars,
            )?
            .max(1);
        let auto_group_name_prefix = self
            .get_value(config_keys::AUTO_GROUP_NAME_PREFIX)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.auto_group_name_prefix);

        Ok(GroupSettings {
            invite_code_max_attempts,
            message_max_page_limit,
            message_max_content_chars,
            auto_group_name_prefix,
        })
    }

    /// 所有配置的快照（JSON）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let map: BTreeMap<String, String> = self.store.read(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<Result<BTreeMap<_, _>, _>>()?;
            Ok::<_, RepositoryError>(rows)
        })?;

        serde_json::to_string(&json!(map)).map_err(|e| RepositoryError::InternalError(e.to_string()))
    }
}
