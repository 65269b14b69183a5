// ==========================================
// 项目作业分组核心 - 应用状态
// ==========================================
// 职责: 打开共享存储、初始化表结构、装配 API 实例
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{GroupApi, MessageApi, SubmissionApi};
use crate::config::ConfigManager;
use crate::db::init_schema;
use crate::repository::{RepositoryError, Store};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "GROUP_FORMATION_DB";

/// 应用状态
///
/// 所有 API 共享同一个 Store（同一连接）
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 共享存储
    pub store: Store,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 小组API
    pub group_api: Arc<GroupApi>,

    /// 提交API
    pub submission_api: Arc<SubmissionApi>,

    /// 小组消息API
    pub message_api: Arc<MessageApi>,
}

impl AppState {
    /// 创建 AppState
    ///
    /// 打开数据库并执行幂等的建表
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let store = Store::open(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        store
            .write(|tx| init_schema(tx).map_err(RepositoryError::from))
            .map_err(|e| format!("无法初始化表结构: {}", e))?;

        Ok(Self::from_store(db_path, store))
    }

    /// 基于已打开的存储装配（不建表）
    pub fn from_store(db_path: String, store: Store) -> Self {
        let config_manager = Arc::new(ConfigManager::new(store.clone()));
        let group_api = Arc::new(GroupApi::new(store.clone(), config_manager.clone()));
        let submission_api = Arc::new(SubmissionApi::new(store.clone()));
        let message_api = Arc::new(MessageApi::new(store.clone(), config_manager.clone()));

        tracing::info!("AppState初始化完成");
        Self {
            db_path,
            store,
            config_manager,
            group_api,
            submission_api,
            message_api,
        }
    }
}

/// 获取默认数据库路径
///
/// 优先读取 GROUP_FORMATION_DB；否则使用用户数据目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./group_formation.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("group-formation");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("group_formation.db");
        }
    }
    path.to_string_lossy().to_string()
}
