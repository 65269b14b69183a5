// ==========================================
// 项目作业分组核心 - 应用层
// ==========================================
// 职责: 装配共享存储与 API 实例
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
