// ==========================================
// 项目作业分组核心 - 配置层
// ==========================================
// 职责:
// - 作业分组配置 (assignment.group_config, 只读)
// - 进程级可调参数 (config_kv 表)
// ==========================================

pub mod assignment_config;
pub mod config_manager;

// 重导出
pub use assignment_config::{AssignmentConfig, ConfigError, UngroupedPolicy};
pub use config_manager::{config_keys, ConfigManager, GroupSettings};
