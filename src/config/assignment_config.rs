// ==========================================
// 项目作业分组核心 - 作业分组配置
// ==========================================
// 来源: assignment.group_config (JSON, camelCase)
// 约束: 在仓储边界解析一次，核心逻辑不接触原始 JSON
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 分组配置解析/校验错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("分组配置 JSON 解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("分组人数配置非法: min_size={min_size}, max_size={max_size} (要求 1 <= min_size <= max_size)")]
    InvalidSizeRange { min_size: u32, max_size: u32 },
}

/// 截止后仍未分组学生的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UngroupedPolicy {
    /// 由教师手动/自动分配
    #[default]
    TeacherAssign,
    /// 截止后自动分组
    AutoAssign,
    /// 允许以个人身份提交
    AllowIndividual,
}

/// 作业分组配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignmentConfig {
    pub group_required: bool,
    pub min_size: u32,
    pub max_size: u32,
    pub group_deadline: Option<DateTime<Utc>>,
    pub allow_switch: bool, // 是否允许主动退组
    pub ungrouped_policy: UngroupedPolicy,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            group_required: true,
            min_size: 1,
            max_size: 4,
            group_deadline: None,
            allow_switch: true,
            ungrouped_policy: UngroupedPolicy::TeacherAssign,
        }
    }
}

impl AssignmentConfig {
    /// 从 JSON 解析并校验
    ///
    /// 空字符串视为未配置，使用默认值
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: AssignmentConfig = if raw.trim().is_empty() {
            AssignmentConfig::default()
        } else {
            serde_json::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_size < 1 || self.min_size > self.max_size {
            return Err(ConfigError::InvalidSizeRange {
                min_size: self.min_size,
                max_size: self.max_size,
            });
        }
        Ok(())
    }

    /// 组队截止时间是否已过
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.group_deadline.map(|d| now > d).unwrap_or(false)
    }

    /// 自动分组目标人数: clamp(preferred 或 max_size, min_size, max_size)
    pub fn target_size(&self, preferred: Option<u32>) -> u32 {
        preferred
            .unwrap_or(self.max_size)
            .clamp(self.min_size, self.max_size)
    }
}
