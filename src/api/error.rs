// ==========================================
// 项目作业分组核心 - API层错误类型
// ==========================================
// 职责: 统一错误类型，转换 Repository/Engine 错误为稳定的错误分类
// 所有失败同步返回调用方，核心不自动重试（邀请码冲突除外）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::engine::error::RuleViolation;
use crate::repository::error::RepositoryError;

// ==========================================
// ErrorKind - 稳定错误分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,   // 小组/作业/成员不存在
    Forbidden,  // 角色不满足（组长/任课教师/成员）
    Conflict,   // 容量/已分组/已冻结/截止/自移除/无效移交
    Validation, // 输入不合法
    Internal,   // 存储或内部错误
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("邀请码生成失败: 连续{attempts}次冲突")]
    InviteCodeExhausted { attempts: u32 },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Rule(rule) => match rule {
                RuleViolation::NotLeader { .. }
                | RuleViolation::NotOwner { .. }
                | RuleViolation::NotInClass { .. }
                | RuleViolation::NotAMember { .. } => ErrorKind::Forbidden,
                RuleViolation::CapacityFull { .. }
                | RuleViolation::AlreadyGrouped { .. }
                | RuleViolation::GroupLocked { .. }
                | RuleViolation::GroupDeadlinePassed { .. }
                | RuleViolation::SelfRemoval
                | RuleViolation::NoOpTransfer { .. }
                | RuleViolation::SwitchNotAllowed { .. }
                | RuleViolation::SizeBelowMinimum { .. } => ErrorKind::Conflict,
                RuleViolation::AssignmentNotGroupType { .. }
                | RuleViolation::AssignmentMismatch { .. } => ErrorKind::Validation,
            },
            ApiError::InvalidInput(_) => ErrorKind::Validation,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::InvalidStateTransition { .. } => ErrorKind::Conflict,
            ApiError::InviteCodeExhausted { .. }
            | ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => ErrorKind::Internal,
        }
    }

    /// 规则违反（若是）
    pub fn rule(&self) -> Option<&RuleViolation> {
        match self {
            ApiError::Rule(rule) => Some(rule),
            _ => None,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::GroupStatus;

    #[test]
    fn test_rule_violation_kinds() {
        let cases = vec![
            (
                RuleViolation::CapacityFull { group_id: "G".into(), count: 4, max: 4 },
                ErrorKind::Conflict,
            ),
            (
                RuleViolation::GroupLocked { group_id: "G".into(), status: GroupStatus::Locked },
                ErrorKind::Conflict,
            ),
            (
                RuleViolation::NotLeader { group_id: "G".into(), caller_id: "S".into() },
                ErrorKind::Forbidden,
            ),
            (
                RuleViolation::NotOwner { caller_id: "T".into(), class_id: "C".into() },
                ErrorKind::Forbidden,
            ),
            (RuleViolation::SelfRemoval, ErrorKind::Conflict),
            (
                RuleViolation::AssignmentNotGroupType { assignment_id: "A".into() },
                ErrorKind::Validation,
            ),
        ];
        for (rule, kind) in cases {
            let err: ApiError = rule.clone().into();
            assert_eq!(err.kind(), kind, "{:?}", rule);
            assert_eq!(err.rule(), Some(&rule));
        }
    }

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Group".to_string(),
            id: "G001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match &api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Group"));
                assert!(msg.contains("G001"));
            }
            _ => panic!("Expected NotFound"),
        }
        assert_eq!(api_err.kind(), ErrorKind::NotFound);

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(api_err.kind(), ErrorKind::Internal);
        assert_eq!(ErrorKind::Conflict.to_string(), "CONFLICT");
    }
}
