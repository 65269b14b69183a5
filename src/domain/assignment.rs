// ==========================================
// 项目作业分组核心 - 外部协作方数据（只读）
// ==========================================
// 作业元数据 / 班级 / 花名册 由外部系统维护，本核心只读取
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::AssignmentConfig;
use crate::domain::types::AssignmentType;

/// 作业（仅分组相关字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: String,
    pub class_id: String,
    pub title: String,
    pub assignment_type: AssignmentType,
    pub config: AssignmentConfig, // 由 group_config JSON 在仓储边界解析
}

/// 班级
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub class_id: String,
    pub name: String,
    pub teacher_id: String,
}

/// 花名册条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub class_id: String,
    pub student_id: String,
    pub enrolled_at: NaiveDateTime,
}
