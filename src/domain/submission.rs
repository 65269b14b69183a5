// ==========================================
// 项目作业分组核心 - 提交记录
// ==========================================
// 每个(学生, 作业)一条记录，按 group_id 标记所属小组
// 文件本身由外部存储管理，这里只保存引用
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 已上传文件引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedFile {
    pub file_name: String,
    pub storage_key: String,
    pub size_bytes: u64,
}

/// 分工条目
///
/// 百分比之和不在核心中校验（边界层策略）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaborDivisionEntry {
    pub student_id: String,
    pub task: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: String,
    pub assignment_id: String,
    pub student_id: String,
    pub group_id: String,
    pub files: Vec<SubmittedFile>,
    pub labor_division: Vec<LaborDivisionEntry>,
    pub submitted_by: String,
    pub submitted_at: NaiveDateTime,
}
