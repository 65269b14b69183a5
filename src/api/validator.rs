// ==========================================
// 项目作业分组核心 - 输入校验
// ==========================================
// 边界层校验，失败一律返回 ApiError::InvalidInput
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::submission::{LaborDivisionEntry, SubmittedFile};

/// 小组名最大字符数
pub const MAX_GROUP_NAME_CHARS: usize = 50;

/// ID 非空
pub fn require_id(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

/// 小组名: 去首尾空白后 1..=50 个字符
pub fn normalize_group_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("小组名称不能为空".to_string()));
    }
    if name.chars().count() > MAX_GROUP_NAME_CHARS {
        return Err(ApiError::InvalidInput(format!(
            "小组名称不能超过{}个字符",
            MAX_GROUP_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

/// 消息内容: 去首尾空白后非空且不超过上限
pub fn normalize_message_content(content: &str, max_chars: usize) -> ApiResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::InvalidInput("消息内容不能为空".to_string()));
    }
    if content.chars().count() > max_chars {
        return Err(ApiError::InvalidInput(format!(
            "消息内容不能超过{}个字符",
            max_chars
        )));
    }
    Ok(content.to_string())
}

/// 分页参数，返回 (offset, limit)
///
/// page 从 1 开始；limit 取值 1..=max_limit
pub fn page_window(page: u32, limit: u32, max_limit: u32) -> ApiResult<(u32, u32)> {
    if page == 0 {
        return Err(ApiError::InvalidInput("page 从 1 开始".to_string()));
    }
    if limit == 0 || limit > max_limit {
        return Err(ApiError::InvalidInput(format!(
            "limit 取值范围 1..={}",
            max_limit
        )));
    }
    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| ApiError::InvalidInput("page 过大".to_string()))?;
    Ok((offset, limit))
}

/// 提交文件列表非空，且每个文件名/存储键非空
pub fn validate_files(files: &[SubmittedFile]) -> ApiResult<()> {
    if files.is_empty() {
        return Err(ApiError::InvalidInput("提交文件不能为空".to_string()));
    }
    for file in files {
        if file.file_name.trim().is_empty() || file.storage_key.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件名和存储键不能为空".to_string()));
        }
    }
    Ok(())
}

/// 分工条目校验: 学生ID与任务非空，百分比为 0..=100 的有限数
///
/// 不要求百分比之和为 100
pub fn validate_labor_division(entries: &[LaborDivisionEntry]) -> ApiResult<()> {
    for entry in entries {
        require_id("分工学生ID", &entry.student_id)?;
        if entry.task.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "学生{}的分工任务不能为空",
                entry.student_id
            )));
        }
        if !entry.percentage.is_finite() || !(0.0..=100.0).contains(&entry.percentage) {
            return Err(ApiError::InvalidInput(format!(
                "学生{}的贡献百分比超出范围: {}",
                entry.student_id, entry.percentage
            )));
        }
    }
    Ok(())
}
