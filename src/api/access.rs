// ==========================================
// 项目作业分组核心 - 事务内公共读取与身份判定
// ==========================================
// 供 GroupApi / SubmissionApi / MessageApi 在同一连接（事务）内复用
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::api::error::{ApiError, ApiResult};
use crate::config::AssignmentConfig;
use crate::domain::assignment::{Assignment, ClassInfo};
use crate::domain::group::{Capacity, Group, GroupDetail};
use crate::domain::message::NewGroupMessage;
use crate::domain::types::MemberRole;
use crate::engine::error::RuleViolation;
use crate::repository::{
    AssignmentRepository, ClassRosterRepository, GroupMemberRepository, GroupMessageRepository,
    GroupRepository,
};

/// 读取小组及其作业，小组不存在返回 NotFound
pub(crate) fn load_group_context(
    conn: &Connection,
    group_id: &str,
) -> ApiResult<(Group, Assignment)> {
    let group = GroupRepository::new(conn).get(group_id)?;
    let assignment = AssignmentRepository::new(conn).get(&group.assignment_id)?;
    Ok((group, assignment))
}

/// 读取作业所属班级
pub(crate) fn load_class(conn: &Connection, assignment: &Assignment) -> ApiResult<ClassInfo> {
    ClassRosterRepository::new(conn)
        .find_class(&assignment.class_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Class(id={})不存在", assignment.class_id)))
}

/// 学生必须选了作业所属课程
pub(crate) fn ensure_enrolled(
    conn: &Connection,
    assignment: &Assignment,
    student_id: &str,
) -> ApiResult<()> {
    if !ClassRosterRepository::new(conn).is_enrolled(student_id, &assignment.class_id)? {
        return Err(RuleViolation::NotInClass {
            student_id: student_id.to_string(),
            class_id: assignment.class_id.clone(),
        }
        .into());
    }
    Ok(())
}

/// 调用者是否为作业所属班级的任课教师
pub(crate) fn is_owner(conn: &Connection, assignment: &Assignment, caller_id: &str) -> ApiResult<bool> {
    Ok(load_class(conn, assignment)?.teacher_id == caller_id)
}

/// 调用者必须是任课教师
pub(crate) fn ensure_owner(
    conn: &Connection,
    assignment: &Assignment,
    caller_id: &str,
) -> ApiResult<()> {
    if !is_owner(conn, assignment, caller_id)? {
        return Err(RuleViolation::NotOwner {
            caller_id: caller_id.to_string(),
            class_id: assignment.class_id.clone(),
        }
        .into());
    }
    Ok(())
}

/// 调用者是否为小组成员
pub(crate) fn is_member(conn: &Connection, group_id: &str, caller_id: &str) -> ApiResult<bool> {
    Ok(GroupMemberRepository::new(conn)
        .find_member(group_id, caller_id)?
        .is_some())
}

/// 插入成员
///
/// 事务内已做过"一人一组"检查；表上 UNIQUE(assignment_id, student_id) 兜底，
/// 若仍触发则转换为 AlreadyGrouped
pub(crate) fn add_member(
    conn: &Connection,
    group: &Group,
    student_id: &str,
    role: MemberRole,
    at: NaiveDateTime,
) -> ApiResult<()> {
    let members = GroupMemberRepository::new(conn);
    match members.insert(&group.group_id, &group.assignment_id, student_id, role, at) {
        Ok(_) => Ok(()),
        Err(e) if e.is_unique_violation_on("student_id") => {
            let group_id = members
                .find_for_student(&group.assignment_id, student_id)?
                .map(|m| m.group_id)
                .unwrap_or_default();
            Err(RuleViolation::AlreadyGrouped {
                student_id: student_id.to_string(),
                group_id,
            }
            .into())
        }
        Err(e) => Err(e.into()),
    }
}

/// 追加 SYSTEM 消息
pub(crate) fn emit_system(
    conn: &Connection,
    group_id: &str,
    actor_id: &str,
    content: String,
    at: NaiveDateTime,
) -> ApiResult<()> {
    GroupMessageRepository::new(conn).append(&NewGroupMessage::system(
        group_id, actor_id, content, at,
    ))?;
    Ok(())
}

/// 组装小组详情
pub(crate) fn load_detail(
    conn: &Connection,
    group: Group,
    config: &AssignmentConfig,
) -> ApiResult<GroupDetail> {
    let members = GroupMemberRepository::new(conn).find_by_group(&group.group_id)?;
    let capacity = Capacity {
        count: members.len() as u32,
        max: config.max_size,
    };
    Ok(GroupDetail {
        group,
        members,
        capacity,
    })
}
