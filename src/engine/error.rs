// ==========================================
// 项目作业分组核心 - 业务规则违反
// ==========================================
// 引擎层只判断规则，不拼 SQL；每个违反都带显式原因
// ==========================================

use thiserror::Error;

use crate::domain::types::GroupStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleViolation {
    // ===== 作业/班级 =====
    #[error("作业不是分组类型: assignment_id={assignment_id}")]
    AssignmentNotGroupType { assignment_id: String },

    #[error("学生未选该课程: student_id={student_id}, class_id={class_id}")]
    NotInClass { student_id: String, class_id: String },

    #[error("非班级任课教师: caller={caller_id}, class_id={class_id}")]
    NotOwner { caller_id: String, class_id: String },

    #[error("小组不属于该作业: group_assignment={group_assignment_id}, requested={requested_assignment_id}")]
    AssignmentMismatch {
        group_assignment_id: String,
        requested_assignment_id: String,
    },

    // ===== 组队约束 =====
    #[error("组队截止时间已过: deadline={deadline}")]
    GroupDeadlinePassed { deadline: String },

    #[error("学生已在该作业的小组中: student_id={student_id}, group_id={group_id}")]
    AlreadyGrouped { student_id: String, group_id: String },

    #[error("小组已满: group_id={group_id}, count={count}, max={max}")]
    CapacityFull { group_id: String, count: u32, max: u32 },

    #[error("小组已冻结，不允许成员变更: group_id={group_id}, status={status}")]
    GroupLocked { group_id: String, status: GroupStatus },

    #[error("该作业不允许退组: assignment_id={assignment_id}")]
    SwitchNotAllowed { assignment_id: String },

    // ===== 组长权限 =====
    #[error("仅组长可执行该操作: group_id={group_id}, caller={caller_id}")]
    NotLeader { group_id: String, caller_id: String },

    #[error("组长不能移除自己，请使用退组")]
    SelfRemoval,

    #[error("不是小组成员: group_id={group_id}, student_id={student_id}")]
    NotAMember { group_id: String, student_id: String },

    #[error("目标已是组长: student_id={student_id}")]
    NoOpTransfer { student_id: String },

    // ===== 提交 =====
    #[error("小组人数不足: count={count}, min={min}")]
    SizeBelowMinimum { count: u32, min: u32 },
}
