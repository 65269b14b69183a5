// ==========================================
// 项目作业分组核心 - 成员生命周期规则
// ==========================================
// 状态机: FORMING -> LOCKED / FORMING -> SUBMITTED，单向
// 所有成员变更要求 status == FORMING
// 红线: 不拼 SQL；输入为事务内读取的快照，输出为判定结果
// ==========================================

use chrono::{DateTime, Utc};

use crate::config::AssignmentConfig;
use crate::domain::assignment::Assignment;
use crate::domain::group::{Group, GroupMember};
use crate::engine::error::RuleViolation;

/// 退组计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeavePlan {
    /// 删除该成员
    RemoveMember,
    /// 删除组长，并将组长移交给 new_leader_id
    HandOffLeadership { new_leader_id: String },
    /// 最后一名成员，删除小组
    DissolveGroup,
}

// ==========================================
// MembershipRules - 成员规则引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct MembershipRules;

impl MembershipRules {
    pub fn new() -> Self {
        Self
    }

    /// 作业必须是分组类型
    pub fn ensure_group_assignment(&self, assignment: &Assignment) -> Result<(), RuleViolation> {
        if !assignment.assignment_type.is_group_type() {
            return Err(RuleViolation::AssignmentNotGroupType {
                assignment_id: assignment.assignment_id.clone(),
            });
        }
        Ok(())
    }

    /// 小组必须处于 FORMING
    pub fn ensure_forming(&self, group: &Group) -> Result<(), RuleViolation> {
        if !group.status.allows_membership_change() {
            return Err(RuleViolation::GroupLocked {
                group_id: group.group_id.clone(),
                status: group.status,
            });
        }
        Ok(())
    }

    /// 组队截止时间未过
    pub fn ensure_deadline_open(
        &self,
        config: &AssignmentConfig,
        now: DateTime<Utc>,
    ) -> Result<(), RuleViolation> {
        if config.deadline_passed(now) {
            let deadline = config
                .group_deadline
                .map(|d| d.to_rfc3339())
                .unwrap_or_default();
            return Err(RuleViolation::GroupDeadlinePassed { deadline });
        }
        Ok(())
    }

    /// 学生在该作业下尚未分组
    pub fn ensure_not_grouped(
        &self,
        student_id: &str,
        existing: Option<&GroupMember>,
    ) -> Result<(), RuleViolation> {
        if let Some(member) = existing {
            return Err(RuleViolation::AlreadyGrouped {
                student_id: student_id.to_string(),
                group_id: member.group_id.clone(),
            });
        }
        Ok(())
    }

    /// 容量检查: count >= max 时拒绝
    pub fn ensure_capacity(
        &self,
        group: &Group,
        count: u32,
        config: &AssignmentConfig,
    ) -> Result<(), RuleViolation> {
        if count >= config.max_size {
            return Err(RuleViolation::CapacityFull {
                group_id: group.group_id.clone(),
                count,
                max: config.max_size,
            });
        }
        Ok(())
    }

    /// 调用者必须是组长
    pub fn ensure_leader(&self, group: &Group, caller_id: &str) -> Result<(), RuleViolation> {
        if group.leader_id != caller_id {
            return Err(RuleViolation::NotLeader {
                group_id: group.group_id.clone(),
                caller_id: caller_id.to_string(),
            });
        }
        Ok(())
    }

    /// 加入小组（学生主动）
    ///
    /// 检查顺序: 状态 -> 截止 -> 已分组 -> 容量
    pub fn check_join(
        &self,
        group: &Group,
        config: &AssignmentConfig,
        student_id: &str,
        existing: Option<&GroupMember>,
        count: u32,
        now: DateTime<Utc>,
    ) -> Result<(), RuleViolation> {
        self.ensure_forming(group)?;
        self.ensure_deadline_open(config, now)?;
        self.ensure_not_grouped(student_id, existing)?;
        self.ensure_capacity(group, count, config)
    }

    /// 教师手动分配（不受组队截止时间限制）
    pub fn check_assign(
        &self,
        group: &Group,
        config: &AssignmentConfig,
        student_id: &str,
        existing: Option<&GroupMember>,
        count: u32,
    ) -> Result<(), RuleViolation> {
        self.ensure_forming(group)?;
        self.ensure_not_grouped(student_id, existing)?;
        self.ensure_capacity(group, count, config)
    }

    /// 规划退组
    ///
    /// `members` 为小组当前全部成员（按加入顺序）。
    /// 组长退出且仍有其他成员时，组长移交给剩余成员中最早加入者
    /// （joined_at 相同时按 member_seq）。
    pub fn plan_leave(
        &self,
        group: &Group,
        config: &AssignmentConfig,
        members: &[GroupMember],
        student_id: &str,
    ) -> Result<LeavePlan, RuleViolation> {
        if !config.allow_switch {
            return Err(RuleViolation::SwitchNotAllowed {
                assignment_id: group.assignment_id.clone(),
            });
        }
        self.ensure_forming(group)?;

        let leaving = members
            .iter()
            .find(|m| m.student_id == student_id)
            .ok_or_else(|| RuleViolation::NotAMember {
                group_id: group.group_id.clone(),
                student_id: student_id.to_string(),
            })?;

        if !leaving.is_leader() {
            return Ok(LeavePlan::RemoveMember);
        }

        match Self::successor(members, student_id) {
            Some(next) => Ok(LeavePlan::HandOffLeadership {
                new_leader_id: next.student_id.clone(),
            }),
            None => Ok(LeavePlan::DissolveGroup),
        }
    }

    /// 剩余成员中最早加入者
    pub fn successor<'m>(members: &'m [GroupMember], leaving_id: &str) -> Option<&'m GroupMember> {
        members
            .iter()
            .filter(|m| m.student_id != leaving_id)
            .min_by(|a, b| {
                a.joined_at
                    .cmp(&b.joined_at)
                    .then(a.member_seq.cmp(&b.member_seq))
            })
    }

    /// 组长移除成员
    pub fn check_remove(
        &self,
        group: &Group,
        caller_id: &str,
        target_id: &str,
        target: Option<&GroupMember>,
    ) -> Result<(), RuleViolation> {
        self.ensure_leader(group, caller_id)?;
        if caller_id == target_id {
            return Err(RuleViolation::SelfRemoval);
        }
        self.ensure_forming(group)?;
        if target.is_none() {
            return Err(RuleViolation::NotAMember {
                group_id: group.group_id.clone(),
                student_id: target_id.to_string(),
            });
        }
        Ok(())
    }

    /// 组长移交
    pub fn check_transfer(
        &self,
        group: &Group,
        caller_id: &str,
        new_leader_id: &str,
        target: Option<&GroupMember>,
    ) -> Result<(), RuleViolation> {
        self.ensure_leader(group, caller_id)?;
        self.ensure_forming(group)?;
        let target = target.ok_or_else(|| RuleViolation::NotAMember {
            group_id: group.group_id.clone(),
            student_id: new_leader_id.to_string(),
        })?;
        if target.is_leader() || new_leader_id == caller_id {
            return Err(RuleViolation::NoOpTransfer {
                student_id: new_leader_id.to_string(),
            });
        }
        Ok(())
    }

    /// 组长解散小组
    pub fn check_dissolve(&self, group: &Group, caller_id: &str) -> Result<(), RuleViolation> {
        self.ensure_leader(group, caller_id)?;
        self.ensure_forming(group)
    }
}
