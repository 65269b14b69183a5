// ==========================================
// 项目作业分组核心 - 提交闸门
// ==========================================
// 规则:
// - 小组必须属于所声明的作业
// - 仅组长可提交
// - 当前人数 >= min_size
// - LOCKED 小组不可提交；SUBMITTED 小组可重复提交（upsert 覆盖）
// 分工百分比之和不在此校验，属于边界层策略
// ==========================================

use crate::config::AssignmentConfig;
use crate::domain::group::Group;
use crate::domain::types::GroupStatus;
use crate::engine::error::RuleViolation;

#[derive(Debug, Default, Clone, Copy)]
pub struct SubmissionGate;

impl SubmissionGate {
    pub fn new() -> Self {
        Self
    }

    pub fn check(
        &self,
        group: &Group,
        config: &AssignmentConfig,
        assignment_id: &str,
        caller_id: &str,
        member_count: u32,
    ) -> Result<(), RuleViolation> {
        if group.assignment_id != assignment_id {
            return Err(RuleViolation::AssignmentMismatch {
                group_assignment_id: group.assignment_id.clone(),
                requested_assignment_id: assignment_id.to_string(),
            });
        }
        if group.leader_id != caller_id {
            return Err(RuleViolation::NotLeader {
                group_id: group.group_id.clone(),
                caller_id: caller_id.to_string(),
            });
        }
        if !group.status.can_transition_to(GroupStatus::Submitted) {
            return Err(RuleViolation::GroupLocked {
                group_id: group.group_id.clone(),
                status: group.status,
            });
        }
        if member_count < config.min_size {
            return Err(RuleViolation::SizeBelowMinimum {
                count: member_count,
                min: config.min_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn group(status: GroupStatus) -> Group {
        Group {
            group_id: "G1".to_string(),
            assignment_id: "A1".to_string(),
            name: "一组".to_string(),
            invite_code: "SL-AAAA".to_string(),
            leader_id: "L".to_string(),
            status,
            created_at: NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    fn config() -> AssignmentConfig {
        AssignmentConfig {
            min_size: 2,
            max_size: 4,
            ..AssignmentConfig::default()
        }
    }

    #[test]
    fn test_gate_rules() {
        let gate = SubmissionGate::new();
        let forming = group(GroupStatus::Forming);

        assert!(matches!(
            gate.check(&forming, &config(), "A2", "L", 3),
            Err(RuleViolation::AssignmentMismatch { .. })
        ));
        assert!(matches!(
            gate.check(&forming, &config(), "A1", "M", 3),
            Err(RuleViolation::NotLeader { .. })
        ));
        assert!(matches!(
            gate.check(&forming, &config(), "A1", "L", 1),
            Err(RuleViolation::SizeBelowMinimum { count: 1, min: 2 })
        ));
        assert!(gate.check(&forming, &config(), "A1", "L", 2).is_ok());
    }

    #[test]
    fn test_locked_rejected_and_resubmission_allowed() {
        let gate = SubmissionGate::new();
        assert!(matches!(
            gate.check(&group(GroupStatus::Locked), &config(), "A1", "L", 3),
            Err(RuleViolation::GroupLocked { .. })
        ));
        assert!(gate
            .check(&group(GroupStatus::Submitted), &config(), "A1", "L", 3)
            .is_ok());
    }
}
