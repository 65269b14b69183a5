// ==========================================
// 项目作业分组核心 - 自动分组引擎
// ==========================================
// 输入: 现有小组（按创建顺序）+ 未分组学生（花名册顺序）+ 目标人数
// 输出: 分配计划（落库由 API 层在同一事务内完成）
// 规则:
// 1) 游标从第一个现有小组开始；非 FORMING 或已达目标人数的小组跳过
// 2) 游标所在小组未满则加入为 MEMBER；游标越过末尾则新建小组，该学生为 LEADER
// 3) 插入后达到目标人数，游标前进
// 只向前填充，不重新平衡；末尾新组可能低于 min_size（保留该行为并上报）
// ==========================================

use tracing::instrument;

use crate::domain::types::{GroupStatus, MemberRole};

/// 现有小组快照
#[derive(Debug, Clone)]
pub struct GroupSlot {
    pub group_id: String,
    pub status: GroupStatus,
    pub member_count: u32,
}

/// 分配目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRef {
    /// 现有小组
    Existing(String),
    /// 本次新建的第 n 个小组（从 0 开始）
    New(usize),
}

/// 单个学生的分配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub student_id: String,
    pub slot: SlotRef,
    pub role: MemberRole,
}

/// 分配计划
#[derive(Debug, Clone, Default)]
pub struct AutoAssignPlan {
    pub target_size: u32,
    pub placements: Vec<Placement>,
    /// 新建小组的最终人数，下标与 SlotRef::New 对应
    pub new_group_sizes: Vec<u32>,
}

impl AutoAssignPlan {
    pub fn assigned_count(&self) -> usize {
        self.placements.len()
    }

    pub fn new_group_count(&self) -> usize {
        self.new_group_sizes.len()
    }

    /// 人数低于 min_size 的新建小组下标
    pub fn undersized_new_groups(&self, min_size: u32) -> Vec<usize> {
        self.new_group_sizes
            .iter()
            .enumerate()
            .filter(|(_, &size)| size < min_size)
            .map(|(idx, _)| idx)
            .collect()
    }
}

struct Cursor {
    slot: SlotRef,
    count: u32,
    open: bool,
}

// ==========================================
// AutoAssignmentEngine - 自动分组引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoAssignmentEngine;

impl AutoAssignmentEngine {
    pub fn new() -> Self {
        Self
    }

    /// 生成分配计划
    ///
    /// `target_size` 由调用方按 clamp(preferred 或 max, min, max) 计算，必须 >= 1
    #[instrument(skip(self, existing, unassigned), fields(
        existing_groups = existing.len(),
        unassigned = unassigned.len()
    ))]
    pub fn plan(
        &self,
        existing: &[GroupSlot],
        unassigned: &[String],
        target_size: u32,
    ) -> AutoAssignPlan {
        let target_size = target_size.max(1);
        let mut plan = AutoAssignPlan {
            target_size,
            ..AutoAssignPlan::default()
        };

        let mut slots: Vec<Cursor> = existing
            .iter()
            .map(|g| Cursor {
                slot: SlotRef::Existing(g.group_id.clone()),
                count: g.member_count,
                open: g.status == GroupStatus::Forming,
            })
            .collect();
        let mut cursor = 0usize;

        for student_id in unassigned {
            while cursor < slots.len()
                && !(slots[cursor].open && slots[cursor].count < target_size)
            {
                cursor += 1;
            }

            let role = if cursor == slots.len() {
                let idx = plan.new_group_sizes.len();
                plan.new_group_sizes.push(0);
                slots.push(Cursor {
                    slot: SlotRef::New(idx),
                    count: 0,
                    open: true,
                });
                MemberRole::Leader
            } else {
                MemberRole::Member
            };

            let current = &mut slots[cursor];
            current.count += 1;
            if let SlotRef::New(idx) = current.slot {
                plan.new_group_sizes[idx] = current.count;
            }
            plan.placements.push(Placement {
                student_id: student_id.clone(),
                slot: current.slot.clone(),
                role,
            });

            if current.count >= target_size {
                cursor += 1;
            }
        }

        tracing::debug!(
            assigned = plan.assigned_count(),
            new_groups = plan.new_group_count(),
            "自动分组计划生成完成"
        );
        plan
    }

    /// 现有小组相对目标人数的空余容量
    pub fn free_capacity(existing: &[GroupSlot], target_size: u32) -> u32 {
        existing
            .iter()
            .filter(|g| g.status == GroupStatus::Forming)
            .map(|g| target_size.saturating_sub(g.member_count))
            .sum()
    }
}
