// ==========================================
// 项目作业分组核心 - 小组领域模型
// ==========================================
// 不变量:
// - 有成员的小组恰好有一名 LEADER，且 leader_id 等于该成员 student_id
// - 成员数为 0 的小组不存在（删除而不是保留空壳）
// - 同一作业下，一名学生最多属于一个小组
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{GroupStatus, MemberRole};

// ==========================================
// Group - 小组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub group_id: String,
    pub assignment_id: String,
    pub name: String,
    pub invite_code: String,       // 全局唯一, 格式 SL-XXXX
    pub leader_id: String,         // 始终等于 LEADER 成员的 student_id
    pub status: GroupStatus,
    pub created_at: NaiveDateTime,
}

// ==========================================
// GroupMember - 成员关系
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub member_seq: i64,           // 自增序号, joined_at 相同时的先后判定
    pub group_id: String,
    pub assignment_id: String,
    pub student_id: String,
    pub role: MemberRole,
    pub joined_at: NaiveDateTime,
}

impl GroupMember {
    pub fn is_leader(&self) -> bool {
        self.role == MemberRole::Leader
    }
}

// ==========================================
// Capacity - 容量
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub count: u32,
    pub max: u32,
}

impl Capacity {
    pub fn is_full(&self) -> bool {
        self.count >= self.max
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.count)
    }
}

// ==========================================
// GroupDetail - 小组详情（小组 + 成员 + 容量）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDetail {
    pub group: Group,
    pub members: Vec<GroupMember>, // 按加入顺序
    pub capacity: Capacity,
}

impl GroupDetail {
    pub fn leader(&self) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.is_leader())
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.student_id.clone()).collect()
    }
}

// ==========================================
// LeaveOutcome - 退组结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveOutcome {
    /// 普通成员退出
    Left,
    /// 组长退出，组长身份移交给最早加入的成员
    LeadershipHandedOff { new_leader_id: String },
    /// 最后一名成员退出，小组解散
    Dissolved,
}
