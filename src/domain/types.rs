// ==========================================
// 项目作业分组核心 - 领域类型定义
// ==========================================
// 小组状态 / 成员角色 / 消息类型 / 作业类型
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 小组状态 (Group Status)
// ==========================================
// 状态机: FORMING -> LOCKED (教师锁定, 单向)
//         FORMING -> SUBMITTED (组长提交, 单向)
// 不存在回到 FORMING 的迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
    Forming,   // 组建中（允许成员变更）
    Locked,    // 教师已锁定
    Submitted, // 已提交
}

impl GroupStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            GroupStatus::Forming => "FORMING",
            GroupStatus::Locked => "LOCKED",
            GroupStatus::Submitted => "SUBMITTED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "FORMING" => Some(GroupStatus::Forming),
            "LOCKED" => Some(GroupStatus::Locked),
            "SUBMITTED" => Some(GroupStatus::Submitted),
            _ => None,
        }
    }

    /// 是否允许成员变更
    pub fn allows_membership_change(&self) -> bool {
        matches!(self, GroupStatus::Forming)
    }

    /// 状态迁移是否合法
    pub fn can_transition_to(&self, next: GroupStatus) -> bool {
        matches!(
            (self, next),
            (GroupStatus::Forming, GroupStatus::Locked)
                | (GroupStatus::Forming, GroupStatus::Submitted)
                // 重新提交走 upsert，状态保持 SUBMITTED
                | (GroupStatus::Submitted, GroupStatus::Submitted)
        )
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 成员角色 (Member Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Leader,
    Member,
}

impl MemberRole {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MemberRole::Leader => "LEADER",
            MemberRole::Member => "MEMBER",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "LEADER" => Some(MemberRole::Leader),
            "MEMBER" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 消息类型 (Message Type)
// ==========================================
// SYSTEM 消息由生命周期操作自动产生，不可由用户发送
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Text,
    System,
}

impl MessageType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MessageType::Text => "TEXT",
            MessageType::System => "SYSTEM",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(MessageType::Text),
            "SYSTEM" => Some(MessageType::System),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 作业类型 (Assignment Type)
// ==========================================
// 只有 PROJECT 类作业支持分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentType {
    Project,
    Individual,
}

impl AssignmentType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssignmentType::Project => "PROJECT",
            AssignmentType::Individual => "INDIVIDUAL",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "PROJECT" => Some(AssignmentType::Project),
            "INDIVIDUAL" => Some(AssignmentType::Individual),
            _ => None,
        }
    }

    pub fn is_group_type(&self) -> bool {
        matches!(self, AssignmentType::Project)
    }
}

impl fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
