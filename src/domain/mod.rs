// ==========================================
// 项目作业分组核心 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含规则逻辑
// ==========================================

pub mod assignment;
pub mod group;
pub mod message;
pub mod submission;
pub mod types;

// 重导出核心类型
pub use assignment::{Assignment, ClassInfo, RosterEntry};
pub use group::{Capacity, Group, GroupDetail, GroupMember, LeaveOutcome};
pub use message::{GroupMessage, NewGroupMessage};
pub use submission::{LaborDivisionEntry, Submission, SubmittedFile};
pub use types::{AssignmentType, GroupStatus, MemberRole, MessageType};
