// ==========================================
// 项目作业分组核心 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎
// 红线: Engine 不拼 SQL, 所有规则违反必须带原因
// ==========================================

pub mod auto_assign;
pub mod error;
pub mod invite_code;
pub mod membership;
pub mod submission_gate;

// 重导出核心引擎
pub use auto_assign::{AutoAssignPlan, AutoAssignmentEngine, GroupSlot, Placement, SlotRef};
pub use error::RuleViolation;
pub use invite_code::{InviteCodeIssuer, InviteCodeSource};
pub use membership::{LeavePlan, MembershipRules};
pub use submission_gate::SubmissionGate;
