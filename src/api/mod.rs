// ==========================================
// 项目作业分组核心 - API 层
// ==========================================
// 职责: 用例入口；校验输入、事务内加载状态、调用引擎、落库
// ==========================================

pub(crate) mod access;
pub mod error;
pub mod group_api;
pub mod message_api;
pub mod submission_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ErrorKind};
pub use group_api::{AutoAssignReport, GroupApi};
pub use message_api::{MessageApi, MessagePage};
pub use submission_api::SubmissionApi;
