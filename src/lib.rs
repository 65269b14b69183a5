// ==========================================
// 项目作业分组核心 - 核心库
// ==========================================
// 职责: 课程项目作业的小组组建、成员管理、自动分组、小组提交与小组消息
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 作业配置与进程级参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AssignmentType, GroupStatus, MemberRole, MessageType};

// 领域实体
pub use domain::{
    Assignment, Capacity, ClassInfo, Group, GroupDetail, GroupMember, GroupMessage,
    LaborDivisionEntry, LeaveOutcome, RosterEntry, Submission, SubmittedFile,
};

// 配置
pub use config::{AssignmentConfig, UngroupedPolicy};

// 引擎
pub use engine::{AutoAssignmentEngine, InviteCodeIssuer, MembershipRules, SubmissionGate};

// API
pub use api::{ApiError, ApiResult, AutoAssignReport, ErrorKind, GroupApi, MessageApi, SubmissionApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "项目作业分组核心";
