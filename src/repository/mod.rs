// ==========================================
// 项目作业分组核心 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 仓储借用调用方的连接/事务，由 Store::write 组成工作单元
// ==========================================

pub mod assignment_repo;
pub mod error;
pub mod group_repo;
pub mod member_repo;
pub mod message_repo;
pub mod roster_repo;
pub mod store;
pub mod submission_repo;

// 重导出核心仓储
pub use assignment_repo::AssignmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use group_repo::GroupRepository;
pub use member_repo::GroupMemberRepository;
pub use message_repo::GroupMessageRepository;
pub use roster_repo::ClassRosterRepository;
pub use store::Store;
pub use submission_repo::SubmissionRepository;
