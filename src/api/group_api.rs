// ==========================================
// 项目作业分组核心 - 小组 API
// ==========================================
// 职责: 小组创建/查询、成员生命周期、教师操作
// 红线: 每个变更操作 = 一个 Store::write 事务（校验 + 写入 + 系统消息）
// 子模块:
// - registry: 创建与查询
// - membership: 加入/退出/移除/移交/解散
// - teacher_ops: 锁定/手动分配/自动分组
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::access::{
    add_member, emit_system, ensure_enrolled, ensure_owner, load_detail, load_group_context,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{normalize_group_name, require_id};
use crate::config::{ConfigManager, GroupSettings};
use crate::domain::assignment::RosterEntry;
use crate::domain::group::{Capacity, Group, GroupDetail, LeaveOutcome};
use crate::domain::types::{GroupStatus, MemberRole};
use crate::engine::auto_assign::{AutoAssignmentEngine, GroupSlot, SlotRef};
use crate::engine::invite_code::{InviteCodeIssuer, InviteCodeSource};
use crate::engine::membership::{LeavePlan, MembershipRules};
use crate::repository::{
    AssignmentRepository, ClassRosterRepository, GroupMemberRepository, GroupRepository, Store,
};

mod membership;
mod registry;
mod teacher_ops;

/// 自动分组结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAssignReport {
    /// 本次分配的学生数
    pub assigned_count: usize,
    /// 本次新建的小组ID（按创建顺序）
    pub new_group_ids: Vec<String>,
    /// 本次使用的目标人数
    pub target_size: u32,
    /// 人数低于 min_size 的新建小组
    pub undersized_group_ids: Vec<String>,
}

// ==========================================
// GroupApi - 小组 API
// ==========================================
pub struct GroupApi {
    store: Store,
    config_manager: Arc<ConfigManager>,
    invite_codes: Arc<dyn InviteCodeSource>,
    rules: MembershipRules,
    auto_assign_engine: AutoAssignmentEngine,
}

impl GroupApi {
    pub fn new(store: Store, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            store,
            config_manager,
            invite_codes: Arc::new(InviteCodeIssuer::new()),
            rules: MembershipRules::new(),
            auto_assign_engine: AutoAssignmentEngine::new(),
        }
    }

    /// 替换邀请码来源
    pub fn with_invite_code_source(mut self, source: Arc<dyn InviteCodeSource>) -> Self {
        self.invite_codes = source;
        self
    }

    /// 事务外读取进程级参数
    fn settings(&self) -> ApiResult<GroupSettings> {
        Ok(self.config_manager.group_settings()?)
    }

    /// 插入新小组，邀请码冲突时重新生成
    ///
    /// 仅 invite_code 唯一约束冲突会重试；其余错误直接返回。
    /// 连续 max_attempts 次冲突返回 InviteCodeExhausted
    fn insert_group_with_unique_code(
        &self,
        conn: &Connection,
        assignment_id: &str,
        name: &str,
        leader_id: &str,
        created_at: NaiveDateTime,
        max_attempts: u32,
    ) -> ApiResult<Group> {
        let groups = GroupRepository::new(conn);
        let group_id = Uuid::new_v4().to_string();

        for attempt in 1..=max_attempts {
            let group = Group {
                group_id: group_id.clone(),
                assignment_id: assignment_id.to_string(),
                name: name.to_string(),
                invite_code: self.invite_codes.next_code(),
                leader_id: leader_id.to_string(),
                status: GroupStatus::Forming,
                created_at,
            };
            match groups.insert(&group) {
                Ok(()) => return Ok(group),
                Err(e) if e.is_unique_violation_on("invite_code") => {
                    warn!(
                        attempt,
                        max_attempts,
                        invite_code = %group.invite_code,
                        "邀请码冲突，重新生成"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::InviteCodeExhausted {
            attempts: max_attempts,
        })
    }
}
