// ==========================================
// 项目作业分组核心 - 小组消息 API
// ==========================================
// 职责: 小组内追加式消息日志
// 权限: 小组成员与任课教师可读写
// 轮询: list_since 以 message_id 为游标
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::api::access::{is_member, is_owner, load_group_context};
use crate::api::error::ApiResult;
use crate::api::validator::{normalize_message_content, page_window, require_id};
use crate::config::ConfigManager;
use crate::domain::message::{GroupMessage, NewGroupMessage};
use crate::engine::error::RuleViolation;
use crate::repository::{GroupMessageRepository, Store};

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<GroupMessage>,
    pub total: u32,
    pub page: u32,
    pub limit: u32,
}

// ==========================================
// MessageApi - 小组消息 API
// ==========================================
pub struct MessageApi {
    store: Store,
    config_manager: Arc<ConfigManager>,
}

impl MessageApi {
    pub fn new(store: Store, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            store,
            config_manager,
        }
    }

    /// 发送文本消息
    ///
    /// # 参数
    /// - group_id: 小组ID
    /// - sender_id: 发送者（成员或任课教师）
    /// - content: 消息内容（去首尾空白后非空，不超过 message.max_content_chars）
    #[instrument(skip(self, content))]
    pub fn post(&self, group_id: &str, sender_id: &str, content: &str) -> ApiResult<GroupMessage> {
        require_id("小组ID", group_id)?;
        require_id("发送者ID", sender_id)?;
        let settings = self.config_manager.group_settings()?;
        let content = normalize_message_content(content, settings.message_max_content_chars)?;
        let message = self.store.write(|tx| -> ApiResult<GroupMessage> {
            let at = Utc::now().naive_utc();
            ensure_participant(tx, group_id, sender_id)?;
            Ok(GroupMessageRepository::new(tx).append(&NewGroupMessage::text(
                group_id, sender_id, content, at,
            ))?)
        })?;

        info!(message_id = message.message_id, "小组消息已发送");
        Ok(message)
    }

    /// 分页读取消息（created_at 升序，page 从 1 开始）
    pub fn list(
        &self,
        group_id: &str,
        caller_id: &str,
        page: u32,
        limit: u32,
    ) -> ApiResult<MessagePage> {
        require_id("小组ID", group_id)?;
        require_id("调用者ID", caller_id)?;
        let settings = self.config_manager.group_settings()?;
        let (offset, limit) = page_window(page, limit, settings.message_max_page_limit)?;

        self.store.read(|conn| -> ApiResult<MessagePage> {
            ensure_participant(conn, group_id, caller_id)?;
            let messages = GroupMessageRepository::new(conn);
            Ok(MessagePage {
                messages: messages.list_page(group_id, offset, limit)?,
                total: messages.count_by_group(group_id)?,
                page,
                limit,
            })
        })
    }

    /// 读取 message_id 大于 after_id 的消息（轮询游标）
    pub fn list_since(
        &self,
        group_id: &str,
        caller_id: &str,
        after_id: i64,
        limit: u32,
    ) -> ApiResult<Vec<GroupMessage>> {
        require_id("小组ID", group_id)?;
        require_id("调用者ID", caller_id)?;
        let settings = self.config_manager.group_settings()?;
        let (_, limit) = page_window(1, limit, settings.message_max_page_limit)?;

        let messages = self.store.read(|conn| -> ApiResult<Vec<GroupMessage>> {
            ensure_participant(conn, group_id, caller_id)?;
            Ok(GroupMessageRepository::new(conn).list_after(group_id, after_id, limit)?)
        })?;
        debug!(group_id, after_id, fetched = messages.len(), "增量拉取消息");
        Ok(messages)
    }
}

/// 成员或任课教师，否则 NotAMember
fn ensure_participant(conn: &Connection, group_id: &str, caller_id: &str) -> ApiResult<()> {
    let (_, assignment) = load_group_context(conn, group_id)?;
    if is_member(conn, group_id, caller_id)? || is_owner(conn, &assignment, caller_id)? {
        return Ok(());
    }
    Err(RuleViolation::NotAMember {
        group_id: group_id.to_string(),
        student_id: caller_id.to_string(),
    }
    .into())
}
