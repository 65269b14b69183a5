// ==========================================
// 项目作业分组核心 - 组内消息
// ==========================================
// 只追加日志；客户端轮询读取，message_id 作为游标
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::MessageType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMessage {
    pub message_id: i64,
    pub group_id: String,
    pub sender_id: String,
    pub content: String,
    pub message_type: MessageType,
    pub created_at: NaiveDateTime,
}

/// 待写入的消息（message_id 由数据库分配）
#[derive(Debug, Clone)]
pub struct NewGroupMessage {
    pub group_id: String,
    pub sender_id: String,
    pub content: String,
    pub message_type: MessageType,
    pub created_at: NaiveDateTime,
}

impl NewGroupMessage {
    pub fn system(group_id: &str, actor_id: &str, content: String, at: NaiveDateTime) -> Self {
        Self {
            group_id: group_id.to_string(),
            sender_id: actor_id.to_string(),
            content,
            message_type: MessageType::System,
            created_at: at,
        }
    }

    pub fn text(group_id: &str, sender_id: &str, content: String, at: NaiveDateTime) -> Self {
        Self {
            group_id: group_id.to_string(),
            sender_id: sender_id.to_string(),
            content,
            message_type: MessageType::Text,
            created_at: at,
        }
    }
}
