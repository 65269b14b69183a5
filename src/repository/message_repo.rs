// ==========================================
// 项目作业分组核心 - 组内消息仓储
// ==========================================
// 只追加，无更新/删除接口（随小组解散级联删除）
// ==========================================

use rusqlite::{params, Connection, Row};

use crate::db::{format_ts, parse_ts};
use crate::domain::message::{GroupMessage, NewGroupMessage};
use crate::domain::types::MessageType;
use crate::repository::error::RepositoryResult;

const MESSAGE_COLUMNS: &str = "message_id, group_id, sender_id, content, message_type, created_at";

pub struct GroupMessageRepository<'c> {
    conn: &'c Connection,
}

impl<'c> GroupMessageRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 追加消息
    pub fn append(&self, message: &NewGroupMessage) -> RepositoryResult<GroupMessage> {
        self.conn.execute(
            r#"
            INSERT INTO group_message (group_id, sender_id, content, message_type, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                message.group_id,
                message.sender_id,
                message.content,
                message.message_type.to_db_str(),
                format_ts(&message.created_at),
            ],
        )?;

        Ok(GroupMessage {
            message_id: self.conn.last_insert_rowid(),
            group_id: message.group_id.clone(),
            sender_id: message.sender_id.clone(),
            content: message.content.clone(),
            message_type: message.message_type,
            created_at: message.created_at,
        })
    }

    /// 分页查询（created_at 升序）
    pub fn list_page(
        &self,
        group_id: &str,
        offset: u32,
        limit: u32,
    ) -> RepositoryResult<Vec<GroupMessage>> {
        let sql = format!(
            r#"SELECT {} FROM group_message
               WHERE group_id = ?1
               ORDER BY created_at ASC, message_id ASC
               LIMIT ?2 OFFSET ?3"#,
            MESSAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let messages = stmt
            .query_map(params![group_id, limit, offset], map_message)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// 游标查询：message_id 大于 after_id 的消息
    pub fn list_after(
        &self,
        group_id: &str,
        after_id: i64,
        limit: u32,
    ) -> RepositoryResult<Vec<GroupMessage>> {
        let sql = format!(
            r#"SELECT {} FROM group_message
               WHERE group_id = ?1 AND message_id > ?2
               ORDER BY message_id ASC
               LIMIT ?3"#,
            MESSAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let messages = stmt
            .query_map(params![group_id, after_id, limit], map_message)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    pub fn count_by_group(&self, group_id: &str) -> RepositoryResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM group_message WHERE group_id = ?1",
            params![group_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<GroupMessage> {
    let type_raw: String = row.get(4)?;
    let message_type = MessageType::from_db_str(&type_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("未知消息类型: {}", type_raw).into(),
        )
    })?;

    Ok(GroupMessage {
        message_id: row.get(0)?,
        group_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        message_type,
        created_at: parse_ts(5, &row.get::<_, String>(5)?)?,
    })
}
