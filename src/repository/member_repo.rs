// ==========================================
// 项目作业分组核心 - 成员关系仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束由表结构兜底:
// - UNIQUE(assignment_id, student_id): 同一作业一名学生只在一个小组
// - ux_group_member_leader: 每组至多一名 LEADER
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;

use crate::db::{format_ts, parse_ts};
use crate::domain::group::GroupMember;
use crate::domain::types::MemberRole;
use crate::repository::error::{RepositoryError, RepositoryResult};

const MEMBER_COLUMNS: &str = "member_seq, group_id, assignment_id, student_id, role, joined_at";

// ==========================================
// GroupMemberRepository - 成员仓储
// ==========================================
pub struct GroupMemberRepository<'c> {
    conn: &'c Connection,
}

impl<'c> GroupMemberRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 插入成员，返回 member_seq
    pub fn insert(
        &self,
        group_id: &str,
        assignment_id: &str,
        student_id: &str,
        role: MemberRole,
        joined_at: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO group_member (group_id, assignment_id, student_id, role, joined_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                group_id,
                assignment_id,
                student_id,
                role.to_db_str(),
                format_ts(&joined_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 查询小组成员（按加入顺序）
    pub fn find_by_group(&self, group_id: &str) -> RepositoryResult<Vec<GroupMember>> {
        let sql = format!(
            "SELECT {} FROM group_member WHERE group_id = ?1 ORDER BY joined_at ASC, member_seq ASC",
            MEMBER_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let members = stmt
            .query_map(params![group_id], map_member)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// 查询某学生在小组内的成员记录
    pub fn find_member(
        &self,
        group_id: &str,
        student_id: &str,
    ) -> RepositoryResult<Option<GroupMember>> {
        let sql = format!(
            "SELECT {} FROM group_member WHERE group_id = ?1 AND student_id = ?2",
            MEMBER_COLUMNS
        );
        let member = self
            .conn
            .query_row(&sql, params![group_id, student_id], map_member)
            .optional()?;
        Ok(member)
    }

    /// 查询学生在作业下的成员记录（跨该作业所有小组）
    pub fn find_for_student(
        &self,
        assignment_id: &str,
        student_id: &str,
    ) -> RepositoryResult<Option<GroupMember>> {
        let sql = format!(
            "SELECT {} FROM group_member WHERE assignment_id = ?1 AND student_id = ?2",
            MEMBER_COLUMNS
        );
        let member = self
            .conn
            .query_row(&sql, params![assignment_id, student_id], map_member)
            .optional()?;
        Ok(member)
    }

    /// 小组当前人数
    pub fn count_by_group(&self, group_id: &str) -> RepositoryResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM group_member WHERE group_id = ?1",
            params![group_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    /// 作业下所有已分组学生ID
    pub fn grouped_student_ids(&self, assignment_id: &str) -> RepositoryResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT student_id FROM group_member WHERE assignment_id = ?1")?;
        let ids = stmt
            .query_map(params![assignment_id], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    /// 更新角色
    pub fn update_role(
        &self,
        group_id: &str,
        student_id: &str,
        role: MemberRole,
    ) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            "UPDATE group_member SET role = ?1 WHERE group_id = ?2 AND student_id = ?3",
            params![role.to_db_str(), group_id, student_id],
        )?;
        ensure_affected(rows, group_id, student_id)
    }

    /// 删除成员
    pub fn delete(&self, group_id: &str, student_id: &str) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            "DELETE FROM group_member WHERE group_id = ?1 AND student_id = ?2",
            params![group_id, student_id],
        )?;
        ensure_affected(rows, group_id, student_id)
    }
}

fn ensure_affected(rows: usize, group_id: &str, student_id: &str) -> RepositoryResult<()> {
    if rows == 0 {
        return Err(RepositoryError::NotFound {
            entity: "GroupMember".to_string(),
            id: format!("{}/{}", group_id, student_id),
        });
    }
    Ok(())
}

fn map_member(row: &Row<'_>) -> rusqlite::Result<GroupMember> {
    let role_raw: String = row.get(4)?;
    let role = MemberRole::from_db_str(&role_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("未知成员角色: {}", role_raw).into(),
        )
    })?;

    Ok(GroupMember {
        member_seq: row.get(0)?,
        group_id: row.get(1)?,
        assignment_id: row.get(2)?,
        student_id: row.get(3)?,
        role,
        joined_at: parse_ts(5, &row.get::<_, String>(5)?)?,
    })
}
