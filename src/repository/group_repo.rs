// ==========================================
// 项目作业分组核心 - 小组仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责 study_group 表的数据映射
// 连接由调用方提供（事务内或只读连接），便于组成工作单元
// ==========================================

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{format_ts, parse_ts};
use crate::domain::group::Group;
use crate::domain::types::GroupStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};

const GROUP_COLUMNS: &str =
    "group_id, assignment_id, name, invite_code, leader_id, status, created_at";

// ==========================================
// GroupRepository - 小组仓储
// ==========================================
pub struct GroupRepository<'c> {
    conn: &'c Connection,
}

impl<'c> GroupRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 插入小组
    ///
    /// # 错误
    /// - `UniqueConstraintViolation("...study_group.invite_code")`: 邀请码冲突，调用方重新生成
    pub fn insert(&self, group: &Group) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO study_group (
                group_id, assignment_id, name, invite_code, leader_id, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                group.group_id,
                group.assignment_id,
                group.name,
                group.invite_code,
                group.leader_id,
                group.status.to_db_str(),
                format_ts(&group.created_at),
            ],
        )?;
        Ok(())
    }

    /// 按主键查询
    pub fn find_by_id(&self, group_id: &str) -> RepositoryResult<Option<Group>> {
        let sql = format!("SELECT {} FROM study_group WHERE group_id = ?1", GROUP_COLUMNS);
        let group = self
            .conn
            .query_row(&sql, params![group_id], map_group)
            .optional()?;
        Ok(group)
    }

    /// 按主键查询，不存在则返回 NotFound
    pub fn get(&self, group_id: &str) -> RepositoryResult<Group> {
        self.find_by_id(group_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Group".to_string(),
                id: group_id.to_string(),
            })
    }

    /// 按邀请码查询
    pub fn find_by_invite_code(&self, invite_code: &str) -> RepositoryResult<Option<Group>> {
        let sql = format!("SELECT {} FROM study_group WHERE invite_code = ?1", GROUP_COLUMNS);
        let group = self
            .conn
            .query_row(&sql, params![invite_code], map_group)
            .optional()?;
        Ok(group)
    }

    /// 查询作业下所有小组（按创建顺序）
    pub fn find_by_assignment(&self, assignment_id: &str) -> RepositoryResult<Vec<Group>> {
        let sql = format!(
            "SELECT {} FROM study_group WHERE assignment_id = ?1 ORDER BY created_at ASC, rowid ASC",
            GROUP_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let groups = stmt
            .query_map(params![assignment_id], map_group)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    /// 作业下小组数量
    pub fn count_by_assignment(&self, assignment_id: &str) -> RepositoryResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM study_group WHERE assignment_id = ?1",
            params![assignment_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    /// 更新组长
    pub fn update_leader(&self, group_id: &str, leader_id: &str) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            "UPDATE study_group SET leader_id = ?1 WHERE group_id = ?2",
            params![leader_id, group_id],
        )?;
        ensure_affected(rows, group_id)
    }

    /// 更新状态
    pub fn update_status(&self, group_id: &str, status: GroupStatus) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            "UPDATE study_group SET status = ?1 WHERE group_id = ?2",
            params![status.to_db_str(), group_id],
        )?;
        ensure_affected(rows, group_id)
    }

    /// 删除小组（成员与消息由外键级联删除）
    pub fn delete(&self, group_id: &str) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            "DELETE FROM study_group WHERE group_id = ?1",
            params![group_id],
        )?;
        ensure_affected(rows, group_id)
    }
}

fn ensure_affected(rows: usize, group_id: &str) -> RepositoryResult<()> {
    if rows == 0 {
        return Err(RepositoryError::NotFound {
            entity: "Group".to_string(),
            id: group_id.to_string(),
        });
    }
    Ok(())
}

fn map_group(row: &Row<'_>) -> rusqlite::Result<Group> {
    let status_raw: String = row.get(5)?;
    let status = GroupStatus::from_db_str(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("未知小组状态: {}", status_raw).into(),
        )
    })?;

    Ok(Group {
        group_id: row.get(0)?,
        assignment_id: row.get(1)?,
        name: row.get(2)?,
        invite_code: row.get(3)?,
        leader_id: row.get(4)?,
        status,
        created_at: parse_ts(6, &row.get::<_, String>(6)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO class (class_id, name, teacher_id) VALUES ('C1', '软件工程', 'T1');
            INSERT INTO assignment (assignment_id, class_id, title, assignment_type, group_config)
            VALUES ('A1', 'C1', '课程设计', 'PROJECT', '');
            "#,
        )
        .unwrap();
        conn
    }

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn make_group(id: &str, code: &str, offset_secs: i64) -> Group {
        Group {
            group_id: id.to_string(),
            assignment_id: "A1".to_string(),
            name: format!("小组{}", id),
            invite_code: code.to_string(),
            leader_id: "S1".to_string(),
            status: GroupStatus::Forming,
            created_at: base_time() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let conn = setup_test_db();
        let repo = GroupRepository::new(&conn);
        let group = make_group("G1", "SL-ABCD", 0);
        repo.insert(&group).unwrap();

        assert_eq!(repo.find_by_id("G1").unwrap(), Some(group.clone()));
        assert_eq!(repo.find_by_invite_code("SL-ABCD").unwrap(), Some(group));
        assert!(repo.find_by_id("missing").unwrap().is_none());
        assert!(matches!(
            repo.get("missing"),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_invite_code_is_unique_violation() {
        let conn = setup_test_db();
        let repo = GroupRepository::new(&conn);
        repo.insert(&make_group("G1", "SL-ABCD", 0)).unwrap();

        let err = repo.insert(&make_group("G2", "SL-ABCD", 1)).unwrap_err();
        assert!(err.is_unique_violation_on("invite_code"));
    }

    #[test]
    fn test_find_by_assignment_in_creation_order() {
        let conn = setup_test_db();
        let repo = GroupRepository::new(&conn);
        repo.insert(&make_group("G2", "SL-2222", 10)).unwrap();
        repo.insert(&make_group("G1", "SL-3333", 0)).unwrap();

        let ids: Vec<String> = repo
            .find_by_assignment("A1")
            .unwrap()
            .into_iter()
            .map(|g| g.group_id)
            .collect();
        assert_eq!(ids, vec!["G1", "G2"]);
        assert_eq!(repo.count_by_assignment("A1").unwrap(), 2);
    }

    #[test]
    fn test_update_status_and_delete() {
        let conn = setup_test_db();
        let repo = GroupRepository::new(&conn);
        repo.insert(&make_group("G1", "SL-ABCD", 0)).unwrap();

        repo.update_status("G1", GroupStatus::Locked).unwrap();
        repo.update_leader("G1", "S9").unwrap();
        let group = repo.get("G1").unwrap();
        assert_eq!(group.status, GroupStatus::Locked);
        assert_eq!(group.leader_id, "S9");

        repo.delete("G1").unwrap();
        assert!(repo.find_by_id("G1").unwrap().is_none());
        assert!(matches!(
            repo.update_status("G1", GroupStatus::Forming),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
