// ==========================================
// 项目作业分组核心 - 班级花名册仓储（只读）
// ==========================================
// 提供: 是否选课 / 班级归属教师 / 花名册（稳定顺序）
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::parse_ts;
use crate::domain::assignment::{ClassInfo, RosterEntry};
use crate::repository::error::RepositoryResult;

pub struct ClassRosterRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ClassRosterRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn find_class(&self, class_id: &str) -> RepositoryResult<Option<ClassInfo>> {
        let class = self
            .conn
            .query_row(
                "SELECT class_id, name, teacher_id FROM class WHERE class_id = ?1",
                params![class_id],
                |row| {
                    Ok(ClassInfo {
                        class_id: row.get(0)?,
                        name: row.get(1)?,
                        teacher_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(class)
    }

    pub fn is_enrolled(&self, student_id: &str, class_id: &str) -> RepositoryResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM class_enrollment WHERE class_id = ?1 AND student_id = ?2",
                params![class_id, student_id],
                |_row| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 班级花名册（按选课时间、学生ID排序）
    pub fn roster(&self, class_id: &str) -> RepositoryResult<Vec<RosterEntry>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT class_id, student_id, enrolled_at
               FROM class_enrollment
               WHERE class_id = ?1
               ORDER BY enrolled_at ASC, student_id ASC"#,
        )?;
        let entries = stmt
            .query_map(params![class_id], |row| {
                Ok(RosterEntry {
                    class_id: row.get(0)?,
                    student_id: row.get(1)?,
                    enrolled_at: parse_ts(2, &row.get::<_, String>(2)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    #[test]
    fn test_roster_order_and_enrollment() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO class (class_id, name, teacher_id) VALUES ('C1', '软件工程', 'T1');
            INSERT INTO class_enrollment (class_id, student_id, enrolled_at) VALUES
                ('C1', 'S3', '2026-02-01 08:00:00'),
                ('C1', 'S2', '2026-02-01 09:00:00'),
                ('C1', 'S1', '2026-02-01 09:00:00');
            "#,
        )
        .unwrap();

        let repo = ClassRosterRepository::new(&conn);
        let ids: Vec<String> = repo
            .roster("C1")
            .unwrap()
            .into_iter()
            .map(|e| e.student_id)
            .collect();
        assert_eq!(ids, vec!["S3", "S1", "S2"]);

        assert!(repo.is_enrolled("S1", "C1").unwrap());
        assert!(!repo.is_enrolled("S9", "C1").unwrap());
        assert_eq!(repo.find_class("C1").unwrap().unwrap().teacher_id, "T1");
        assert!(repo.find_class("C9").unwrap().is_none());
    }
}
