// ==========================================
// 项目作业分组核心 - 提交记录仓储
// ==========================================
// 以 (student_id, assignment_id) 为键 upsert，重复提交覆盖上一版
// ==========================================

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{format_ts, parse_ts};
use crate::domain::submission::Submission;
use crate::repository::error::{RepositoryError, RepositoryResult};

const SUBMISSION_COLUMNS: &str = "submission_id, assignment_id, student_id, group_id, \
     files_json, labor_division_json, submitted_by, submitted_at";

pub struct SubmissionRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SubmissionRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 写入或覆盖提交记录
    ///
    /// 冲突时保留原 submission_id，其余字段更新
    pub fn upsert(&self, submission: &Submission) -> RepositoryResult<()> {
        let files_json = to_json("files", &submission.files)?;
        let labor_json = to_json("labor_division", &submission.labor_division)?;

        self.conn.execute(
            r#"
            INSERT INTO submission (
                submission_id, assignment_id, student_id, group_id,
                files_json, labor_division_json, submitted_by, submitted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (student_id, assignment_id) DO UPDATE SET
                group_id = excluded.group_id,
                files_json = excluded.files_json,
                labor_division_json = excluded.labor_division_json,
                submitted_by = excluded.submitted_by,
                submitted_at = excluded.submitted_at
            "#,
            params![
                submission.submission_id,
                submission.assignment_id,
                submission.student_id,
                submission.group_id,
                files_json,
                labor_json,
                submission.submitted_by,
                format_ts(&submission.submitted_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_student(
        &self,
        assignment_id: &str,
        student_id: &str,
    ) -> RepositoryResult<Option<Submission>> {
        let sql = format!(
            "SELECT {} FROM submission WHERE assignment_id = ?1 AND student_id = ?2",
            SUBMISSION_COLUMNS
        );
        let row = self
            .conn
            .query_row(&sql, params![assignment_id, student_id], map_submission)
            .optional()?;
        Ok(row)
    }

    /// 查询小组提交记录（按学生ID排序）
    pub fn find_by_group(&self, group_id: &str) -> RepositoryResult<Vec<Submission>> {
        let sql = format!(
            "SELECT {} FROM submission WHERE group_id = ?1 ORDER BY student_id ASC",
            SUBMISSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![group_id], map_submission)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn to_json<T: serde::Serialize>(field: &str, value: &T) -> RepositoryResult<String> {
    serde_json::to_string(value).map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn from_json_column<T: serde::de::DeserializeOwned>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_submission(row: &Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        submission_id: row.get(0)?,
        assignment_id: row.get(1)?,
        student_id: row.get(2)?,
        group_id: row.get(3)?,
        files: from_json_column(4, &row.get::<_, String>(4)?)?,
        labor_division: from_json_column(5, &row.get::<_, String>(5)?)?,
        submitted_by: row.get(6)?,
        submitted_at: parse_ts(7, &row.get::<_, String>(7)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::submission::{LaborDivisionEntry, SubmittedFile};
    use chrono::NaiveDate;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn make_submission(id: &str, student: &str, file: &str) -> Submission {
        Submission {
            submission_id: id.to_string(),
            assignment_id: "A1".to_string(),
            student_id: student.to_string(),
            group_id: "G1".to_string(),
            files: vec![SubmittedFile {
                file_name: file.to_string(),
                storage_key: format!("uploads/{}", file),
                size_bytes: 1024,
            }],
            labor_division: vec![LaborDivisionEntry {
                student_id: student.to_string(),
                task: "编码".to_string(),
                percentage: 100.0,
            }],
            submitted_by: "S1".to_string(),
            submitted_at: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_upsert_overwrites_and_keeps_id() {
        let conn = setup_test_db();
        let repo = SubmissionRepository::new(&conn);

        repo.upsert(&make_submission("SUB1", "S1", "v1.zip")).unwrap();
        repo.upsert(&make_submission("SUB2", "S1", "v2.zip")).unwrap();

        let found = repo.find_by_student("A1", "S1").unwrap().unwrap();
        assert_eq!(found.submission_id, "SUB1");
        assert_eq!(found.files[0].file_name, "v2.zip");
        assert_eq!(repo.find_by_group("G1").unwrap().len(), 1);
    }
}
