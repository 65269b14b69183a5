// ==========================================
// 项目作业分组核心 - 作业仓储（只读）
// ==========================================
// 作业元数据由外部系统维护；group_config JSON 在此解析为 AssignmentConfig
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};

use crate::config::AssignmentConfig;
use crate::domain::assignment::Assignment;
use crate::domain::types::AssignmentType;
use crate::repository::error::{RepositoryError, RepositoryResult};

pub struct AssignmentRepository<'c> {
    conn: &'c Connection,
}

impl<'c> AssignmentRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn find_by_id(&self, assignment_id: &str) -> RepositoryResult<Option<Assignment>> {
        let raw = self
            .conn
            .query_row(
                r#"SELECT assignment_id, class_id, title, assignment_type, group_config
                   FROM assignment WHERE assignment_id = ?1"#,
                params![assignment_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((assignment_id, class_id, title, type_raw, config_raw)) = raw else {
            return Ok(None);
        };

        let assignment_type =
            AssignmentType::from_db_str(&type_raw).ok_or_else(|| RepositoryError::FieldValueError {
                field: "assignment_type".to_string(),
                message: format!("未知作业类型: {}", type_raw),
            })?;

        let config = AssignmentConfig::from_json(&config_raw).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "group_config".to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Some(Assignment {
            assignment_id,
            class_id,
            title,
            assignment_type,
            config,
        }))
    }

    /// 按主键查询，不存在则返回 NotFound
    pub fn get(&self, assignment_id: &str) -> RepositoryResult<Assignment> {
        self.find_by_id(assignment_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Assignment".to_string(),
                id: assignment_id.to_string(),
            })
    }
}
