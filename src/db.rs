// ==========================================
// 项目作业分组核心 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 / busy_timeout）
// - 统一建表脚本与 schema_version
// - 统一时间戳存储格式
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式（微秒精度，保证同一秒内的先后顺序可比较）
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启（成员/消息随小组级联删除依赖于此）
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// class / class_enrollment / assignment 由外部系统维护，这里建表只为本地运行与测试。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ===== 外部协作方（只读） =====
        CREATE TABLE IF NOT EXISTS class (
            class_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            teacher_id TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS class_enrollment (
            class_id TEXT NOT NULL REFERENCES class(class_id) ON DELETE CASCADE,
            student_id TEXT NOT NULL,
            enrolled_at TEXT NOT NULL,
            PRIMARY KEY (class_id, student_id)
        );

        CREATE TABLE IF NOT EXISTS assignment (
            assignment_id TEXT PRIMARY KEY,
            class_id TEXT NOT NULL REFERENCES class(class_id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            assignment_type TEXT NOT NULL,
            group_config TEXT NOT NULL DEFAULT ''
        );

        -- ===== 分组核心 =====
        CREATE TABLE IF NOT EXISTS study_group (
            group_id TEXT PRIMARY KEY,
            assignment_id TEXT NOT NULL REFERENCES assignment(assignment_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            invite_code TEXT NOT NULL UNIQUE,
            leader_id TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_study_group_assignment
            ON study_group(assignment_id, created_at);

        CREATE TABLE IF NOT EXISTS group_member (
            member_seq INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id TEXT NOT NULL REFERENCES study_group(group_id) ON DELETE CASCADE,
            assignment_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            role TEXT NOT NULL,
            joined_at TEXT NOT NULL,
            UNIQUE (group_id, student_id),
            UNIQUE (assignment_id, student_id)
        );
        -- 每组至多一名组长
        CREATE UNIQUE INDEX IF NOT EXISTS ux_group_member_leader
            ON group_member(group_id) WHERE role = 'LEADER';

        CREATE TABLE IF NOT EXISTS group_message (
            message_id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id TEXT NOT NULL REFERENCES study_group(group_id) ON DELETE CASCADE,
            sender_id TEXT NOT NULL,
            content TEXT NOT NULL,
            message_type TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_group_message_group
            ON group_message(group_id, created_at, message_id);

        CREATE TABLE IF NOT EXISTS submission (
            submission_id TEXT PRIMARY KEY,
            assignment_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            group_id TEXT NOT NULL,
            files_json TEXT NOT NULL,
            labor_division_json TEXT NOT NULL,
            submitted_by TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            UNIQUE (student_id, assignment_id)
        );
        CREATE INDEX IF NOT EXISTS idx_submission_group ON submission(group_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

// ==========================================
// 时间戳读写
// ==========================================

pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// 在 row 映射闭包中解析时间戳列
pub fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_timestamp_round_trip_keeps_micros() {
        let ts = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_micro_opt(8, 30, 15, 123_456)
            .unwrap();
        let raw = format_ts(&ts);
        assert_eq!(raw, "2026-03-01 08:30:15.123456");
        assert_eq!(parse_ts(0, &raw).unwrap(), ts);
        // 兼容秒精度
        assert!(parse_ts(0, "2026-03-01 08:30:15").is_ok());
        assert!(parse_ts(0, "not a time").is_err());
    }
}
