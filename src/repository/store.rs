// ==========================================
// 项目作业分组核心 - 存储与工作单元
// ==========================================
// 约束:
// - 所有成员变更操作在一个 IMMEDIATE 事务内完成"校验 + 写入"
// - IMMEDIATE 在首次读取前就拿到 SQLite 写锁，其他连接的并发写入会排队
// - 读取在 DEFERRED 事务内完成，多条查询看到同一快照
// - 进程内共享连接由 Mutex 串行化
// - 闭包返回 Err 时事务随 drop 回滚，不留下部分写入
// ==========================================

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 共享数据库存储
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// 打开数据库文件
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 底层共享连接
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 只读访问
    ///
    /// 多条 SELECT 在同一个 DEFERRED 事务内执行，读到的是同一快照，
    /// 其他连接的提交不会在两次查询之间插入
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let out = f(&tx)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(out)
    }

    /// 写事务（工作单元）
    ///
    /// 闭包成功则提交；闭包失败则回滚并原样返回错误。
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let out = f(&tx)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(out)
    }
}
