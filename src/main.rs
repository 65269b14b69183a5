// ==========================================
// 项目作业分组核心 - 命令行入口
// ==========================================
// 用法:
//   group-formation                     初始化数据库并输出配置快照
//   group-formation config-get <key>    读取进程级配置
//   group-formation config-set <key> <value>
// 数据库路径: GROUP_FORMATION_DB 或用户数据目录
// ==========================================

use anyhow::{anyhow, Context};

use group_formation::app::{get_default_db_path, AppState};
use group_formation::db::read_schema_version;
use group_formation::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", group_formation::APP_NAME, group_formation::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    let schema_version = state
        .store
        .read(|conn| read_schema_version(conn).map_err(group_formation::repository::RepositoryError::from))
        .context("读取 schema_version 失败")?;
    tracing::info!(?schema_version, db_path = %state.db_path, "数据库就绪");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] => {
            println!("{}", state.config_manager.get_config_snapshot()?);
        }
        ["config-get", key] => match state.config_manager.get_value(key)? {
            Some(value) => println!("{}", value),
            None => println!("(未设置，使用默认值)"),
        },
        ["config-set", key, value] => {
            state.config_manager.set_value(key, value)?;
            println!("{} = {}", key, value);
        }
        other => {
            return Err(anyhow!("未知命令: {}", other.join(" ")));
        }
    }

    Ok(())
}
