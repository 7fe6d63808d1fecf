//! Catalog schema definitions using sea-query.

use sea_query::{ColumnDef, Iden, Table, TableCreateStatement, TableDropStatement};

use crate::domain::AlertKind;

/// One table per alert kind.
#[derive(Iden, Clone, Copy)]
pub enum TaskTable {
    #[iden = "memory_tasks"]
    Memory,
    #[iden = "_5xx_tasks"]
    RateAnomaly,
    #[iden = "crashed_tasks"]
    Crashed,
    #[iden = "released_tasks"]
    Released,
}

impl TaskTable {
    pub fn for_kind(kind: AlertKind) -> Self {
        match kind {
            AlertKind::MemoryUsage => TaskTable::Memory,
            AlertKind::RateAnomaly => TaskTable::RateAnomaly,
            AlertKind::CrashEvent => TaskTable::Crashed,
            AlertKind::ReleaseEvent => TaskTable::Released,
        }
    }
}

#[derive(Iden, Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskColumn {
    #[iden = "id"]
    Id,
    #[iden = "app"]
    App,
    #[iden = "slack"]
    Slack,
    #[iden = "post"]
    Post,
    #[iden = "email"]
    Email,
    #[iden = "dynotype"]
    Dynotype,
    #[iden = "crit"]
    Crit,
    #[iden = "warn"]
    Warn,
    #[iden = "window"]
    Window,
    #[iden = "every"]
    Every,
    #[iden = "tolerance"]
    Tolerance,
    #[iden = "fqdn"]
    Fqdn,
}

const TARGET_COLUMNS: [TaskColumn; 3] = [TaskColumn::Slack, TaskColumn::Post, TaskColumn::Email];

/// Columns of a kind's table, in insert order.
pub fn columns(kind: AlertKind) -> Vec<TaskColumn> {
    let mut cols = vec![TaskColumn::Id, TaskColumn::App];
    match kind {
        AlertKind::MemoryUsage => cols.extend([
            TaskColumn::Dynotype,
            TaskColumn::Crit,
            TaskColumn::Warn,
            TaskColumn::Window,
            TaskColumn::Every,
        ]),
        AlertKind::RateAnomaly => cols.extend([TaskColumn::Tolerance, TaskColumn::Fqdn]),
        AlertKind::CrashEvent | AlertKind::ReleaseEvent => {}
    }
    cols.extend(TARGET_COLUMNS);
    cols
}

pub fn create_table(kind: AlertKind) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(TaskTable::for_kind(kind)).if_not_exists();

    for column in columns(kind) {
        let mut def = ColumnDef::new(column);
        match column {
            TaskColumn::Id => {
                def.text().not_null().primary_key();
            }
            TaskColumn::App if kind.is_singleton() => {
                def.text().not_null().unique_key();
            }
            TaskColumn::Crit | TaskColumn::Warn => {
                def.big_integer().not_null();
            }
            _ => {
                def.text().not_null().default("");
            }
        }
        stmt.col(&mut def);
    }
    stmt.to_owned()
}

pub fn drop_table(kind: AlertKind) -> TableDropStatement {
    Table::drop()
        .table(TaskTable::for_kind(kind))
        .if_exists()
        .to_owned()
}
