//! Unified SQL Catalog implementation.
//!
//! Uses a macro to generate implementations for each SQL backend.

use std::marker::PhantomData;

use sea_query::SimpleExpr;

use super::SqlDatabase;
use crate::catalog::schema::{columns, TaskColumn};
use crate::catalog::CatalogRow;
use crate::domain::AlertKind;

/// SQL-based implementation of Catalog.
pub struct SqlCatalog<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlCatalog<DB> {
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

/// Values of a row in the column order of its kind's table.
fn insert_values(kind: AlertKind, row: &CatalogRow) -> Vec<SimpleExpr> {
    columns(kind)
        .into_iter()
        .map(|column| match column {
            TaskColumn::Id => row.id.clone().into(),
            TaskColumn::App => row.app.clone().into(),
            TaskColumn::Slack => row.slack.clone().into(),
            TaskColumn::Post => row.post.clone().into(),
            TaskColumn::Email => row.email.clone().into(),
            TaskColumn::Dynotype => row.dynotype.clone().unwrap_or_default().into(),
            TaskColumn::Crit => row.crit.unwrap_or_default().into(),
            TaskColumn::Warn => row.warn.unwrap_or_default().into(),
            TaskColumn::Window => row.window.clone().unwrap_or_default().into(),
            TaskColumn::Every => row.every.clone().unwrap_or_default().into(),
            TaskColumn::Tolerance => row.tolerance.clone().unwrap_or_default().into(),
            TaskColumn::Fqdn => row.fqdn.clone().unwrap_or_default().into(),
        })
        .collect()
}

fn read_row<R>(kind: AlertKind, row: &R) -> Result<CatalogRow, sqlx::Error>
where
    R: sqlx::Row,
    for<'a> &'a str: sqlx::ColumnIndex<R>,
    String: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    i64: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
{
    let present = columns(kind);
    let text = |column: TaskColumn, name: &str| -> Result<Option<String>, sqlx::Error> {
        if present.contains(&column) {
            row.try_get::<String, _>(name).map(Some)
        } else {
            Ok(None)
        }
    };
    let int = |column: TaskColumn, name: &str| -> Result<Option<i64>, sqlx::Error> {
        if present.contains(&column) {
            row.try_get::<i64, _>(name).map(Some)
        } else {
            Ok(None)
        }
    };

    Ok(CatalogRow {
        id: row.try_get("id")?,
        app: row.try_get("app")?,
        slack: row.try_get("slack")?,
        post: row.try_get("post")?,
        email: row.try_get("email")?,
        dynotype: text(TaskColumn::Dynotype, "dynotype")?,
        crit: int(TaskColumn::Crit, "crit")?,
        warn: int(TaskColumn::Warn, "warn")?,
        window: text(TaskColumn::Window, "window")?,
        every: text(TaskColumn::Every, "every")?,
        tolerance: text(TaskColumn::Tolerance, "tolerance")?,
        fqdn: text(TaskColumn::Fqdn, "fqdn")?,
    })
}

/// Macro to implement Catalog for a specific SQL backend.
macro_rules! impl_catalog {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::catalog::Catalog for SqlCatalog<$db_type> {
            async fn init(&self) -> crate::catalog::Result<()> {
                use crate::catalog::schema::create_table;

                for kind in AlertKind::ALL {
                    let sql = <$db_type>::build_table_create(create_table(kind));
                    sqlx::query(&sql).execute(&self.pool).await?;
                }
                Ok(())
            }

            async fn reset(&self) -> crate::catalog::Result<()> {
                use crate::catalog::schema::drop_table;

                for kind in AlertKind::ALL {
                    let sql = <$db_type>::build_table_drop(drop_table(kind));
                    sqlx::query(&sql).execute(&self.pool).await?;
                }
                tracing::info!("Catalog tables recreated");
                self.init().await
            }

            async fn find(
                &self,
                kind: AlertKind,
                id: &crate::domain::TaskId,
            ) -> crate::catalog::Result<Option<crate::catalog::StoredTask>> {
                use sea_query::{Expr, Query};

                use crate::catalog::schema::TaskTable;

                let stmt = Query::select()
                    .columns(columns(kind))
                    .from(TaskTable::for_kind(kind))
                    .and_where(Expr::col(TaskColumn::Id).eq(id.as_str()))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                match row {
                    Some(row) => Ok(Some(read_row(kind, &row)?.into_task(kind)?)),
                    None => Ok(None),
                }
            }

            async fn list(
                &self,
                kind: AlertKind,
                app: Option<&str>,
            ) -> crate::catalog::Result<Vec<crate::catalog::StoredTask>> {
                use sea_query::{Expr, Order, Query};

                use crate::catalog::schema::TaskTable;

                let mut stmt = Query::select();
                stmt.columns(columns(kind))
                    .from(TaskTable::for_kind(kind))
                    .order_by(TaskColumn::App, Order::Asc)
                    .order_by(TaskColumn::Id, Order::Asc);
                if let Some(app) = app {
                    stmt.and_where(Expr::col(TaskColumn::App).eq(app));
                }

                let sql = <$db_type>::build_select(stmt.to_owned());
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

                rows.iter()
                    .map(|row| read_row(kind, row)?.into_task(kind))
                    .collect()
            }

            async fn insert(
                &self,
                task: &crate::catalog::StoredTask,
            ) -> crate::catalog::Result<()> {
                use sea_query::Query;

                use crate::catalog::schema::TaskTable;

                let kind = task.kind();
                let row = CatalogRow::from_task(task);
                let stmt = Query::insert()
                    .into_table(TaskTable::for_kind(kind))
                    .columns(columns(kind))
                    .values_panic(insert_values(kind, &row))
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql).execute(&self.pool).await?;

                Ok(())
            }

            async fn remove(
                &self,
                kind: AlertKind,
                id: &crate::domain::TaskId,
            ) -> crate::catalog::Result<bool> {
                use sea_query::{Expr, Query};

                use crate::catalog::schema::TaskTable;

                let stmt = Query::delete()
                    .from_table(TaskTable::for_kind(kind))
                    .and_where(Expr::col(TaskColumn::Id).eq(id.as_str()))
                    .to_owned();

                let sql = <$db_type>::build_delete(stmt);
                let result = sqlx::query(&sql).execute(&self.pool).await?;

                Ok(result.rows_affected() > 0)
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_catalog!(super::postgres::Postgres, "postgres");
impl_catalog!(super::sqlite::Sqlite, "sqlite");
