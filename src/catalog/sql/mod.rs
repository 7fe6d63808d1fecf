//! SQL catalog implementations.
//!
//! One implementation, parameterized by database type through the
//! `SqlDatabase` trait, serves PostgreSQL and SQLite.

mod catalog;
mod query;

pub use catalog::SqlCatalog;
pub use query::SqlDatabase;

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::{PostgresQueryBuilder, SchemaStatementBuilder};
    use sqlx::PgPool;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_delete(stmt: sea_query::DeleteStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_table_create(stmt: sea_query::TableCreateStatement) -> String {
            stmt.build(PostgresQueryBuilder)
        }

        fn build_table_drop(stmt: sea_query::TableDropStatement) -> String {
            stmt.build(PostgresQueryBuilder)
        }
    }

    /// PostgreSQL catalog.
    pub type PostgresCatalog = super::SqlCatalog<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sea_query::{SchemaStatementBuilder, SqliteQueryBuilder};
    use sqlx::SqlitePool;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_delete(stmt: sea_query::DeleteStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_table_create(stmt: sea_query::TableCreateStatement) -> String {
            stmt.build(SqliteQueryBuilder)
        }

        fn build_table_drop(stmt: sea_query::TableDropStatement) -> String {
            stmt.build(SqliteQueryBuilder)
        }
    }

    /// SQLite catalog.
    pub type SqliteCatalog = super::SqlCatalog<Sqlite>;
}
