//! SQL database abstraction trait.

/// Trait for SQL database backends.
///
/// Abstracts over PostgreSQL and SQLite by providing the pool type and the
/// query builders for each statement kind the catalog issues.
pub trait SqlDatabase: Send + Sync + 'static {
    /// The connection pool type for this database.
    type Pool: Clone + Send + Sync;

    fn build_select(stmt: sea_query::SelectStatement) -> String;

    fn build_insert(stmt: sea_query::InsertStatement) -> String;

    fn build_delete(stmt: sea_query::DeleteStatement) -> String;

    fn build_table_create(stmt: sea_query::TableCreateStatement) -> String;

    fn build_table_drop(stmt: sea_query::TableDropStatement) -> String;
}
