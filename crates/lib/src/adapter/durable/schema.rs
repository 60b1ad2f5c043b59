//! SQL schema for the durable store.
//!
//! The DDL is portable between SQLite and PostgreSQL; dialect-specific SQL
//! belongs in code here, not in migration files, so both backends stay in
//! lockstep.

use sqlx::AnyPool;

use crate::Result;

use super::SqlxResultExt;

/// SQL statements to create the schema tables.
///
/// Each statement uses portable SQL that works on both SQLite and PostgreSQL.
pub const CREATE_TABLES: &[&str] = &[
    // One row per identity. The full record is stored as JSON; id and email
    // are duplicated into indexed columns because they are the only lookup
    // keys. The UNIQUE constraint on email is what turns a racing duplicate
    // create into a clean conflict instead of a silent second row.
    "CREATE TABLE IF NOT EXISTS identities (
        id TEXT PRIMARY KEY NOT NULL,
        email TEXT NOT NULL UNIQUE,
        record_json TEXT NOT NULL
    )",
];

/// Create the schema if it does not exist yet.
pub async fn init(pool: &AnyPool) -> Result<()> {
    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_unavailable("Failed to initialize durable schema")?;
    }
    Ok(())
}
