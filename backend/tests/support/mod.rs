//! Shared helpers for the embedded PostgreSQL integration suites.
//!
//! Each `tests/*.rs` file compiles as its own crate, so suites pull these in
//! with `mod support;` and use only what they need.
#![allow(dead_code)]

pub mod cluster;
mod cluster_skip;
pub mod embedded_postgres;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::provision_template_database;

/// Render a `postgres` error with its SQLSTATE and detail when present.
///
/// `postgres::Error`'s `Display` collapses server errors to `db error`.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };
    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}

/// Count rows in `table` matching the optional `filter` clause.
///
/// `table` and `filter` are fixed strings supplied by the suites.
pub fn count_rows(url: &str, table: &str, filter: &str) -> Result<i64, String> {
    let mut client = postgres::Client::connect(url, postgres::NoTls)
        .map_err(|err| format_postgres_error(&err))?;
    let sql = if filter.is_empty() {
        format!("SELECT count(*) FROM {table}")
    } else {
        format!("SELECT count(*) FROM {table} WHERE {filter}")
    };
    let row = client
        .query_one(sql.as_str(), &[])
        .map_err(|err| format_postgres_error(&err))?;
    Ok(row.get(0))
}

/// Account with an unusable credential, ready to insert.
pub fn stored_account(username: &str, email: Option<&str>) -> tsuki::domain::ports::StoredAccount {
    use tsuki::domain::credentials::PasswordHash;
    use tsuki::domain::{Email, User, UserId, Username};

    tsuki::domain::ports::StoredAccount {
        user: User {
            id: UserId::random(),
            username: Username::new(username).expect("fixture username is valid"),
            email: email.map(|raw| Email::new(raw).expect("fixture email is valid")),
            avatar: None,
            verified: false,
            created_at: chrono::Utc::now(),
        },
        password_hash: PasswordHash::from_stored("$argon2id$v=19$fixture"),
    }
}
