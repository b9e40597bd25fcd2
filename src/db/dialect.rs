//! SQL dialects of the supported backends.

use crate::types::{ConnectionConfig, DbType};

/// Backend-specific statement and address rendering.
pub trait Dialect: Send + Sync + 'static {
    const DB_TYPE: DbType;

    /// Bind placeholder for the 1-based parameter `index`.
    fn placeholder(index: usize) -> String;

    /// Driver address for `config`. Never contains the password.
    fn connect_target(config: &ConnectionConfig) -> String;

    fn insert_statement(table: &str, columns: &[String]) -> String {
        let placeholders: Vec<String> = (1..=columns.len()).map(Self::placeholder).collect();
        format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        )
    }

    fn truncate_statement(table: &str) -> String {
        format!("TRUNCATE TABLE {table}")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Oracle;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

#[derive(Debug, Clone, Copy, Default)]
pub struct Db2;

impl Dialect for Oracle {
    const DB_TYPE: DbType = DbType::Oracle;

    fn placeholder(index: usize) -> String {
        format!(":{index}")
    }

    /// Easy Connect string: `host:port/service`.
    fn connect_target(config: &ConnectionConfig) -> String {
        format!("{}:{}/{}", config.host, config.resolved_port(), config.db_name)
    }
}

impl Dialect for MySql {
    const DB_TYPE: DbType = DbType::MySql;

    fn placeholder(_index: usize) -> String {
        "?".to_string()
    }

    fn connect_target(config: &ConnectionConfig) -> String {
        format!(
            "mysql://{}@{}:{}/{}",
            config.user,
            config.host,
            config.resolved_port(),
            config.db_name
        )
    }
}

impl Dialect for Postgres {
    const DB_TYPE: DbType = DbType::Postgres;

    fn placeholder(index: usize) -> String {
        format!("${index}")
    }

    /// libpq keyword/value string with every value single-quoted.
    fn connect_target(config: &ConnectionConfig) -> String {
        format!(
            "user={} host={} port={} dbname={}",
            libpq_value(&config.user),
            libpq_value(&config.host),
            config.resolved_port(),
            libpq_value(&config.db_name)
        )
    }
}

/// Quote a libpq connection value; `\` and `'` are backslash-escaped.
fn libpq_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if matches!(c, '\'' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

impl Dialect for Db2 {
    const DB_TYPE: DbType = DbType::Db2;

    fn placeholder(_index: usize) -> String {
        "?".to_string()
    }

    /// CLI connection string; the driver appends `PWD=...;`.
    fn connect_target(config: &ConnectionConfig) -> String {
        format!(
            "DATABASE={};HOSTNAME={};PORT={};PROTOCOL=TCPIP;UID={};",
            config.db_name,
            config.host,
            config.resolved_port(),
            config.user
        )
    }

    // DB2 only accepts TRUNCATE with IMMEDIATE.
    fn truncate_statement(table: &str) -> String {
        format!("TRUNCATE TABLE {table} IMMEDIATE")
    }
}
