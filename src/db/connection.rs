use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::error::{ConnectionError, DatabaseError, DriverError};
use crate::types::{ConnectionConfig, DbType, Record};

use super::dialect::{Db2, Dialect, MySql, Oracle, Postgres};

/// A rendered insert statement handed to a [`Driver`].
#[derive(Debug, Clone, Copy)]
pub struct InsertStatement<'a> {
    /// Parameterized SQL in the backend's placeholder syntax.
    pub sql: &'a str,
    pub table: &'a str,
    pub columns: &'a [String],
}

/// Client library binding for one backend (the wire protocol lives behind this trait).
pub trait Driver: Send {
    /// Execute `stmt` once per row as a single batched call. Returns the affected row count.
    fn execute_many(&mut self, stmt: &InsertStatement<'_>, rows: &[Record]) -> Result<u64, DriverError>;

    /// Execute a parameterless statement.
    fn execute(&mut self, sql: &str) -> Result<u64, DriverError>;

    fn commit(&mut self) -> Result<(), DriverError>;

    fn close(&mut self) -> Result<(), DriverError>;
}

/// Capability the loader writes through.
///
/// Owned by the caller and reused serially across files; the loader never commits or closes it.
pub trait DatabaseConnection: Send {
    fn db_type(&self) -> DbType;

    /// Insert `rows` into `table`, binding fields positionally to `columns`.
    ///
    /// An empty `rows` slice is a no-op.
    fn execute_batch(&mut self, table: &str, columns: &[String], rows: &[Record]) -> Result<u64, DatabaseError>;

    fn truncate(&mut self, table: &str) -> Result<(), DatabaseError>;

    fn commit(&mut self) -> Result<(), DatabaseError>;

    /// Release the connection. Further calls fail with [`DatabaseError::Closed`].
    fn close(&mut self) -> Result<(), DatabaseError>;
}

/// [`DatabaseConnection`] for the backend described by dialect `D`.
pub struct BackendConnection<D: Dialect> {
    driver: Option<Box<dyn Driver>>,
    target: String,
    // Cached for the most recent (table, columns) pair; files of one load share it.
    insert_sql: Option<(String, Vec<String>, String)>,
    _dialect: PhantomData<D>,
}

pub type OracleConnection = BackendConnection<Oracle>;
pub type MySqlConnection = BackendConnection<MySql>;
pub type PostgresConnection = BackendConnection<Postgres>;
pub type Db2Connection = BackendConnection<Db2>;

impl<D: Dialect> BackendConnection<D> {
    /// Wrap an already connected driver.
    pub fn new(driver: Box<dyn Driver>, target: impl Into<String>) -> Self {
        Self {
            driver: Some(driver),
            target: target.into(),
            insert_sql: None,
            _dialect: PhantomData,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn driver(&mut self) -> Result<&mut Box<dyn Driver>, DatabaseError> {
        self.driver.as_mut().ok_or(DatabaseError::Closed)
    }

    fn insert_sql(&mut self, table: &str, columns: &[String]) -> String {
        match &self.insert_sql {
            Some((t, c, sql)) if t == table && c.as_slice() == columns => sql.clone(),
            _ => {
                let sql = D::insert_statement(table, columns);
                self.insert_sql = Some((table.to_string(), columns.to_vec(), sql.clone()));
                sql
            }
        }
    }
}

impl<D: Dialect> fmt::Debug for BackendConnection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConnection")
            .field("db_type", &D::DB_TYPE)
            .field("target", &self.target)
            .field("open", &self.driver.is_some())
            .finish()
    }
}

impl<D: Dialect> DatabaseConnection for BackendConnection<D> {
    fn db_type(&self) -> DbType {
        D::DB_TYPE
    }

    fn execute_batch(&mut self, table: &str, columns: &[String], rows: &[Record]) -> Result<u64, DatabaseError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let sql = self.insert_sql(table, columns);
        let stmt = InsertStatement {
            sql: &sql,
            table,
            columns,
        };
        debug!(db = %D::DB_TYPE, %sql, rows = rows.len(), "executing batch");
        self.driver()?
            .execute_many(&stmt, rows)
            .map_err(|source| DatabaseError::Driver {
                table: table.to_string(),
                statement: sql.clone(),
                source,
            })
    }

    fn truncate(&mut self, table: &str) -> Result<(), DatabaseError> {
        let sql = D::truncate_statement(table);
        debug!(db = %D::DB_TYPE, %sql, "truncating table");
        self.driver()?
            .execute(&sql)
            .map(|_| ())
            .map_err(|source| DatabaseError::Driver {
                table: table.to_string(),
                statement: sql.clone(),
                source,
            })
    }

    fn commit(&mut self) -> Result<(), DatabaseError> {
        self.driver()?.commit().map_err(DatabaseError::Commit)
    }

    fn close(&mut self) -> Result<(), DatabaseError> {
        match self.driver.take() {
            Some(mut driver) => driver.close().map_err(DatabaseError::Close),
            None => Ok(()),
        }
    }
}

/// Builds a connected [`Driver`] from the configuration and the dialect's connect target.
pub type DriverFactory =
    Box<dyn Fn(&ConnectionConfig, &str) -> Result<Box<dyn Driver>, DriverError> + Send + Sync>;

/// Driver bindings available to [`connect`], keyed by backend.
#[derive(Default)]
pub struct DriverRegistry {
    factories: HashMap<DbType, DriverFactory>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the driver factory of `db_type`.
    pub fn register<F>(&mut self, db_type: DbType, factory: F) -> &mut Self
    where
        F: Fn(&ConnectionConfig, &str) -> Result<Box<dyn Driver>, DriverError> + Send + Sync + 'static,
    {
        self.factories.insert(db_type, Box::new(factory));
        self
    }

    /// Builder-style [`Self::register`].
    pub fn with<F>(mut self, db_type: DbType, factory: F) -> Self
    where
        F: Fn(&ConnectionConfig, &str) -> Result<Box<dyn Driver>, DriverError> + Send + Sync + 'static,
    {
        self.register(db_type, factory);
        self
    }

    pub fn is_registered(&self, db_type: DbType) -> bool {
        self.factories.contains_key(&db_type)
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<_> = self.factories.keys().map(|t| t.tag()).collect();
        registered.sort_unstable();
        f.debug_struct("DriverRegistry")
            .field("registered", &registered)
            .finish()
    }
}

/// Connect to the backend named by `config.db_type`.
///
/// Fails with [`ConnectionError::DriverUnavailable`] when no driver is registered for the
/// backend, and [`ConnectionError::Rejected`] when the driver refuses the connection.
pub fn connect(
    config: &ConnectionConfig,
    registry: &DriverRegistry,
) -> Result<Box<dyn DatabaseConnection>, ConnectionError> {
    match config.db_type {
        DbType::Oracle => open::<Oracle>(config, registry),
        DbType::MySql => open::<MySql>(config, registry),
        DbType::Postgres => open::<Postgres>(config, registry),
        DbType::Db2 => open::<Db2>(config, registry),
    }
}

fn open<D: Dialect>(
    config: &ConnectionConfig,
    registry: &DriverRegistry,
) -> Result<Box<dyn DatabaseConnection>, ConnectionError> {
    let factory = registry
        .factories
        .get(&D::DB_TYPE)
        .ok_or(ConnectionError::DriverUnavailable(D::DB_TYPE))?;
    let target = D::connect_target(config);
    debug!(db = %D::DB_TYPE, %target, "connecting");
    let driver = factory(config, &target).map_err(|source| ConnectionError::Rejected {
        db_type: D::DB_TYPE,
        target: target.clone(),
        source,
    })?;
    Ok(Box::new(BackendConnection::<D>::new(driver, target)))
}
