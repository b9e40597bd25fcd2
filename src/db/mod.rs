//! Database side of the pipeline.
//!
//! The loader only sees the [`DatabaseConnection`] capability. Each backend is a
//! [`BackendConnection`] parameterized by its [`dialect::Dialect`] (placeholder syntax, connect
//! string), and talks to the database through a [`Driver`] binding registered in a
//! [`DriverRegistry`]. [`connect`] selects the backend from [`crate::types::DbType`].

mod connection;
pub mod dialect;
pub mod script;

pub use connection::{
    connect, BackendConnection, DatabaseConnection, Db2Connection, Driver, DriverFactory, DriverRegistry,
    InsertStatement, MySqlConnection, OracleConnection, PostgresConnection,
};
pub use script::ScriptDriver;
