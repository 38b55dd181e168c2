//! Connection identity types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database backends the service can introspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Mysql,
    Mssql,
    Postgresql,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Mysql => "mysql",
            Backend::Mssql => "mssql",
            Backend::Postgresql => "postgresql",
        }
    }

    /// Port used when the user leaves the port field empty
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Backend::Sqlite => None,
            Backend::Mysql => Some(3306),
            Backend::Mssql => Some(1433),
            Backend::Postgresql => Some(5432),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "sqlite" => Some(Backend::Sqlite),
            "mysql" => Some(Backend::Mysql),
            "mssql" => Some(Backend::Mssql),
            "postgresql" | "postgres" => Some(Backend::Postgresql),
            _ => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a connect request
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConnectDetails {
    /// File based database
    Sqlite { path: String },
    /// Network database server
    Server {
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
    },
}

impl ConnectDetails {
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::Sqlite { path: path.into() }
    }

    /// Build server details, falling back to the backend's default port
    pub fn server(
        backend: Backend,
        host: impl Into<String>,
        port: Option<u16>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::Server {
            host: host.into(),
            port: port.or(backend.default_port()).unwrap_or_default(),
            database: database.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Name shown in the schema header once connected
    pub fn display_name(&self) -> String {
        match self {
            ConnectDetails::Sqlite { path } if path.is_empty() => "Unknown DB".to_string(),
            ConnectDetails::Sqlite { path } => path
                .rsplit(['/', '\\'])
                .next()
                .unwrap_or(path)
                .to_string(),
            ConnectDetails::Server { database, .. } => database.clone(),
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for ConnectDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectDetails::Sqlite { path } => f.debug_struct("Sqlite").field("path", path).finish(),
            ConnectDetails::Server {
                host,
                port,
                database,
                username,
                ..
            } => f
                .debug_struct("Server")
                .field("host", host)
                .field("port", port)
                .field("database", database)
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Identity of the active backend connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub db_type: String,
    pub db_name: String,
    pub connection_id: i64,
}
