use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The database engines the console knows how to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    PostgreSql,
    Redis,
    MongoDb,
    Neo4j,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown database type: {0}")]
pub struct UnknownDatabase(pub String);

/// Catalog entry as exposed to the frontend.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: &'static str,
    pub image: &'static str,
    pub default_port: u16,
}

impl DatabaseKind {
    const ALL: [DatabaseKind; 4] = [
        DatabaseKind::PostgreSql,
        DatabaseKind::Redis,
        DatabaseKind::MongoDb,
        DatabaseKind::Neo4j,
    ];

    pub fn all() -> &'static [DatabaseKind] {
        &Self::ALL
    }

    pub fn name(self) -> &'static str {
        match self {
            DatabaseKind::PostgreSql => "PostgreSQL",
            DatabaseKind::Redis => "Redis",
            DatabaseKind::MongoDb => "MongoDB",
            DatabaseKind::Neo4j => "Neo4j",
        }
    }

    pub fn image(self) -> &'static str {
        match self {
            DatabaseKind::PostgreSql => "postgres:alpine",
            DatabaseKind::Redis => "redis:alpine",
            DatabaseKind::MongoDb => "mongo:latest",
            DatabaseKind::Neo4j => "neo4j:latest",
        }
    }

    /// Port the database listens on inside its container.
    pub fn default_port(self) -> u16 {
        match self {
            DatabaseKind::PostgreSql => 5432,
            DatabaseKind::Redis => 6379,
            DatabaseKind::MongoDb => 27017,
            DatabaseKind::Neo4j => 7474,
        }
    }

    /// Environment passed to the container. Only PostgreSQL takes a password.
    pub fn env(self, password: &str) -> Vec<String> {
        match self {
            DatabaseKind::PostgreSql => vec![format!("POSTGRES_PASSWORD={password}")],
            DatabaseKind::Redis | DatabaseKind::MongoDb | DatabaseKind::Neo4j => Vec::new(),
        }
    }

    pub fn needs_password(self) -> bool {
        matches!(self, DatabaseKind::PostgreSql)
    }

    /// Timestamp-suffixed name, e.g. `redis-1718000000000`. Two launches of
    /// the same kind within one millisecond get the same name and the second
    /// is refused by the engine with a 409 conflict.
    pub fn container_name(self, now_millis: i64) -> String {
        format!("{}-{}", self.name().to_lowercase(), now_millis)
    }

    pub fn entry(self) -> CatalogEntry {
        CatalogEntry {
            name: self.name(),
            image: self.image(),
            default_port: self.default_port(),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatabaseKind {
    type Err = UnknownDatabase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == trimmed || kind.name().to_lowercase() == trimmed)
            .ok_or_else(|| UnknownDatabase(s.to_string()))
    }
}

pub fn entries() -> Vec<CatalogEntry> {
    DatabaseKind::all().iter().map(|kind| kind.entry()).collect()
}
