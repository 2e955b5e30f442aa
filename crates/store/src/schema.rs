//! SQL schema constants for the master and day stores

// =============================================================================
// Master schema
// =============================================================================

pub const SCHEMA_LOG: &str = r#"
CREATE TABLE IF NOT EXISTS Log (
    Id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    Time TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    Category TEXT NOT NULL,
    Content TEXT
)
"#;

pub const SCHEMA_USER: &str = r#"
CREATE TABLE IF NOT EXISTS User (
    Id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL UNIQUE,
    IsAdmin INTEGER DEFAULT 0,
    Password TEXT,
    Identification TEXT
)
"#;

pub const SCHEMA_CONNECTION_TYPE: &str = r#"
CREATE TABLE IF NOT EXISTS ConnectionType (
    Id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL UNIQUE
)
"#;

pub const SCHEMA_SOURCE: &str = r#"
CREATE TABLE IF NOT EXISTS Source (
    Id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL UNIQUE,
    ConnectionType INTEGER NOT NULL DEFAULT 1,
    CpuType INTEGER NOT NULL DEFAULT 40,
    Ip TEXT,
    Port INTEGER DEFAULT 102,
    Rack INTEGER DEFAULT 0,
    Slot INTEGER DEFAULT 0,
    Comment TEXT,
    CONSTRAINT fk_ConnectionType FOREIGN KEY (ConnectionType)
        REFERENCES ConnectionType (Id) ON DELETE NO ACTION
)
"#;

// =============================================================================
// Day schema
// =============================================================================

pub const SCHEMA_TAG_CATALOG: &str = r#"
CREATE TABLE IF NOT EXISTS TagCatalog (
    TagName TEXT NOT NULL PRIMARY KEY,
    TagType TEXT,
    TagComment TEXT
)
"#;

pub const SCHEMA_SAMPLE: &str = r#"
CREATE TABLE IF NOT EXISTS Sample (
    Time TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    TagName TEXT NOT NULL,
    TagValue NUMERIC
)
"#;
