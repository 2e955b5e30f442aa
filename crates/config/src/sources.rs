//! Source (controller) connection configuration

use std::fmt;

use serde::Deserialize;

/// How a source is reached on the wire.
///
/// The bridge treats the field-bus protocol as an opaque capability; the
/// kind only selects which client backend the binary wires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Siemens S7-family controller.
    S7,
    /// Built-in deterministic simulator (no hardware required).
    Sim,
}

impl ConnectionKind {
    /// Parse from a connection-type name as stored in the master store.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "S7" => Some(Self::S7),
            "Sim" => Some(Self::Sim),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S7 => f.write_str("S7"),
            Self::Sim => f.write_str("Sim"),
        }
    }
}

impl Default for ConnectionKind {
    fn default() -> Self {
        Self::S7
    }
}

/// Connection parameters for one physical controller.
///
/// One entry per device, keyed in the config file by the three-character
/// source prefix that tag names carry (`[sources.A02]`). The same record is
/// produced when sources are loaded from the master store's `Source` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConnection {
    /// Source name; filled in from the map key during load.
    #[serde(skip)]
    pub name: String,

    /// Protocol backend for this controller.
    pub kind: ConnectionKind,

    /// Numeric CPU family code as used by the field-bus stack.
    pub cpu_type: i64,

    /// Controller host or IP address.
    pub host: String,

    /// Controller port.
    pub port: u16,

    /// Rack number (S7 addressing).
    pub rack: i16,

    /// Slot number (S7 addressing).
    pub slot: i16,

    /// Free-form operator comment.
    pub comment: Option<String>,
}

impl Default for SourceConnection {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ConnectionKind::default(),
            cpu_type: 40,
            host: String::new(),
            port: 102,
            rack: 0,
            slot: 0,
            comment: None,
        }
    }
}

impl SourceConnection {
    /// A simulator source that needs no connection parameters.
    pub fn sim(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ConnectionKind::Sim,
            ..Default::default()
        }
    }
}
