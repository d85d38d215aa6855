//! Parsed nginx configuration tree
//!
//! Ownership flows top-down: [`Config`] owns the [`Http`] block, which owns
//! its servers and upstreams; servers own their locations. A location points
//! back at its server through a [`ServerId`] instead of a reference.

mod properties;
mod query;
pub mod values;

pub use properties::{ConditionalProperties, ConditionalProperty, Properties, PropertyAccess};
pub use values::ValueError;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Root of a parsed configuration file
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    /// Directory includes are resolved against
    pub root: PathBuf,
    /// Absolute path of the parsed file
    pub file: PathBuf,
    /// Directives outside any block
    pub core: Properties,
    pub events: Option<Properties>,
    pub stream: Option<Properties>,
    pub http: Option<Http>,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.file.display())
    }
}

/// The `http` block
#[derive(Debug, Clone, Default, Serialize)]
pub struct Http {
    pub properties: Properties,
    /// Content of the `types` block
    pub types: Properties,
    pub servers: Vec<Server>,
    /// Upstreams by name; a repeated name replaces the earlier block
    pub upstreams: HashMap<String, Upstream>,
}

impl Http {
    /// Server by its position in declaration order
    pub fn server(&self, id: ServerId) -> Option<&Server> {
        self.servers.get(id.0)
    }

    /// Server a location belongs to
    pub fn location_parent(&self, location: &Location) -> Option<&Server> {
        self.server(location.server)
    }

    pub fn upstream(&self, name: &str) -> Option<&Upstream> {
        self.upstreams.get(name)
    }
}

/// Position of a server inside [`Http::servers`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ServerId(pub usize);

/// A `server` block
///
/// Its owning [`Http`] is the one holding it; a tree has a single `http`
/// block, so no back-reference is stored.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Server {
    pub id: ServerId,
    pub properties: ConditionalProperties,
    pub locations: Vec<Location>,
}

impl Server {
    pub fn new(id: ServerId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// A `location` block
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub modifier: Modifier,
    pub uri: String,
    pub properties: ConditionalProperties,
    /// Owning server
    pub server: ServerId,
}

impl Location {
    pub fn new(modifier: Modifier, uri: impl Into<String>, server: ServerId) -> Self {
        Self {
            modifier,
            uri: uri.into(),
            properties: ConditionalProperties::default(),
            server,
        }
    }
}

/// Match operator of a `location` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// Plain prefix match
    #[default]
    None,
    /// `=`
    Exact,
    /// `^~`
    PreferPrefix,
    /// `~`
    Regex,
    /// `~*`
    RegexCaseless,
    /// Anything else, kept as written
    Other(String),
}

impl Modifier {
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "",
            Self::Exact => "=",
            Self::PreferPrefix => "^~",
            Self::Regex => "~",
            Self::RegexCaseless => "~*",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for Modifier {
    fn from(s: &str) -> Self {
        match s {
            "" => Self::None,
            "=" => Self::Exact,
            "^~" => Self::PreferPrefix,
            "~" => Self::Regex,
            "~*" => Self::RegexCaseless,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `upstream` block
///
/// Owned by the tree's only [`Http`], found through [`Http::upstream`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Upstream {
    pub name: String,
    pub properties: Properties,
}
