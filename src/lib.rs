//! nginx configuration reader
//!
//! Reads nginx-style configuration files, follows `include` directives and
//! builds a read-only tree of blocks with typed access to directive values.
//!
//! ```no_run
//! use nginx_conf::PropertyAccess;
//!
//! let config = nginx_conf::read("/etc/nginx/nginx.conf")?;
//! if let Some(server) = config.find_server("example.com", "https") {
//!     println!("{}", server.properties.get("ssl_certificate"));
//! }
//! # Ok::<(), nginx_conf::ParseError>(())
//! ```

pub mod cli;
pub mod config;
pub mod parser;

pub use config::{
    ConditionalProperties, ConditionalProperty, Config, Http, Location, Modifier, Properties,
    PropertyAccess, Server, ServerId, Upstream, ValueError,
};
pub use parser::{
    BlockKind, FsSource, MemorySource, ParseError, ParseOptions, Reader, SourceProvider,
};

use std::path::Path;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Read a configuration file and everything it includes
pub fn read(path: impl AsRef<Path>) -> Result<Config> {
    Reader::new().read(path)
}

/// Read a configuration file, resolving relative includes against `root`.
/// An empty `root` means the directory of `path`.
pub fn read_with_root(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Result<Config> {
    Reader::new().root(root.as_ref()).read(path)
}

/// Read a file holding only the body of an `http` block
pub fn read_part(path: impl AsRef<Path>) -> Result<Http> {
    Reader::new().read_part(path)
}

/// Like [`read_part`], resolving relative includes against `root`
pub fn read_part_with_root(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Result<Http> {
    Reader::new().root(root.as_ref()).read_part(path)
}

/// Parse configuration text without touching the file system.
///
/// `include` directives are dropped, since there is nothing to resolve them
/// against; use a [`Reader`] over a [`MemorySource`] to keep them.
pub fn parse_str(content: &str) -> Result<Config> {
    Reader::with_source(MemorySource::new())
        .options(ParseOptions {
            follow_includes: false,
            ..Default::default()
        })
        .parse_str(content)
}
