//! nginx configuration reader
//!
//! Reading happens in two passes: every file is normalized into a flat list
//! of statements with includes spliced in place, then the block parser builds
//! the tree from that list.

mod blocks;
mod include;
mod lexer;

pub use blocks::BlockKind;
pub use include::{is_glob, FsSource, MemorySource, SourceProvider};
pub use lexer::{
    classify, is_block_end, is_block_start, normalize, parse_property, BlockHeader, LineKind,
    QuoteState,
};

use crate::config::{Config, Http};
use blocks::BlockParser;
use include::IncludeResolver;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Can't read glob {pattern}: {message}")]
    Glob { pattern: String, message: String },

    #[error("Include cycle detected: {}", .0.display())]
    IncludeCycle(PathBuf),

    #[error("Maximum include depth exceeded ({0})")]
    MaxIncludeDepth(usize),

    #[error("Unsupported block {name} inside {context}")]
    UnsupportedBlock { name: String, context: BlockKind },

    #[error("Can't find block end of {0}")]
    UnterminatedBlock(BlockKind),

    #[error("Unexpected block end inside {0}")]
    UnexpectedBlockEnd(BlockKind),

    #[error("Unsupported upstream block doesn't have the name")]
    MissingUpstreamName,

    #[error("Location block needs a URI and an optional modifier, got \"{0}\"")]
    InvalidLocation(String),
}

/// Parser options
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Follow include directives
    pub follow_includes: bool,
    /// Maximum include depth
    pub max_include_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            follow_includes: true,
            max_include_depth: 10,
        }
    }
}

/// Reads configuration files through a [`SourceProvider`]
#[derive(Debug, Clone)]
pub struct Reader<S = FsSource> {
    source: S,
    options: ParseOptions,
    root: Option<PathBuf>,
}

impl Reader<FsSource> {
    /// Reader over the local file system
    pub fn new() -> Self {
        Self::with_source(FsSource)
    }
}

impl Default for Reader<FsSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SourceProvider> Reader<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            options: ParseOptions::default(),
            root: None,
        }
    }

    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve relative includes against `root` instead of the directory of
    /// the file being read. An empty path keeps the default.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.root = if root.as_os_str().is_empty() {
            None
        } else {
            Some(root)
        };
        self
    }

    /// Read and parse a complete configuration file
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Config, ParseError> {
        let (file, root, statements) = self.load(path.as_ref())?;
        let mut config = BlockParser::new(&statements).parse_config()?;

        debug!(
            file = %file.display(),
            statements = statements.len(),
            servers = config.servers_num(),
            "parsed config"
        );

        config.root = root;
        config.file = file;
        Ok(config)
    }

    /// Read and parse a file holding only the body of an `http` block
    pub fn read_part(&self, path: impl AsRef<Path>) -> Result<Http, ParseError> {
        let (file, _, statements) = self.load(path.as_ref())?;
        let http = BlockParser::new(&statements).parse_fragment()?;

        debug!(file = %file.display(), servers = http.servers_num(), "parsed http fragment");
        Ok(http)
    }

    /// Parse configuration text; includes resolve against the configured root
    pub fn parse_str(&self, content: &str) -> Result<Config, ParseError> {
        let root = self.root.clone().unwrap_or_default();
        let statements = self.expand(content, &root)?;
        let mut config = BlockParser::new(&statements).parse_config()?;
        config.root = root;
        Ok(config)
    }

    /// Parse `http` block body text
    pub fn parse_part_str(&self, content: &str) -> Result<Http, ParseError> {
        let root = self.root.clone().unwrap_or_default();
        let statements = self.expand(content, &root)?;
        BlockParser::new(&statements).parse_fragment()
    }

    fn expand(&self, content: &str, root: &Path) -> Result<Vec<String>, ParseError> {
        IncludeResolver::new(&self.source, root.to_path_buf(), &self.options)
            .expand(normalize(content))
    }

    fn load(&self, path: &Path) -> Result<(PathBuf, PathBuf, Vec<String>), ParseError> {
        let file = self.source.absolute(path)?;
        let root = match &self.root {
            Some(root) => root.clone(),
            None => file.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        let mut resolver = IncludeResolver::new(&self.source, root.clone(), &self.options);
        let statements = resolver.load(&file)?;
        Ok((file, root, statements))
    }
}
