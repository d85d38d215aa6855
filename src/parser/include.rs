//! Source providers and include resolution

use super::lexer::{directive_name, normalize, parse_property};
use super::{ParseError, ParseOptions};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Supplies file content and glob expansion to the parser
pub trait SourceProvider {
    /// Read the whole file at `path`
    fn read_to_string(&self, path: &Path) -> Result<String, ParseError>;

    /// Expand a glob pattern into the matching files, sorted
    fn expand_glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ParseError>;

    /// Turn a user supplied path into the form used for includes and cycle
    /// detection
    fn absolute(&self, path: &Path) -> Result<PathBuf, ParseError> {
        Ok(path.to_path_buf())
    }
}

impl<S: SourceProvider + ?Sized> SourceProvider for &S {
    fn read_to_string(&self, path: &Path) -> Result<String, ParseError> {
        (**self).read_to_string(path)
    }

    fn expand_glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ParseError> {
        (**self).expand_glob(pattern)
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf, ParseError> {
        (**self).absolute(path)
    }
}

/// Reads configuration files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl SourceProvider for FsSource {
    fn read_to_string(&self, path: &Path) -> Result<String, ParseError> {
        fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn expand_glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ParseError> {
        let entries = glob::glob(pattern).map_err(|e| ParseError::Glob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ParseError::Io {
                path: e.path().to_path_buf(),
                source: e.into(),
            })?;
            if path.is_file() {
                paths.push(path);
            }
        }

        // Sort for consistent ordering
        paths.sort();
        Ok(paths)
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf, ParseError> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }

        let cwd = std::env::current_dir().map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(cwd.join(path))
    }
}

/// In-memory file set, keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content at the same path
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl SourceProvider for MemorySource {
    fn read_to_string(&self, path: &Path) -> Result<String, ParseError> {
        self.files.get(path).cloned().ok_or_else(|| ParseError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        })
    }

    fn expand_glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ParseError> {
        let matcher = glob::Pattern::new(pattern).map_err(|e| ParseError::Glob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        Ok(self
            .files
            .keys()
            .filter(|path| matcher.matches_path_with(path, options))
            .cloned()
            .collect())
    }
}

/// Check if an include target needs glob expansion
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?') || pattern.contains('[')
}

/// Expands `include` statements while reading a file tree.
///
/// Relative include targets resolve against `root`. The stack of files
/// currently being read guards against cycles and runaway nesting.
pub struct IncludeResolver<'a, S: ?Sized> {
    source: &'a S,
    root: PathBuf,
    options: &'a ParseOptions,
    chain: Vec<PathBuf>,
}

impl<'a, S: SourceProvider + ?Sized> IncludeResolver<'a, S> {
    pub fn new(source: &'a S, root: PathBuf, options: &'a ParseOptions) -> Self {
        Self {
            source,
            root,
            options,
            chain: Vec::new(),
        }
    }

    /// Read `path` and every file it includes into one statement list
    pub fn load(&mut self, path: &Path) -> Result<Vec<String>, ParseError> {
        self.can_include(path)?;

        let content = self.source.read_to_string(path)?;
        self.chain.push(path.to_path_buf());
        let statements = self.expand(normalize(&content))?;
        self.chain.pop();

        trace!(file = %path.display(), statements = statements.len(), "normalized file");
        Ok(statements)
    }

    /// Expand includes inside already normalized statements
    pub fn expand(&mut self, statements: Vec<String>) -> Result<Vec<String>, ParseError> {
        let mut result = Vec::with_capacity(statements.len());

        for statement in statements {
            if directive_name(&statement) != "include" {
                result.push(statement);
                continue;
            }

            if !self.options.follow_includes {
                debug!(statement = %statement, "skipping include");
                continue;
            }

            let (_, target) = parse_property(&statement);
            for path in self.resolve(unquote(&target))? {
                result.extend(self.load(&path)?);
            }
        }

        Ok(result)
    }

    /// Resolve an include target into the files to read
    pub fn resolve(&self, target: &str) -> Result<Vec<PathBuf>, ParseError> {
        let path = if Path::new(target).is_absolute() {
            PathBuf::from(target)
        } else {
            self.root.join(target)
        };

        if !is_glob(target) {
            return Ok(vec![path]);
        }

        let pattern = path.to_string_lossy();
        let paths = self.source.expand_glob(&pattern)?;

        if paths.is_empty() {
            // nginx silently ignores includes with no matches when using glob
            debug!(pattern = %pattern, "include matched no files");
        } else {
            debug!(pattern = %pattern, matches = paths.len(), "expanding include");
        }

        Ok(paths)
    }

    /// Check if we can process this include (no cycle, within depth limit)
    fn can_include(&self, path: &Path) -> Result<(), ParseError> {
        if self.chain.iter().any(|p| p == path) {
            return Err(ParseError::IncludeCycle(path.to_path_buf()));
        }
        if self.chain.len() > self.options.max_include_depth {
            return Err(ParseError::MaxIncludeDepth(self.options.max_include_depth));
        }
        Ok(())
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
