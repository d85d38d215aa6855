//! CLI argument definitions

use crate::config::{PropertyAccess, ValueError};
use crate::parser::{ParseOptions, Reader};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Inspect nginx configuration files
#[derive(Parser)]
#[command(name = "nginx-conf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List virtual hosts as name:protocol
    Servers(ServersArgs),

    /// Show the first server matching a name and protocol
    Find(FindArgs),

    /// Print a directive value, optionally as a typed value
    Get(GetArgs),

    /// Print the parsed tree as JSON
    Dump(DumpArgs),
}

/// Where to read configuration from
#[derive(clap::Args)]
pub struct SourceArgs {
    /// Configuration file
    pub input: PathBuf,

    /// Directory relative includes are resolved against
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Do not follow include directives
    #[arg(long)]
    pub no_includes: bool,

    /// Maximum include depth
    #[arg(long, default_value = "10")]
    pub max_include_depth: usize,
}

impl SourceArgs {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            follow_includes: !self.no_includes,
            max_include_depth: self.max_include_depth,
        }
    }

    pub fn reader(&self) -> Reader {
        let reader = Reader::new().options(self.parse_options());
        match &self.root {
            Some(root) => reader.root(root.clone()),
            None => reader,
        }
    }
}

#[derive(clap::Args)]
pub struct ServersArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Input is the body of an http block
    #[arg(long)]
    pub part: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct FindArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Server name to look for
    pub name: String,

    /// Protocol the server must listen with (http, https, ssl, http2, port...)
    #[arg(default_value = "http")]
    pub protocol: String,

    /// Input is the body of an http block
    #[arg(long)]
    pub part: bool,
}

#[derive(clap::Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Directive name
    pub directive: String,

    /// Block to read the directive from
    #[arg(long, value_enum, default_value = "http")]
    pub scope: Scope,

    /// How to interpret the value
    #[arg(long = "as", value_enum, default_value = "raw")]
    pub kind: ValueKind,
}

#[derive(clap::Args)]
pub struct DumpArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Input is the body of an http block
    #[arg(long)]
    pub part: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Top-level directives
    Core,
    Events,
    Stream,
    Http,
    /// The http types block
    Types,
}

impl Scope {
    pub fn name(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Events => "events",
            Self::Stream => "stream",
            Self::Http => "http",
            Self::Types => "types",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValueKind {
    #[default]
    Raw,
    Bool,
    Int,
    /// Byte size with k/m/g suffix
    Size,
    /// Buffer pair "count size"
    Buf,
    /// Duration such as "1h 30m"
    Time,
}

impl ValueKind {
    /// Read a directive and render it for display
    pub fn read<P: PropertyAccess + ?Sized>(self, props: &P, name: &str) -> Result<String, ValueError> {
        let rendered = match self {
            Self::Raw => props.get(name),
            Self::Bool => props.get_bool(name)?.to_string(),
            Self::Int => props.get_int(name)?.to_string(),
            Self::Size => props.get_size(name)?.to_string(),
            Self::Buf => {
                let (count, size) = props.get_buf(name)?;
                format!("{} {}", count, size)
            }
            Self::Time => format!("{:?}", props.get_time(name)?),
        };
        Ok(rendered)
    }
}

#[derive(ValueEnum, Clone, Copy, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}
