//! Block-structured parser over normalized statements

use super::lexer::{classify, parse_property, BlockHeader, LineKind};
use super::ParseError;
use crate::config::{
    Config, ConditionalProperties, Http, Location, Modifier, Properties, Server, ServerId, Upstream,
};
use std::fmt;
use tracing::trace;

/// Kind of a configuration block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Top level of a configuration file
    Main,
    Events,
    Stream,
    Http,
    Types,
    Server,
    Location,
    Upstream,
    If,
}

impl BlockKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Events => "events",
            Self::Stream => "stream",
            Self::Http => "http",
            Self::Types => "types",
            Self::Server => "server",
            Self::Location => "location",
            Self::Upstream => "upstream",
            Self::If => "if",
        }
    }

    /// Blocks allowed directly inside this one
    pub fn children(self) -> &'static [BlockKind] {
        match self {
            Self::Main => &[Self::Events, Self::Stream, Self::Http],
            Self::Http => &[Self::Types, Self::Server, Self::Upstream],
            Self::Server => &[Self::If, Self::Location],
            Self::Location => &[Self::If],
            Self::Events | Self::Stream | Self::Types | Self::Upstream | Self::If => &[],
        }
    }

    /// Resolve a nested block name in this context
    pub fn child(self, name: &str) -> Result<BlockKind, ParseError> {
        self.children()
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ParseError::UnsupportedBlock {
                name: name.to_string(),
                context: self,
            })
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("config body"),
            kind => write!(f, "{} block", kind.name()),
        }
    }
}

/// Receiver of a block's directives and nested blocks
trait BlockBody {
    fn kind(&self) -> BlockKind;

    fn directive(&mut self, name: String, value: String);

    /// Parse a nested block whose body starts at `cursor`; returns the
    /// cursor past its closing brace
    fn nested(
        &mut self,
        parser: &BlockParser<'_>,
        kind: BlockKind,
        header: BlockHeader,
        cursor: usize,
    ) -> Result<usize, ParseError> {
        let _ = (parser, header, cursor);
        Err(unsupported(kind, self.kind()))
    }
}

fn unsupported(kind: BlockKind, context: BlockKind) -> ParseError {
    ParseError::UnsupportedBlock {
        name: kind.name().to_string(),
        context,
    }
}

/// Recursive parser over a flat statement list
pub struct BlockParser<'a> {
    lines: &'a [String],
}

impl<'a> BlockParser<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        Self { lines }
    }

    /// Parse a whole configuration file
    pub fn parse_config(&self) -> Result<Config, ParseError> {
        let mut config = Config::default();
        self.parse_body(0, &mut config, false)?;
        Ok(config)
    }

    /// Parse statements that form the body of an `http` block
    pub fn parse_fragment(&self) -> Result<Http, ParseError> {
        let mut http = Http::default();
        self.parse_body(0, &mut http, false)?;
        Ok(http)
    }

    /// Shared loop of every block kind. A `terminated` body must end with a
    /// closing brace; otherwise the body runs to the end of input.
    fn parse_body<B: BlockBody>(
        &self,
        mut cursor: usize,
        body: &mut B,
        terminated: bool,
    ) -> Result<usize, ParseError> {
        let context = body.kind();

        while let Some(line) = self.lines.get(cursor) {
            match classify(line) {
                LineKind::BlockEnd if terminated => return Ok(cursor + 1),
                LineKind::BlockEnd => return Err(ParseError::UnexpectedBlockEnd(context)),
                LineKind::BlockStart => {
                    let header = BlockHeader::parse(line);
                    let kind = context.child(&header.name)?;
                    trace!(block = kind.name(), inside = context.name(), line = cursor, "entering block");
                    cursor = body.nested(self, kind, header, cursor + 1)?;
                }
                LineKind::Statement => {
                    let (name, value) = parse_property(line);
                    body.directive(name, value);
                    cursor += 1;
                }
            }
        }

        if terminated {
            Err(ParseError::UnterminatedBlock(context))
        } else {
            Ok(cursor)
        }
    }

    fn parse_simple_block(
        &self,
        cursor: usize,
        kind: BlockKind,
    ) -> Result<(Properties, usize), ParseError> {
        let mut body = SimpleBody {
            kind,
            properties: Properties::new(),
        };
        let next = self.parse_body(cursor, &mut body, true)?;
        Ok((body.properties, next))
    }

    fn parse_http_block(&self, cursor: usize) -> Result<(Http, usize), ParseError> {
        let mut http = Http::default();
        let next = self.parse_body(cursor, &mut http, true)?;
        Ok((http, next))
    }

    fn parse_server_block(&self, cursor: usize, id: ServerId) -> Result<(Server, usize), ParseError> {
        let mut server = Server::new(id);
        let next = self.parse_body(cursor, &mut server, true)?;
        Ok((server, next))
    }

    fn parse_location_block(
        &self,
        cursor: usize,
        header: &BlockHeader,
        server: ServerId,
    ) -> Result<(Location, usize), ParseError> {
        let (modifier, uri) = match header.args.as_slice() {
            [uri] => (Modifier::None, uri.clone()),
            [modifier, uri] => (Modifier::from(modifier.as_str()), uri.clone()),
            _ => return Err(ParseError::InvalidLocation(header.raw_args.clone())),
        };

        let mut location = Location::new(modifier, uri, server);
        let next = self.parse_body(cursor, &mut location, true)?;
        Ok((location, next))
    }

    fn parse_if_block(
        &self,
        cursor: usize,
        header: &BlockHeader,
        properties: &mut ConditionalProperties,
    ) -> Result<usize, ParseError> {
        let condition = properties.add_condition(header.condition());
        let mut body = IfBody {
            properties,
            condition,
        };
        self.parse_body(cursor, &mut body, true)
    }
}

struct SimpleBody {
    kind: BlockKind,
    properties: Properties,
}

impl BlockBody for SimpleBody {
    fn kind(&self) -> BlockKind {
        self.kind
    }

    fn directive(&mut self, name: String, value: String) {
        self.properties.push(name, value);
    }
}

struct IfBody<'p> {
    properties: &'p mut ConditionalProperties,
    condition: usize,
}

impl BlockBody for IfBody<'_> {
    fn kind(&self) -> BlockKind {
        BlockKind::If
    }

    fn directive(&mut self, name: String, value: String) {
        self.properties.push(name, Some(self.condition), value);
    }
}

impl BlockBody for Config {
    fn kind(&self) -> BlockKind {
        BlockKind::Main
    }

    fn directive(&mut self, name: String, value: String) {
        self.core.push(name, value);
    }

    fn nested(
        &mut self,
        parser: &BlockParser<'_>,
        kind: BlockKind,
        _header: BlockHeader,
        cursor: usize,
    ) -> Result<usize, ParseError> {
        match kind {
            BlockKind::Events | BlockKind::Stream => {
                let (properties, next) = parser.parse_simple_block(cursor, kind)?;
                if kind == BlockKind::Events {
                    self.events = Some(properties);
                } else {
                    self.stream = Some(properties);
                }
                Ok(next)
            }
            BlockKind::Http => {
                let (http, next) = parser.parse_http_block(cursor)?;
                self.http = Some(http);
                Ok(next)
            }
            _ => Err(unsupported(kind, BlockKind::Main)),
        }
    }
}

impl BlockBody for Http {
    fn kind(&self) -> BlockKind {
        BlockKind::Http
    }

    fn directive(&mut self, name: String, value: String) {
        self.properties.push(name, value);
    }

    fn nested(
        &mut self,
        parser: &BlockParser<'_>,
        kind: BlockKind,
        header: BlockHeader,
        cursor: usize,
    ) -> Result<usize, ParseError> {
        match kind {
            BlockKind::Types => {
                let (types, next) = parser.parse_simple_block(cursor, kind)?;
                self.types = types;
                Ok(next)
            }
            BlockKind::Server => {
                let id = ServerId(self.servers.len());
                let (server, next) = parser.parse_server_block(cursor, id)?;
                self.servers.push(server);
                Ok(next)
            }
            BlockKind::Upstream => {
                let name = header
                    .first_arg()
                    .ok_or(ParseError::MissingUpstreamName)?
                    .to_string();
                let (properties, next) = parser.parse_simple_block(cursor, kind)?;
                self.upstreams
                    .insert(name.clone(), Upstream { name, properties });
                Ok(next)
            }
            _ => Err(unsupported(kind, BlockKind::Http)),
        }
    }
}

impl BlockBody for Server {
    fn kind(&self) -> BlockKind {
        BlockKind::Server
    }

    fn directive(&mut self, name: String, value: String) {
        self.properties.push(name, None, value);
    }

    fn nested(
        &mut self,
        parser: &BlockParser<'_>,
        kind: BlockKind,
        header: BlockHeader,
        cursor: usize,
    ) -> Result<usize, ParseError> {
        match kind {
            BlockKind::If => parser.parse_if_block(cursor, &header, &mut self.properties),
            BlockKind::Location => {
                let (location, next) = parser.parse_location_block(cursor, &header, self.id)?;
                self.locations.push(location);
                Ok(next)
            }
            _ => Err(unsupported(kind, BlockKind::Server)),
        }
    }
}

impl BlockBody for Location {
    fn kind(&self) -> BlockKind {
        BlockKind::Location
    }

    fn directive(&mut self, name: String, value: String) {
        self.properties.push(name, None, value);
    }

    fn nested(
        &mut self,
        parser: &BlockParser<'_>,
        kind: BlockKind,
        header: BlockHeader,
        cursor: usize,
    ) -> Result<usize, ParseError> {
        match kind {
            BlockKind::If => parser.parse_if_block(cursor, &header, &mut self.properties),
            _ => Err(unsupported(kind, BlockKind::Location)),
        }
    }
}
