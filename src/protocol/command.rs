//! Command definitions
//!
//! The fixed set of map commands and the requests that carry them.

use bytes::Bytes;

/// Command types, one per map operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    MapSet,
    MapGet,
    MapDelete,
    MapClear,
    MapSize,
    MapKey,
    MapValue,
    MapEmpty,
    MapKeys,
    MapValues,
    MapToS,
}

/// Wire name → command type
const COMMAND_TABLE: [(&str, CommandType); 11] = [
    ("map_set", CommandType::MapSet),
    ("map_get", CommandType::MapGet),
    ("map_delete", CommandType::MapDelete),
    ("map_clear", CommandType::MapClear),
    ("map_size", CommandType::MapSize),
    ("map_key?", CommandType::MapKey),
    ("map_value?", CommandType::MapValue),
    ("map_empty?", CommandType::MapEmpty),
    ("map_keys", CommandType::MapKeys),
    ("map_values", CommandType::MapValues),
    ("map_to_s", CommandType::MapToS),
];

/// Trailing argument marking a request forwarded by a peer
pub const FORWARD_MARKER: &str = "forward";

impl CommandType {
    /// Resolve a wire name
    pub fn from_name(name: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, command)| *command)
    }

    /// All commands in table order
    pub fn all() -> impl Iterator<Item = CommandType> {
        COMMAND_TABLE.iter().map(|(_, command)| *command)
    }

    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            CommandType::MapSet => "map_set",
            CommandType::MapGet => "map_get",
            CommandType::MapDelete => "map_delete",
            CommandType::MapClear => "map_clear",
            CommandType::MapSize => "map_size",
            CommandType::MapKey => "map_key?",
            CommandType::MapValue => "map_value?",
            CommandType::MapEmpty => "map_empty?",
            CommandType::MapKeys => "map_keys",
            CommandType::MapValues => "map_values",
            CommandType::MapToS => "map_to_s",
        }
    }

    /// Number of request-line tokens, command name included, `forward` excluded
    pub fn arity(&self) -> usize {
        match self {
            CommandType::MapSet => 6,
            CommandType::MapGet
            | CommandType::MapDelete
            | CommandType::MapKey
            | CommandType::MapValue => 3,
            CommandType::MapClear
            | CommandType::MapSize
            | CommandType::MapEmpty
            | CommandType::MapKeys
            | CommandType::MapValues
            | CommandType::MapToS => 2,
        }
    }

    /// Index of the `<bytes>` token for commands followed by a data block
    pub fn length_index(&self) -> Option<usize> {
        match self {
            CommandType::MapSet => Some(5),
            CommandType::MapValue => Some(2),
            _ => None,
        }
    }

    pub fn carries_value(&self) -> bool {
        self.length_index().is_some()
    }

    /// Read-modify-write commands that need exclusive access to the key
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            CommandType::MapSet | CommandType::MapDelete | CommandType::MapClear
        )
    }

    /// Status sent when the store declines a write
    pub fn failure_status(&self) -> &'static str {
        match self {
            CommandType::MapDelete => "NOT_DELETED",
            CommandType::MapClear => "NOT_CLEARED",
            _ => "NOT_STORED",
        }
    }
}

/// A parsed request: command line tokens plus optional data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The command
    pub command: CommandType,

    /// Tokens of the request line, command name first, `forward` stripped
    pub argv: Vec<String>,

    /// Data block for value-bearing commands
    pub value: Option<Bytes>,

    /// Request was forwarded by a peer
    pub forward: bool,
}

impl Request {
    /// Build a request from its arguments (command name is prepended)
    pub fn new<I, S>(command: CommandType, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec![command.name().to_string()];
        argv.extend(args.into_iter().map(Into::into));
        Self {
            command,
            argv,
            value: None,
            forward: false,
        }
    }

    /// Attach a data block, appending its length to the request line
    pub fn with_value(mut self, value: impl Into<Bytes>) -> Self {
        let value = value.into();
        self.argv.push(value.len().to_string());
        self.value = Some(value);
        self
    }

    /// Mark the request as forwarded
    pub fn forwarded(mut self) -> Self {
        self.forward = true;
        self
    }

    /// Primary key
    pub fn key(&self) -> &str {
        self.arg(1).unwrap_or_default()
    }

    /// Argument at `index` (0 is the command name)
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.argv.get(index).map(String::as_str)
    }
}
