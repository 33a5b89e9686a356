use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Kind of a binary symbol, identified by a one-character code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolType {
    /// `b`: zero-initialised data (.bss)
    Bss,
    /// `d`: initialised data (.data)
    Data,
    /// `r`: read-only data (.rodata)
    ReadOnly,
    /// `t`: machine code (.text)
    Code,
    /// `v`: vtable entries
    Vtable,
    /// `*`: generated or synthetic symbols
    Generated,
    /// `x`: dex non-method entries
    Dex,
    /// `m`: dex methods
    DexMethod,
    /// `p`: locale pak entries
    LocalPak,
    /// `P`: non-locale pak entries
    NonLocalPak,
    /// `o`: anything else
    Other,
}

impl SymbolType {
    /// Number of distinct symbol types
    pub const COUNT: usize = 11;

    /// All symbol types in canonical order.
    ///
    /// The canonical order breaks ties wherever two types compete, e.g. for
    /// the dominant type of a container.
    pub const ALL: [SymbolType; Self::COUNT] = [
        SymbolType::Bss,
        SymbolType::Data,
        SymbolType::ReadOnly,
        SymbolType::Code,
        SymbolType::Vtable,
        SymbolType::Generated,
        SymbolType::Dex,
        SymbolType::DexMethod,
        SymbolType::LocalPak,
        SymbolType::NonLocalPak,
        SymbolType::Other,
    ];

    /// Type codes accepted by default, in canonical order
    pub const ALL_CODES: &'static str = "bdrtv*xmpPo";

    /// Single-character code of this type
    pub const fn code(self) -> char {
        match self {
            SymbolType::Bss => 'b',
            SymbolType::Data => 'd',
            SymbolType::ReadOnly => 'r',
            SymbolType::Code => 't',
            SymbolType::Vtable => 'v',
            SymbolType::Generated => '*',
            SymbolType::Dex => 'x',
            SymbolType::DexMethod => 'm',
            SymbolType::LocalPak => 'p',
            SymbolType::NonLocalPak => 'P',
            SymbolType::Other => 'o',
        }
    }

    /// Parse a type code. Unrecognised codes map to [`SymbolType::Other`].
    pub const fn from_code(code: char) -> Self {
        match code {
            'b' => SymbolType::Bss,
            'd' => SymbolType::Data,
            'r' => SymbolType::ReadOnly,
            't' => SymbolType::Code,
            'v' => SymbolType::Vtable,
            '*' => SymbolType::Generated,
            'x' => SymbolType::Dex,
            'm' => SymbolType::DexMethod,
            'p' => SymbolType::LocalPak,
            'P' => SymbolType::NonLocalPak,
            _ => SymbolType::Other,
        }
    }

    /// Parse the raw `t` field of a symbol record.
    ///
    /// Only the first character is significant; an empty string is
    /// [`SymbolType::Other`].
    pub fn from_raw(raw: &str) -> Self {
        raw.chars().next().map_or(SymbolType::Other, Self::from_code)
    }

    /// Position in the canonical order
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for SymbolType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.code())
    }
}

impl<'de> Deserialize<'de> for SymbolType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SymbolType::from_raw(&raw))
    }
}

/// Kind of a container node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// `D`: a directory, and the root
    Directory,
    /// `C`: a component group
    Component,
    /// `F`: a source file holding symbols
    File,
}

impl ContainerKind {
    /// Single-character code of this kind
    pub const fn code(self) -> char {
        match self {
            ContainerKind::Directory => 'D',
            ContainerKind::Component => 'C',
            ContainerKind::File => 'F',
        }
    }

    /// Parse a container code
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'D' => Some(ContainerKind::Directory),
            'C' => Some(ContainerKind::Component),
            'F' => Some(ContainerKind::File),
            _ => None,
        }
    }
}

/// Type of a tree node
///
/// Renders as the compact type string used on the wire: a symbol renders
/// its own code, a container renders its kind code followed by the code of
/// its dominant child type once it has one (`"Dt"`, `"Fr"`, `"C"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// A symbol leaf
    Symbol(SymbolType),
    /// A directory, component or file
    Container {
        /// What the container groups
        kind: ContainerKind,
        /// Leaf type contributing the largest size below this container
        dominant: Option<SymbolType>,
    },
}

impl NodeType {
    /// A container without any contribution yet
    pub const fn container(kind: ContainerKind) -> Self {
        NodeType::Container {
            kind,
            dominant: None,
        }
    }

    /// True for directories, components and files
    pub const fn is_container(&self) -> bool {
        matches!(self, NodeType::Container { .. })
    }

    /// Container kind, if this is a container
    pub const fn kind(&self) -> Option<ContainerKind> {
        match self {
            NodeType::Container { kind, .. } => Some(*kind),
            NodeType::Symbol(_) => None,
        }
    }

    /// Leaf type this node is accounted under: its own type for symbols,
    /// the dominant child type for containers.
    pub const fn leaf_type(&self) -> Option<SymbolType> {
        match self {
            NodeType::Symbol(symbol_type) => Some(*symbol_type),
            NodeType::Container { dominant, .. } => *dominant,
        }
    }

    /// Parse a rendered type string (`"t"`, `"D"`, `"Fr"`)
    pub fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        let first = chars.next()?;
        match ContainerKind::from_code(first) {
            Some(kind) => {
                let dominant = chars.next().map(SymbolType::from_code);
                Some(NodeType::Container { kind, dominant })
            }
            None => Some(NodeType::Symbol(SymbolType::from_code(first))),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Symbol(symbol_type) => write!(f, "{}", symbol_type.code()),
            NodeType::Container { kind, dominant } => {
                write!(f, "{}", kind.code())?;
                if let Some(dominant) = dominant {
                    write!(f, "{}", dominant.code())?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NodeType::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom("empty node type string"))
    }
}
