use super::SymbolType;
use serde::{Deserialize, Serialize};

/// First record of a data feed: totals and the component lookup table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaRecord {
    /// Grand total size of the feed, used to report progress
    pub total: f64,
    /// Component names referenced by index from file records
    #[serde(default)]
    pub components: Vec<String>,
}

/// One source file and the symbols it contributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Source path
    #[serde(rename = "p")]
    pub source_path: String,
    /// Index into [`MetaRecord::components`]
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub component_index: Option<usize>,
    /// Symbols belonging to this file
    #[serde(rename = "s", default)]
    pub symbols: Vec<SymbolEntry>,
}

/// One symbol of a [`FileEntry`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolEntry {
    /// Symbol name
    #[serde(rename = "n")]
    pub name: String,
    /// Size in bytes, already divided by the alias count
    #[serde(rename = "b")]
    pub size: f64,
    /// Raw one-character type code
    #[serde(rename = "t")]
    pub type_code: String,
}

impl FileEntry {
    /// File record with no component
    pub fn new(source_path: impl Into<String>, symbols: Vec<SymbolEntry>) -> Self {
        Self {
            source_path: source_path.into(),
            component_index: None,
            symbols,
        }
    }

    /// Attach a component index
    pub fn with_component(mut self, index: usize) -> Self {
        self.component_index = Some(index);
        self
    }
}

impl SymbolEntry {
    /// Symbol record
    pub fn new(name: impl Into<String>, size: f64, symbol_type: SymbolType) -> Self {
        Self {
            name: name.into(),
            size,
            type_code: symbol_type.code().to_string(),
        }
    }

    /// Parsed type of this symbol
    pub fn symbol_type(&self) -> SymbolType {
        SymbolType::from_raw(&self.type_code)
    }
}
