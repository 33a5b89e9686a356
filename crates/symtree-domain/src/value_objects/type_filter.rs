use super::SymbolType;

bitflags::bitflags! {
    /// Set of symbol types admitted into the tree
    ///
    /// Symbols whose type is not in the set are dropped before attachment
    /// and never contribute to any aggregate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFilter: u16 {
        /// `b`
        const BSS           = 1 << 0;
        /// `d`
        const DATA          = 1 << 1;
        /// `r`
        const READ_ONLY     = 1 << 2;
        /// `t`
        const CODE          = 1 << 3;
        /// `v`
        const VTABLE        = 1 << 4;
        /// `*`
        const GENERATED     = 1 << 5;
        /// `x`
        const DEX           = 1 << 6;
        /// `m`
        const DEX_METHOD    = 1 << 7;
        /// `p`
        const LOCAL_PAK     = 1 << 8;
        /// `P`
        const NON_LOCAL_PAK = 1 << 9;
        /// `o`
        const OTHER         = 1 << 10;
    }
}

impl TypeFilter {
    /// Flag for a single symbol type
    pub const fn of(symbol_type: SymbolType) -> Self {
        Self::from_bits_retain(1 << symbol_type.index())
    }

    /// Filter used in method count mode: dex methods only
    pub const fn method_count() -> Self {
        Self::DEX_METHOD
    }

    /// Build a filter from a string of type codes.
    ///
    /// Every character is one code; unknown codes admit
    /// [`SymbolType::Other`].
    pub fn from_codes(codes: &str) -> Self {
        codes
            .chars()
            .map(|code| Self::of(SymbolType::from_code(code)))
            .fold(Self::empty(), |acc, flag| acc | flag)
    }

    /// True if symbols of `symbol_type` pass this filter
    pub const fn admits(&self, symbol_type: SymbolType) -> bool {
        self.contains(Self::of(symbol_type))
    }

    /// Codes admitted by this filter, in canonical order
    pub fn codes(&self) -> String {
        SymbolType::ALL
            .iter()
            .filter(|symbol_type| self.admits(**symbol_type))
            .map(|symbol_type| symbol_type.code())
            .collect()
    }
}

impl Default for TypeFilter {
    fn default() -> Self {
        Self::all()
    }
}
