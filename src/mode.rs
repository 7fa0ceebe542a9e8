//! Parser-family selector: the single "configuration" knob the core
//! exposes to its caller (see `symbols::SymbolTable`-free "Polymorphism
//! over parser-mode" design note this crate follows).

/// Which canonical-collection/table-construction discipline to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserMode {
    LR0,
    SLR1,
    LALR1,
    CLR1,
    LL1,
}

impl ParserMode {
    pub fn is_lr(self) -> bool {
        !matches!(self, ParserMode::LL1)
    }

    pub fn is_ll(self) -> bool {
        matches!(self, ParserMode::LL1)
    }

    /// Whether this mode's canonical-collection construction carries
    /// per-item lookahead sets (CLR1/LALR1) as opposed to none (LR0) or
    /// a table-assembly-time lookup (SLR1).
    pub fn tracks_item_lookaheads(self) -> bool {
        matches!(self, ParserMode::CLR1 | ParserMode::LALR1)
    }
}
