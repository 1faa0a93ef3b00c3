//! Symbol interning.
//!
//! Symbol text is interned once into a flat table and referenced afterwards
//! by a small `Copy` handle (`SymbolId`). This avoids allocating a `String`
//! every time a symbol is looked up, pushed to the stack, or compared for
//! equality during pattern dispatch.

use ahash::AHashMap;

/// Handle into the global symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owns the canonical text for every symbol seen so far.
///
/// Populated during parsing and compilation; looked up during execution
/// (variable names, operator fallback names) and for error messages.
#[derive(Debug, Default)]
pub struct Interner {
    names: Vec<String>,
    ids: AHashMap<String, SymbolId>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `name`, returning its existing id or allocating a fresh one.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = SymbolId(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    /// Returns the text for a previously interned symbol.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this interner.
    #[must_use]
    pub fn resolve(&self, id: SymbolId) -> &str {
        &self.names[id.index()]
    }
}
