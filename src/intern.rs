//! Dense integer ids for nonterminal names, local to the CYK index.
//!
//! Mirrors the `NTIdx`/`TIdx` newtype-over-`Vec<String>` idiom in
//! `examples/michelleyw-grmtools`'s `YaccGrammar`: a name table plus a
//! `HashMap` for the reverse lookup, so the CYK inner loop hashes a pair of
//! small integers instead of a pair of strings.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NtId(u32);

#[derive(Debug, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    ids: HashMap<String, NtId>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Returns the id for `name`, interning it if this is the first time
    /// it's been seen.
    pub fn intern(&mut self, name: &str) -> NtId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = NtId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn id_of(&self, name: &str) -> Option<NtId> {
        self.ids.get(name).copied()
    }

    pub fn name_of(&self, id: NtId) -> &str {
        &self.names[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
