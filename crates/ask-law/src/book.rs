// book.rs - The law book: an ordered, append-only set of active laws.
//
// A LawBook is an owned value, not process-wide state. Each checker owns
// its own book, so independent kernels (and tests) never share rules.
// Laws are never removed or edited once added.

use serde::{Deserialize, Serialize};

use crate::law::Law;

/// Ordered collection of compiled laws, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LawBook {
    laws: Vec<Law>,
}

impl LawBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a law. Duplicates are kept; use `add_unique` to skip them.
    pub fn add(&mut self, law: Law) {
        tracing::debug!(law_id = %law.id, condition = %law.condition, "law added");
        self.laws.push(law);
    }

    /// Append a law unless one with the same id is already present.
    ///
    /// Returns true if the law was added.
    pub fn add_unique(&mut self, law: Law) -> bool {
        if self.get(&law.id).is_some() {
            return false;
        }
        self.add(law);
        true
    }

    /// Iterate laws in insertion order. Each call starts from the first law.
    pub fn all(&self) -> std::slice::Iter<'_, Law> {
        self.laws.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Law> {
        self.laws.iter().find(|law| law.id == id)
    }

    pub fn len(&self) -> usize {
        self.laws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laws.is_empty()
    }
}

impl FromIterator<Law> for LawBook {
    fn from_iter<I: IntoIterator<Item = Law>>(iter: I) -> Self {
        let mut book = LawBook::new();
        for law in iter {
            book.add(law);
        }
        book
    }
}

impl<'a> IntoIterator for &'a LawBook {
    type Item = &'a Law;
    type IntoIter = std::slice::Iter<'a, Law>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}
