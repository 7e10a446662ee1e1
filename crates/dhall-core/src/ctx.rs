//! Persistent shadow-stack contexts.
//!
//! A [`ShadowCtx`] maps names to a stack of entries and remembers every
//! insertion, even after it has been shadowed by a newer binding of the same
//! name. Lookups address an entry by `(name, index)` where index 0 is the
//! innermost binding. Each insertion also records the context's generation at
//! the time, which lets [`ShadowCtx::age`] recover how many insertions
//! happened since a given binding was pushed — the quantity alpha-
//! normalization uses as a De Bruijn index, because every binder performs
//! exactly one `shadow`.
//!
//! Contexts are immutable: `shadow` and `join` return a new context and leave
//! the receiver untouched. The map itself is copied, but entry payloads are
//! cheap to clone everywhere this type is used (labels, `Rc`-backed
//! closures).

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::expr::Label;

/// Per-name stack of entries. Shadowing deeper than two levels is rare in
/// real configurations, so two slots live inline.
type Stack<T> = SmallVec<[(T, usize); 2]>;

/// An immutable mapping from names to stacks of entries.
#[derive(Debug, Clone)]
pub struct ShadowCtx<T> {
    entries: AHashMap<Label, Stack<T>>,
    /// Bumped once per `shadow`; used only for ordering, never for identity.
    generation: usize,
}

impl<T: Clone> ShadowCtx<T> {
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
            generation: 0,
        }
    }

    /// Pushes a new binding for `name`, shadowing any existing ones.
    pub fn shadow(&self, name: Label, entry: T) -> Self {
        let generation = self.generation + 1;
        let mut entries = self.entries.clone();
        entries.entry(name).or_default().push((entry, generation));
        Self { entries, generation }
    }

    /// True if `name` has a binding at depth `index` (0 = innermost).
    pub fn has(&self, name: &Label, index: usize) -> bool {
        self.entries
            .get(name)
            .is_some_and(|stack| stack.len() > index)
    }

    /// The entry for `name` at depth `index` from the top of its stack.
    pub fn get(&self, name: &Label, index: usize) -> Option<&T> {
        let stack = self.entries.get(name)?;
        let slot = stack.len().checked_sub(index + 1)?;
        stack.get(slot).map(|(entry, _)| entry)
    }

    /// How many insertions (into the whole context) happened after the
    /// addressed binding was pushed.
    ///
    /// `None` if the binding is absent, or if it was carried in by
    /// [`ShadowCtx::join`] from a context with a newer generation —
    /// generations order insertions, they never identify them, so such an
    /// entry has no meaningful age here.
    pub fn age(&self, name: &Label, index: usize) -> Option<usize> {
        let stack = self.entries.get(name)?;
        let slot = stack.len().checked_sub(index + 1)?;
        stack
            .get(slot)
            .and_then(|&(_, r#gen)| self.generation.checked_sub(r#gen))
    }

    /// Concatenates `other`'s stacks on top of `self`'s, for every name.
    ///
    /// The joined context keeps the receiver's generation; the entries
    /// carried over from `other` keep the generations they were inserted
    /// with.
    pub fn join(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (name, stack) in &other.entries {
            entries
                .entry(name.clone())
                .or_default()
                .extend(stack.iter().cloned());
        }
        Self {
            entries,
            generation: self.generation,
        }
    }
}

impl<T: Clone> Default for ShadowCtx<T> {
    fn default() -> Self {
        Self::new()
    }
}
