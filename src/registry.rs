use crate::effect::Effect;
use std::collections::HashMap;

pub(crate) struct Entry {
    pub(crate) name: String,
    pub(crate) effect: Effect,
    pub(crate) faults: u32,
}

/// Registered effects by name, kept in activation order.
///
/// Entries are never replaced or removed once registered.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new entry's position, or `None` if the name is taken.
    pub(crate) fn insert(&mut self, name: String, effect: Effect) -> Option<usize> {
        if self.index.contains_key(&name) {
            return None;
        }
        let idx = self.entries.len();
        self.index.insert(name.clone(), idx);
        self.entries.push(Entry {
            name,
            effect,
            faults: 0,
        });
        Some(idx)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn name(&self, idx: usize) -> Option<&str> {
        self.entries.get(idx).map(|e| e.name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn faults(&self, name: &str) -> Option<u32> {
        self.position(name).map(|i| self.entries[i].faults)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut Entry> {
        self.entries.get_mut(idx)
    }

    /// Position after `current`, wrapping. A missing current restarts at 0.
    pub fn next_after(&self, current: Option<usize>) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        match current {
            Some(i) if i < self.entries.len() => Some((i + 1) % self.entries.len()),
            _ => Some(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Effect {
        Effect::bare(|_, _, _| Ok(None))
    }

    #[test]
    fn first_registration_wins() {
        let mut r = Registry::new();
        assert_eq!(r.insert("a".into(), noop()), Some(0));
        assert_eq!(r.insert("a".into(), noop()), None);
        assert_eq!(r.insert("b".into(), noop()), Some(1));
        assert_eq!(r.names().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn next_wraps_and_recovers_from_stale_index() {
        let mut r = Registry::new();
        assert_eq!(r.next_after(None), None);
        for n in ["a", "b", "c"] {
            r.insert(n.into(), noop());
        }
        assert_eq!(r.next_after(Some(0)), Some(1));
        assert_eq!(r.next_after(Some(2)), Some(0));
        assert_eq!(r.next_after(Some(9)), Some(0));
        assert_eq!(r.next_after(None), Some(0));
    }
}
