//! Insertion-ordered, key-unique parameter store backing the eager codes.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub(crate) struct Params {
    entries: Vec<(String, String)>,
    /// Key → position in `entries`.
    index: HashMap<String, usize>,
}

impl Params {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or overwrite. An overwritten key keeps its position.
    pub(crate) fn insert(&mut self, key: String, value: String) -> Option<String> {
        if let Some(&i) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[i].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    /// Insert, moving an existing key to the end. Used while reading token
    /// text, where a repeated key counts at its last occurrence.
    pub(crate) fn push_last(&mut self, key: String, value: String) {
        self.remove(&key);
        self.insert(key, value);
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<String> {
        let i = self.index.remove(key)?;
        let (_, value) = self.entries.remove(i);
        for pos in self.index.values_mut() {
            if *pos > i {
                *pos -= 1;
            }
        }
        Some(value)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
