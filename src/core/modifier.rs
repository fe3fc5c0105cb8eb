//! Modifier registry — named text transforms applied after a tag expands.
//!
//! The engine ships no modifiers of its own; callers register whatever
//! catalog they need (capitalization, articles, plurals, ...).

use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A text transform: receives the tag's text so far and the parameters
/// given as `#sym.name(a,b)#`.
pub type Modifier = Arc<dyn Fn(&str, &[String]) -> String + Send + Sync>;

/// Wrap a closure as a [`Modifier`].
pub fn modifier<F>(f: F) -> Modifier
where
    F: Fn(&str, &[String]) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Modifiers by name. Later registrations replace earlier ones.
#[derive(Clone, Default)]
pub struct ModifierRegistry {
    modifiers: FxHashMap<String, Modifier>,
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, modifier: Modifier) {
        self.modifiers.insert(name.into(), modifier);
    }

    pub fn get(&self, name: &str) -> Option<&Modifier> {
        self.modifiers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modifiers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modifiers.keys().map(String::as_str)
    }
}

impl<K: Into<String>> Extend<(K, Modifier)> for ModifierRegistry {
    fn extend<I: IntoIterator<Item = (K, Modifier)>>(&mut self, iter: I) {
        for (name, modifier) in iter {
            self.insert(name, modifier);
        }
    }
}

impl std::fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ModifierRegistry")
            .field("modifiers", &names)
            .finish()
    }
}
