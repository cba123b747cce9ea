//! Arena of animatable element handles.
//!
//! The host registers every element it wants animated under a stable string
//! key (`"works/grid/3"`, `"hero/letter/0"`) together with its layout bounds.
//! Animations only ever hold [`ElementId`]s; the arena owns bounds and the
//! current inline [`Style`].
//!
//! Sections keep their elements in an [`ElementSet`], which is rebuilt as a
//! whole whenever the rendered shape changes (list vs. grid). Elements of
//! the previous set that are not part of the new one are dropped from the
//! arena, so stale handles stop resolving instead of pointing at removed
//! markup.

use std::collections::{HashMap, HashSet};

use crate::geometry::Rect;
use crate::style::Style;

/// Stable handle of an element in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub key: String,
    /// Layout bounds in document space, without animated transforms.
    pub bounds: Rect,
    pub style: Style,
}

#[derive(Debug, Default)]
pub struct ElementArena {
    nodes: HashMap<ElementId, ElementNode>,
    keys: HashMap<String, ElementId>,
    next_id: u32,
}

impl ElementArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` with `bounds`. An already-known key keeps its id and
    /// only has its bounds updated.
    pub fn insert(&mut self, key: impl Into<String>, bounds: Rect) -> ElementId {
        let key = key.into();
        if let Some(&id) = self.keys.get(&key) {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.bounds = bounds;
            }
            return id;
        }

        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.keys.insert(key.clone(), id);
        self.nodes.insert(
            id,
            ElementNode {
                key,
                bounds,
                style: Style::new(),
            },
        );
        id
    }

    pub fn remove(&mut self, id: ElementId) -> Option<ElementNode> {
        let node = self.nodes.remove(&id)?;
        self.keys.remove(&node.key);
        Some(node)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: ElementId) -> Option<&ElementNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        self.nodes.get_mut(&id)
    }

    pub fn id_of(&self, key: &str) -> Option<ElementId> {
        self.keys.get(key).copied()
    }

    pub fn bounds(&self, id: ElementId) -> Option<Rect> {
        self.nodes.get(&id).map(|n| n.bounds)
    }

    /// Update layout bounds. Returns false if the element is unknown.
    pub fn set_bounds(&mut self, id: ElementId, bounds: Rect) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.bounds = bounds;
                true
            }
            None => false,
        }
    }

    pub fn style(&self, id: ElementId) -> Option<&Style> {
        self.nodes.get(&id).map(|n| &n.style)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Ordered group of elements belonging to one section, in stagger order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSet {
    ids: Vec<ElementId>,
}

impl ElementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh set from `items`, dropping every element of `previous`
    /// whose key does not appear in the new items.
    pub fn rebuild<K, I>(arena: &mut ElementArena, previous: &ElementSet, items: I) -> ElementSet
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Rect)>,
    {
        let ids: Vec<ElementId> = items
            .into_iter()
            .map(|(key, bounds)| arena.insert(key, bounds))
            .collect();

        let kept: HashSet<ElementId> = ids.iter().copied().collect();
        let mut dropped = 0;
        for id in previous.ids.iter().filter(|id| !kept.contains(id)) {
            if arena.remove(*id).is_some() {
                dropped += 1;
            }
        }
        log::debug!(
            "Rebuilt element set: {} elements, {} dropped",
            ids.len(),
            dropped
        );

        ElementSet { ids }
    }

    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn get(&self, index: usize) -> Option<ElementId> {
        self.ids.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
