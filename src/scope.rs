//! Scopes: joint lifetime of everything a page section creates.
//!
//! A section opens a scope when it mounts and registers its timelines,
//! triggers, loopers, effectors and followers against it. Reverting the
//! scope tears all of them down together:
//!
//! 1. child scopes are reverted first (depth-first)
//! 2. cleanup callbacks run in reverse order (LIFO)
//! 3. animations stop, triggers unregister, loopers stop, pointer effects
//!    and hovers detach, and with them their subscriptions to the sample
//! 4. every style value the scope overwrote is put back
//!
//! Reverting twice is a no-op. The arena keeps reverted scopes around as
//! tombstones so that late calls against them can be told apart from calls
//! against scopes that never existed.

use std::collections::BTreeMap;
use std::fmt;

use crate::effector::{EffectorId, FollowerId, HoverId};
use crate::element::ElementId;
use crate::error::{ChoreoError, Result};
use crate::looper::LooperId;
use crate::scheduler::AnimationId;
use crate::style::Property;
use crate::trigger::TriggerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something a scope owns and must release on revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Animation(AnimationId),
    Trigger(TriggerId),
    Looper(LooperId),
    Effector(EffectorId),
    Follower(FollowerId),
    Hover(HoverId),
}

/// Style values as they were before a scope first wrote them. `None`
/// means the property had no inline value.
pub type Snapshot = BTreeMap<(ElementId, Property), Option<f32>>;

struct Scope {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    resources: Vec<Resource>,
    cleanups: Vec<Box<dyn FnOnce()>>,
    snapshot: Snapshot,
    reverted: bool,
}

impl Scope {
    fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            resources: Vec::new(),
            cleanups: Vec::new(),
            snapshot: Snapshot::new(),
            reverted: false,
        }
    }
}

/// Everything a scope held at the moment it was reverted.
pub struct Teardown {
    pub children: Vec<ScopeId>,
    pub resources: Vec<Resource>,
    pub snapshot: Snapshot,
    cleanups: Vec<Box<dyn FnOnce()>>,
}

impl Teardown {
    /// Run cleanup callbacks, last registered first.
    pub fn run_cleanups(&mut self) {
        for cleanup in self.cleanups.drain(..).rev() {
            cleanup();
        }
    }
}

/// Arena of scopes, indexed by [`ScopeId`].
#[derive(Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope, nested under `parent` if given.
    pub fn open(&mut self, parent: Option<ScopeId>) -> Result<ScopeId> {
        if let Some(parent) = parent {
            self.check_live(parent)?;
        }
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(parent));
        if let Some(p) = parent.and_then(|parent| self.scopes.get_mut(parent.0)) {
            p.children.push(id);
        }
        Ok(id)
    }

    /// `Ok` if `id` exists and has not been reverted.
    pub fn check_live(&self, id: ScopeId) -> Result<()> {
        match self.scopes.get(id.0) {
            None => Err(ChoreoError::UnknownScope(id)),
            Some(scope) if scope.reverted => Err(ChoreoError::ScopeReverted(id)),
            Some(_) => Ok(()),
        }
    }

    pub fn is_reverted(&self, id: ScopeId) -> bool {
        self.scopes.get(id.0).is_some_and(|s| s.reverted)
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes.get(id.0).and_then(|s| s.parent)
    }

    /// Live child scopes of `id`.
    pub fn children(&self, id: ScopeId) -> &[ScopeId] {
        self.scopes.get(id.0).map_or(&[], |s| &s.children)
    }

    pub fn resources(&self, id: ScopeId) -> &[Resource] {
        self.scopes.get(id.0).map_or(&[], |s| &s.resources)
    }

    fn live_mut(&mut self, id: ScopeId) -> Result<&mut Scope> {
        self.check_live(id)?;
        self.scopes
            .get_mut(id.0)
            .ok_or(ChoreoError::UnknownScope(id))
    }

    pub fn adopt(&mut self, id: ScopeId, resource: Resource) -> Result<()> {
        self.live_mut(id)?.resources.push(resource);
        Ok(())
    }

    pub fn on_cleanup(&mut self, id: ScopeId, f: impl FnOnce() + 'static) -> Result<()> {
        self.live_mut(id)?.cleanups.push(Box::new(f));
        Ok(())
    }

    /// Remember `previous` as the value to restore for `(element, property)`
    /// unless the scope already holds an earlier one.
    pub fn remember(
        &mut self,
        id: ScopeId,
        element: ElementId,
        property: Property,
        previous: Option<f32>,
    ) -> Result<()> {
        self.live_mut(id)?
            .snapshot
            .entry((element, property))
            .or_insert(previous);
        Ok(())
    }

    /// Mark `id` reverted and hand back what it owned. `None` when the scope
    /// is unknown or was already reverted.
    pub fn begin_revert(&mut self, id: ScopeId) -> Option<Teardown> {
        let scope = self.scopes.get_mut(id.0)?;
        if scope.reverted {
            return None;
        }
        scope.reverted = true;
        let teardown = Teardown {
            children: std::mem::take(&mut scope.children),
            resources: std::mem::take(&mut scope.resources),
            snapshot: std::mem::take(&mut scope.snapshot),
            cleanups: std::mem::take(&mut scope.cleanups),
        };
        if let Some(p) = scope.parent.and_then(|parent| self.scopes.get_mut(parent.0)) {
            p.children.retain(|child| *child != id);
        }
        Some(teardown)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Scopes that have not been reverted.
    pub fn live_count(&self) -> usize {
        self.scopes.iter().filter(|s| !s.reverted).count()
    }
}
