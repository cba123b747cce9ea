//! The engine: owns every registry and routes host events to them.
//!
//! The host page drives an [`Engine`] with plain calls:
//!
//! ```
//! use choreo::prelude::*;
//!
//! let mut engine = Engine::new().viewport(1280.0, 800.0);
//! let card = engine
//!     .elements_mut()
//!     .insert("about/card", Rect::new(0.0, 1400.0, 600.0, 300.0));
//!
//! let scope = engine.open_scope(None).unwrap();
//! let entrance = Clip::new(card)
//!     .from_to(Property::Y, 80.0, 0.0)
//!     .from_to(Property::Opacity, 0.0, 1.0)
//!     .duration(800.0);
//! engine
//!     .register_trigger(
//!         scope,
//!         Trigger::fire_once(card, entrance).start("top 80%".parse().unwrap()),
//!     )
//!     .unwrap();
//!
//! engine.scroll_to(900.0, 0.0);
//! engine.tick(16.0);
//! let writes = engine.take_writes();
//! assert!(!writes.is_empty());
//! ```
//!
//! Every call that takes a timestamp also advances the engine clock, which
//! scroll velocity is sampled against. Timelines started by a registration
//! or a trigger take their first frame from the next `tick`, so content
//! that fires before the host's first frame still animates in full.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use crate::animation::{Timeline, Transform};
use crate::effector::{
    Effector, EffectorId, EffectorSet, Follower, FollowerId, FollowerSet, Hover, HoverId, HoverSet,
};
use crate::element::{ElementArena, ElementId};
use crate::error::{ChoreoError, Result};
use crate::geometry::{Point, Size};
use crate::looper::{Looper, LooperId, LooperSet};
use crate::sample::{Interest, Listener, SampleHub, SubscriptionId};
use crate::scheduler::{AnimationId, PlayState, Scheduler};
use crate::scope::{Resource, ScopeArena, ScopeId, Snapshot};
use crate::style::{ArenaSink, Property, PropertyWrite, Style};
use crate::trigger::{ScrollInput, Trigger, TriggerAction, TriggerId, TriggerRegistry};

pub struct EngineConfig {
    /// Initial viewport size, replaced by [`Engine::resize`].
    pub viewport: Size,
    /// Scroll velocity older than this reads as zero.
    pub velocity_stale_ms: f64,
    /// Share of the remaining distance a smoothed scrub closes per
    /// smoothing period.
    pub scrub_catch_up: f32,
    /// Put overwritten style values back when a scope is reverted.
    pub restore_on_revert: bool,
    /// Honour [`Engine::set_reduced_motion`].
    pub respect_reduced_motion: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: Size::new(1280.0, 800.0),
            velocity_stale_ms: 100.0,
            scrub_catch_up: 0.95,
            restore_on_revert: true,
            respect_reduced_motion: false,
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    elements: ElementArena,
    writes: Vec<PropertyWrite>,
    scheduler: Scheduler,
    triggers: TriggerRegistry,
    loopers: LooperSet,
    effectors: EffectorSet,
    followers: FollowerSet,
    hovers: HoverSet,
    scopes: ScopeArena,
    hub: SampleHub,
    subscriptions: HashMap<Listener, SubscriptionId>,
    reduced_motion: bool,
    clock: f64,
    last_tick: Option<f64>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            hub: SampleHub::new(config.viewport),
            config,
            elements: ElementArena::new(),
            writes: Vec::new(),
            scheduler: Scheduler::new(),
            triggers: TriggerRegistry::new(),
            loopers: LooperSet::new(),
            effectors: EffectorSet::new(),
            followers: FollowerSet::new(),
            hovers: HoverSet::new(),
            scopes: ScopeArena::new(),
            subscriptions: HashMap::new(),
            reduced_motion: false,
            clock: 0.0,
            last_tick: None,
        }
    }

    pub fn viewport(mut self, width: f32, height: f32) -> Self {
        self.config.viewport = Size::new(width, height);
        self.hub.set_viewport(self.config.viewport);
        self
    }

    pub fn velocity_stale_ms(mut self, window_ms: f64) -> Self {
        self.config.velocity_stale_ms = window_ms.max(0.0);
        self
    }

    pub fn scrub_catch_up(mut self, ratio: f32) -> Self {
        self.config.scrub_catch_up = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn restore_on_revert(mut self, restore: bool) -> Self {
        self.config.restore_on_revert = restore;
        self
    }

    pub fn respect_reduced_motion(mut self, respect: bool) -> Self {
        self.config.respect_reduced_motion = respect;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn elements(&self) -> &ElementArena {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut ElementArena {
        &mut self.elements
    }

    pub fn style(&self, element: ElementId) -> Option<&Style> {
        self.elements.style(element)
    }

    /// Displayed transform of `element`, derived from its style.
    pub fn transform(&self, element: ElementId) -> Option<Transform> {
        let node = self.elements.get(element)?;
        let size = Size::new(node.bounds.width, node.bounds.height);
        Some(Transform::from_style(&node.style, size))
    }

    fn visual_center(&self, element: ElementId) -> Option<Point> {
        let node = self.elements.get(element)?;
        Some(self.transform(element)?.visual_center(node.bounds))
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    pub fn loopers(&self) -> &LooperSet {
        &self.loopers
    }

    pub fn effectors(&self) -> &EffectorSet {
        &self.effectors
    }

    pub fn followers(&self) -> &FollowerSet {
        &self.followers
    }

    pub fn hovers(&self) -> &HoverSet {
        &self.hovers
    }

    pub fn sample(&self) -> &SampleHub {
        &self.hub
    }

    pub fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    /// Timestamp of the latest host event.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Drain the property writes made since the last call, in order.
    pub fn take_writes(&mut self) -> Vec<PropertyWrite> {
        std::mem::take(&mut self.writes)
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
        if self.motion_reduced() {
            log::info!("reduced motion requested, finishing running timelines");
            let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
            for id in self.scheduler.ids() {
                if self.scheduler.state(id) == Some(PlayState::Playing) {
                    self.scheduler.finish(id, &mut sink);
                }
            }
        }
    }

    /// Whether reduced motion is both requested and honoured.
    pub fn motion_reduced(&self) -> bool {
        self.config.respect_reduced_motion && self.reduced_motion
    }

    fn advance_clock(&mut self, now: f64) {
        self.clock = self.clock.max(now);
    }

    // ---- scopes ----

    pub fn open_scope(&mut self, parent: Option<ScopeId>) -> Result<ScopeId> {
        let id = self.scopes.open(parent)?;
        log::debug!("opened scope {id}");
        Ok(id)
    }

    /// Open a scope that is reverted when the guard drops.
    pub fn scoped(&mut self, parent: Option<ScopeId>) -> Result<ScopeGuard<'_>> {
        let scope = self.open_scope(parent)?;
        Ok(ScopeGuard {
            engine: self,
            scope,
        })
    }

    /// Tear down everything `scope` created. Calling it again is a no-op.
    pub fn revert(&mut self, scope: ScopeId) {
        let Some(mut teardown) = self.scopes.begin_revert(scope) else {
            log::trace!("scope {scope} already reverted or unknown");
            return;
        };

        for child in &teardown.children {
            self.revert(*child);
        }
        teardown.run_cleanups();
        for resource in teardown.resources.iter().rev() {
            self.release(*resource);
        }
        if self.config.restore_on_revert {
            self.restore(&teardown.snapshot);
        }
        log::debug!(
            "reverted scope {scope} ({} resources)",
            teardown.resources.len()
        );
    }

    /// Revert `old` and open a fresh scope under the same parent, for when
    /// a section's element set changes shape.
    pub fn remount(&mut self, old: ScopeId) -> Result<ScopeId> {
        let parent = self.scopes.parent(old);
        self.revert(old);
        self.open_scope(parent)
    }

    pub fn on_cleanup(&mut self, scope: ScopeId, f: impl FnOnce() + 'static) -> Result<()> {
        self.scopes.on_cleanup(scope, f)
    }

    fn release(&mut self, resource: Resource) {
        match resource {
            Resource::Animation(id) => {
                self.scheduler.remove(id);
            }
            Resource::Trigger(id) => {
                self.unregister_trigger(id);
            }
            Resource::Looper(id) => {
                self.stop_looper(id);
            }
            Resource::Effector(id) => {
                self.detach_effector(id);
            }
            Resource::Follower(id) => {
                self.unfollow(id);
            }
            Resource::Hover(id) => {
                self.remove_hover(id);
            }
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        for (&(element, property), previous) in snapshot {
            let Some(node) = self.elements.get_mut(element) else {
                continue;
            };
            match previous {
                Some(value) => node.style.set(property, *value),
                None => node.style.clear(property),
            }
            self.writes.push(PropertyWrite {
                element,
                property,
                value: previous.unwrap_or_else(|| property.rest_value()),
            });
        }
    }

    fn subscribe(&mut self, listener: Listener, interest: Interest) {
        let id = self.hub.subscribe(listener, interest);
        self.subscriptions.insert(listener, id);
    }

    fn unsubscribe(&mut self, listener: Listener) {
        if let Some(id) = self.subscriptions.remove(&listener) {
            self.hub.unsubscribe(id);
        }
    }

    /// Checks shared by every registration: the scope is live and every
    /// element exists.
    fn admit(&self, scope: ScopeId, elements: impl IntoIterator<Item = ElementId>) -> Result<()> {
        if let Err(err) = self.scopes.check_live(scope) {
            log::debug!("registration ignored: {err}");
            return Err(err);
        }
        for element in elements {
            if !self.elements.contains(element) {
                let err = ChoreoError::MissingTarget(element);
                log::warn!("registration skipped in scope {scope}: {err}");
                return Err(err);
            }
        }
        Ok(())
    }

    fn remember(
        &mut self,
        scope: ScopeId,
        footprint: impl IntoIterator<Item = (ElementId, Property)>,
    ) -> Result<()> {
        for (element, property) in footprint {
            let previous = self
                .elements
                .style(element)
                .and_then(|s| s.explicit(property));
            self.scopes.remember(scope, element, property, previous)?;
        }
        Ok(())
    }

    // ---- timelines ----

    fn insert_timeline(&mut self, scope: ScopeId, timeline: Timeline) -> Result<AnimationId> {
        self.admit(scope, timeline.targets())?;
        self.remember(scope, timeline.footprint())?;
        let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
        let id = self.scheduler.insert(timeline, &mut sink);
        self.scopes.adopt(scope, Resource::Animation(id))?;
        Ok(id)
    }

    /// Register a timeline and start playing it right away.
    pub fn animate(
        &mut self,
        scope: ScopeId,
        timeline: impl Into<Timeline>,
    ) -> Result<AnimationId> {
        let id = self.insert_timeline(scope, timeline.into())?;
        self.play(id);
        Ok(id)
    }

    /// Register a timeline without playing it; its explicit start values
    /// render immediately.
    pub fn add_timeline(
        &mut self,
        scope: ScopeId,
        timeline: impl Into<Timeline>,
    ) -> Result<AnimationId> {
        self.insert_timeline(scope, timeline.into())
    }

    /// Play or resume from the next tick. With reduced motion honoured the
    /// timeline jumps straight to its end.
    pub fn play(&mut self, id: AnimationId) {
        let reduced = self.motion_reduced();
        let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
        if reduced {
            self.scheduler.finish(id, &mut sink);
        } else {
            self.scheduler.play(id, &mut sink);
        }
    }

    pub fn pause(&mut self, id: AnimationId) {
        self.scheduler.pause(id);
    }

    pub fn restart(&mut self, id: AnimationId) {
        let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
        self.scheduler.restart(id, &mut sink);
    }

    pub fn seek(&mut self, id: AnimationId, progress: f32) {
        let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
        self.scheduler.seek(id, progress, &mut sink);
    }

    pub fn finish(&mut self, id: AnimationId) {
        let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
        self.scheduler.finish(id, &mut sink);
    }

    pub fn animation_state(&self, id: AnimationId) -> Option<PlayState> {
        self.scheduler.state(id)
    }

    // ---- triggers ----

    /// Register a scroll trigger and evaluate it once against the current
    /// scroll position, so content already past its threshold fires now.
    pub fn register_trigger(&mut self, scope: ScopeId, mut trigger: Trigger) -> Result<TriggerId> {
        self.admit(scope, [trigger.target()])?;
        let animation = match trigger.take_timeline() {
            Some(timeline) => Some(self.insert_timeline(scope, timeline)?),
            None => None,
        };

        let smoothed = trigger.is_smoothed();
        let id = self.triggers.register(trigger, animation);
        self.scopes.adopt(scope, Resource::Trigger(id))?;

        let mut interest = Interest::SCROLL | Interest::RESIZE;
        if smoothed {
            interest |= Interest::TICK;
        }
        self.subscribe(Listener::Trigger(id), interest);

        let input = self.scroll_input();
        self.evaluate_trigger(id, &input);
        Ok(id)
    }

    pub fn unregister_trigger(&mut self, id: TriggerId) -> bool {
        self.unsubscribe(Listener::Trigger(id));
        self.triggers.unregister(id)
    }

    fn scroll_input(&self) -> ScrollInput {
        let scroll = self.hub.scroll();
        ScrollInput {
            scroll: scroll.position,
            velocity: scroll.velocity_at(self.clock, self.config.velocity_stale_ms),
            viewport: self.hub.viewport(),
        }
    }

    fn evaluate_trigger(&mut self, id: TriggerId, input: &ScrollInput) {
        let Some(target) = self.triggers.target(id) else {
            return;
        };
        let Some(bounds) = self.elements.bounds(target) else {
            log::trace!("trigger {id:?} target {target:?} is gone, skipping");
            return;
        };
        if let Some(action) = self.triggers.evaluate(id, bounds, input) {
            self.apply_trigger_action(action);
        }
    }

    fn evaluate_triggers(&mut self, interest: Interest) {
        let input = self.scroll_input();
        for listener in self.hub.listeners(interest) {
            if let Listener::Trigger(id) = listener {
                self.evaluate_trigger(id, &input);
            }
        }
    }

    fn apply_trigger_action(&mut self, action: TriggerAction) {
        match action {
            TriggerAction::Play(animation) => self.play(animation),
            TriggerAction::Seek(animation, progress) => self.seek(animation, progress),
        }
    }

    // ---- loopers ----

    /// Start a looper. Without an explicit wrap length it wraps at half the
    /// target's width.
    pub fn add_looper(&mut self, scope: ScopeId, looper: Looper) -> Result<LooperId> {
        self.admit(scope, [looper.target()])?;
        self.remember(scope, [(looper.target(), looper.property_written())])?;
        let fallback = self
            .elements
            .bounds(looper.target())
            .map_or(0.0, |b| b.width / 2.0);

        let id = self.loopers.start(looper, fallback);
        self.scopes.adopt(scope, Resource::Looper(id))?;
        self.subscribe(Listener::Looper(id), Interest::TICK);
        Ok(id)
    }

    pub fn stop_looper(&mut self, id: LooperId) -> bool {
        self.unsubscribe(Listener::Looper(id));
        self.loopers.stop(id)
    }

    // ---- pointer effects ----

    pub fn attach_effector(&mut self, scope: ScopeId, effector: Effector) -> Result<EffectorId> {
        let elements: Vec<_> = std::iter::once(effector.region())
            .chain(effector.items())
            .collect();
        self.admit(scope, elements)?;
        self.remember(scope, effector.footprint())?;

        let id = self.effectors.attach(effector);
        self.scopes.adopt(scope, Resource::Effector(id))?;
        self.subscribe(Listener::Effector(id), Interest::POINTER | Interest::TICK);
        Ok(id)
    }

    pub fn detach_effector(&mut self, id: EffectorId) -> bool {
        self.unsubscribe(Listener::Effector(id));
        self.effectors.detach(id)
    }

    pub fn follow(&mut self, scope: ScopeId, follower: Follower) -> Result<FollowerId> {
        let elements: Vec<_> = std::iter::once(follower.target())
            .chain(follower.region())
            .collect();
        self.admit(scope, elements)?;
        self.remember(scope, follower.footprint())?;

        let id = self.followers.follow(follower);
        self.scopes.adopt(scope, Resource::Follower(id))?;
        self.subscribe(Listener::Follower(id), Interest::POINTER | Interest::TICK);
        Ok(id)
    }

    pub fn unfollow(&mut self, id: FollowerId) -> bool {
        self.unsubscribe(Listener::Follower(id));
        self.followers.unfollow(id)
    }

    /// Play `hover`'s enter clip when the pointer enters its region and the
    /// leave clip when it leaves.
    pub fn add_hover(&mut self, scope: ScopeId, hover: Hover) -> Result<HoverId> {
        self.admit(scope, hover.elements())?;
        self.remember(scope, hover.footprint())?;

        let id = self.hovers.add(hover);
        self.scopes.adopt(scope, Resource::Hover(id))?;
        self.subscribe(Listener::Hover(id), Interest::POINTER | Interest::TICK);
        Ok(id)
    }

    pub fn remove_hover(&mut self, id: HoverId) -> bool {
        self.unsubscribe(Listener::Hover(id));
        self.hovers.remove(id)
    }

    // ---- host events ----

    /// The document scrolled to `y`.
    pub fn scroll_to(&mut self, y: f32, now: f64) {
        self.advance_clock(now);
        self.hub.record_scroll(y, now);
        self.evaluate_triggers(Interest::SCROLL);
    }

    pub fn resize(&mut self, width: f32, height: f32, now: f64) {
        self.advance_clock(now);
        self.hub.set_viewport(Size::new(width, height));
        self.evaluate_triggers(Interest::RESIZE);
    }

    /// Re-evaluate every trigger, e.g. after element bounds changed.
    pub fn refresh(&mut self) {
        self.evaluate_triggers(Interest::SCROLL | Interest::RESIZE);
    }

    /// Pointer moved to `(x, y)` in client coordinates.
    pub fn pointer_move(&mut self, x: f32, y: f32, now: f64) {
        self.advance_clock(now);
        let client = Point::new(x, y);
        self.hub.record_pointer(client);
        if self.motion_reduced() {
            return;
        }
        let Some(pointer) = self.hub.pointer_in_document() else {
            return;
        };

        for listener in self.hub.listeners(Interest::POINTER) {
            match listener {
                Listener::Effector(id) => {
                    let Some(effector) = self.effectors.get(id) else {
                        continue;
                    };
                    let Some(region) = self.elements.bounds(effector.region()) else {
                        continue;
                    };
                    let centers: Vec<_> = effector
                        .items()
                        .map(|element| self.visual_center(element))
                        .collect();
                    let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
                    self.effectors
                        .pointer_move(id, pointer, region, &centers, now, &mut sink);
                }
                Listener::Follower(id) => {
                    let Some(follower) = self.followers.get(id) else {
                        continue;
                    };
                    let inside = match follower.region() {
                        Some(region) => self
                            .elements
                            .bounds(region)
                            .is_some_and(|b| b.contains(pointer)),
                        None => true,
                    };
                    let sink = ArenaSink::new(&mut self.elements, &mut self.writes);
                    self.followers.pointer_move(id, client, inside, now, &sink);
                }
                Listener::Hover(id) => {
                    let Some(region) = self
                        .hovers
                        .get(id)
                        .and_then(|hover| self.elements.bounds(hover.region()))
                    else {
                        continue;
                    };
                    let sink = ArenaSink::new(&mut self.elements, &mut self.writes);
                    self.hovers.pointer_move(id, pointer, region, now, &sink);
                }
                Listener::Trigger(_) | Listener::Looper(_) => {}
            }
        }
    }

    /// The pointer left the window.
    pub fn pointer_exit(&mut self, now: f64) {
        self.advance_clock(now);
        self.hub.clear_pointer();
        for listener in self.hub.listeners(Interest::POINTER) {
            let sink = ArenaSink::new(&mut self.elements, &mut self.writes);
            match listener {
                Listener::Effector(id) => self.effectors.pointer_leave(id, now, &sink),
                Listener::Hover(id) => self.hovers.pointer_leave(id, now, &sink),
                _ => {}
            }
        }
    }

    /// Advance every running animation to the frame time `now`.
    pub fn tick(&mut self, now: f64) {
        self.advance_clock(now);
        let dt = self.last_tick.map_or(0.0, |last| (now - last).max(0.0));
        self.last_tick = Some(now);

        {
            let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
            self.scheduler.tick(now, &mut sink);
        }

        let velocity = self
            .hub
            .scroll()
            .velocity_at(now, self.config.velocity_stale_ms);
        let reduced = self.motion_reduced();
        for listener in self.hub.listeners(Interest::TICK) {
            match listener {
                Listener::Trigger(id) => {
                    if let Some(action) =
                        self.triggers
                            .advance_smoothing(id, dt, self.config.scrub_catch_up)
                    {
                        self.apply_trigger_action(action);
                    }
                }
                Listener::Looper(id) if reduced => self.loopers.hold(id, now),
                Listener::Looper(id) => {
                    let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
                    self.loopers.tick(id, now, velocity, &mut sink);
                }
                Listener::Effector(id) => {
                    let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
                    self.effectors.tick(id, now, &mut sink);
                }
                Listener::Follower(id) => {
                    let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
                    self.followers.tick(id, now, &mut sink);
                }
                Listener::Hover(id) => {
                    let mut sink = ArenaSink::new(&mut self.elements, &mut self.writes);
                    self.hovers.tick(id, now, &mut sink);
                }
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// A scope that reverts itself when dropped. Dereferences to the engine so
/// registrations can go through the guard.
pub struct ScopeGuard<'a> {
    engine: &'a mut Engine,
    scope: ScopeId,
}

impl ScopeGuard<'_> {
    pub fn id(&self) -> ScopeId {
        self.scope
    }
}

impl Deref for ScopeGuard<'_> {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        self.engine
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Engine {
        self.engine
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.engine.revert(self.scope);
    }
}
