//! Infinite marquee loops whose speed follows the scroll velocity.
//!
//! The caller lays the looped content out twice, so translating by one
//! copy's extent looks exactly like translating by zero. The looper keeps
//! an offset in `[0, wrap)` and subtracts the wrap length whenever the
//! offset reaches it, which keeps the apparent motion continuous.

use std::collections::BTreeMap;

use crate::element::ElementId;
use crate::style::{Property, PropertySink};

/// Default clamp when none is configured, as a multiple of the base rate.
pub const DEFAULT_MAX_RATE_FACTOR: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopDirection {
    /// Content travels toward negative values (leftward marquee).
    #[default]
    Backward,
    Forward,
}

impl LoopDirection {
    fn sign(self) -> f32 {
        match self {
            LoopDirection::Backward => -1.0,
            LoopDirection::Forward => 1.0,
        }
    }
}

/// base × (1 + coupling × |velocity|), clamped to `max_rate`.
pub fn effective_rate(base_rate: f32, coupling: f32, max_rate: f32, velocity: f32) -> f32 {
    (base_rate * (1.0 + coupling * velocity.abs())).min(max_rate)
}

#[derive(Debug, Clone)]
pub struct Looper {
    target: ElementId,
    base_rate: f32,
    coupling: f32,
    max_rate: Option<f32>,
    wrap_length: Option<f32>,
    direction: LoopDirection,
    property: Property,
}

impl Looper {
    /// Loop `target` at `base_rate` px/s with no velocity coupling.
    pub fn new(target: ElementId, base_rate: f32) -> Self {
        Self {
            target,
            base_rate: base_rate.max(0.0),
            coupling: 0.0,
            max_rate: None,
            wrap_length: None,
            direction: LoopDirection::default(),
            property: Property::X,
        }
    }

    /// Extra speed per px/s of scroll velocity.
    pub fn coupling(mut self, coefficient: f32) -> Self {
        self.coupling = coefficient.max(0.0);
        self
    }

    pub fn max_rate(mut self, max_rate: f32) -> Self {
        self.max_rate = Some(max_rate.max(0.0));
        self
    }

    /// Distance after which the content repeats. Defaults to half the
    /// target's width.
    pub fn wrap_length(mut self, wrap_length: f32) -> Self {
        self.wrap_length = Some(wrap_length.max(0.0));
        self
    }

    pub fn direction(mut self, direction: LoopDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Property the offset is written to, `X` unless changed.
    pub fn property(mut self, property: Property) -> Self {
        self.property = property;
        self
    }

    pub fn target(&self) -> ElementId {
        self.target
    }

    pub fn property_written(&self) -> Property {
        self.property
    }

    pub fn wrap_length_or(&self, fallback: f32) -> f32 {
        self.wrap_length.unwrap_or(fallback)
    }

    pub fn rate_at(&self, velocity: f32) -> f32 {
        let max = self
            .max_rate
            .unwrap_or(self.base_rate * DEFAULT_MAX_RATE_FACTOR);
        effective_rate(self.base_rate, self.coupling, max, velocity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LooperId(u32);

#[cfg(test)]
impl LooperId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

#[derive(Debug)]
struct Running {
    looper: Looper,
    wrap: f32,
    offset: f32,
    last_tick: Option<f64>,
}

/// Every looper currently running.
#[derive(Debug, Default)]
pub struct LooperSet {
    running: BTreeMap<LooperId, Running>,
    next_id: u32,
}

impl LooperSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `looper` with its wrap length resolved against `fallback_wrap`.
    pub fn start(&mut self, looper: Looper, fallback_wrap: f32) -> LooperId {
        let id = LooperId(self.next_id);
        self.next_id += 1;

        let wrap = looper.wrap_length_or(fallback_wrap).max(0.0);
        if wrap <= 0.0 {
            log::debug!("looper {id:?} has no wrap length, it will not move");
        }
        self.running.insert(
            id,
            Running {
                looper,
                wrap,
                offset: 0.0,
                last_tick: None,
            },
        );
        id
    }

    pub fn stop(&mut self, id: LooperId) -> bool {
        self.running.remove(&id).is_some()
    }

    pub fn contains(&self, id: LooperId) -> bool {
        self.running.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Internal offset in `[0, wrap)`.
    pub fn offset(&self, id: LooperId) -> Option<f32> {
        self.running.get(&id).map(|r| r.offset)
    }

    pub fn rate(&self, id: LooperId, velocity: f32) -> Option<f32> {
        self.running.get(&id).map(|r| r.looper.rate_at(velocity))
    }

    /// Advance one looper to `now`. The rate is recomputed from `velocity`
    /// on every call. The first tick only records the clock.
    pub fn tick(&mut self, id: LooperId, now: f64, velocity: f32, sink: &mut dyn PropertySink) {
        let Some(run) = self.running.get_mut(&id) else {
            return;
        };
        let dt = run.last_tick.map_or(0.0, |last| (now - last).max(0.0));
        run.last_tick = Some(now);
        if run.wrap <= 0.0 {
            return;
        }

        let rate = run.looper.rate_at(velocity);
        run.offset += rate * (dt / 1000.0) as f32;
        if run.offset >= run.wrap {
            run.offset -= run.wrap * (run.offset / run.wrap).floor();
        }
        sink.write(
            run.looper.target,
            run.looper.property,
            run.looper.direction.sign() * run.offset,
        );
    }

    /// Keep a paused looper's clock current without moving it, so the next
    /// real tick does not make up for the time it was held.
    pub fn hold(&mut self, id: LooperId, now: f64) {
        if let Some(run) = self.running.get_mut(&id) {
            run.last_tick = Some(now);
        }
    }

    pub fn ids(&self) -> Vec<LooperId> {
        self.running.keys().copied().collect()
    }
}
