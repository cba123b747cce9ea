//! Viewport trigger registry.
//!
//! A trigger watches one element against the viewport and drives a bound
//! timeline from the scroll position. Thresholds are written the way page
//! authors think about them, `"<element edge> <viewport edge>"`:
//!
//! ```
//! use choreo::trigger::Threshold;
//!
//! // the element's top reaches 80% of the viewport height
//! let start: Threshold = "top 80%".parse().unwrap();
//! // the element's bottom leaves through the top of the viewport
//! let end: Threshold = "bottom top".parse().unwrap();
//! # let _ = (start, end);
//! ```
//!
//! The registry does not own timelines. Evaluating a trigger yields a
//! [`TriggerAction`] that the engine applies to its scheduler, so the same
//! registry serves fire-once entrances and scrubbed parallax alike.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::animation::Timeline;
use crate::element::ElementId;
use crate::error::ChoreoError;
use crate::geometry::{Rect, Size};
use crate::scheduler::AnimationId;

/// A point along an element or the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Fraction of the extent, `top` = 0, `center` = 0.5, `bottom` = 1.
    Fraction(f32),
    /// Fixed distance from the top edge.
    Pixels(f32),
}

impl Anchor {
    fn resolve(self, extent: f32) -> f32 {
        match self {
            Anchor::Fraction(f) => f * extent,
            Anchor::Pixels(px) => px,
        }
    }
}

impl FromStr for Anchor {
    type Err = ChoreoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChoreoError::InvalidThreshold(s.to_string());
        match s {
            "top" => Ok(Anchor::Fraction(0.0)),
            "center" => Ok(Anchor::Fraction(0.5)),
            "bottom" => Ok(Anchor::Fraction(1.0)),
            _ => {
                if let Some(pct) = s.strip_suffix('%') {
                    let v: f32 = pct.trim().parse().map_err(|_| invalid())?;
                    Ok(Anchor::Fraction(v / 100.0))
                } else {
                    let px = s.strip_suffix("px").unwrap_or(s);
                    px.trim().parse().map(Anchor::Pixels).map_err(|_| invalid())
                }
            }
        }
    }
}

/// Scroll position at which an element anchor meets a viewport anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl Threshold {
    /// Element top meets viewport bottom: the element starts to enter.
    pub const TOP_BOTTOM: Threshold = Threshold::new(Anchor::Fraction(0.0), Anchor::Fraction(1.0));
    /// Element bottom meets viewport top: the element has fully left.
    pub const BOTTOM_TOP: Threshold = Threshold::new(Anchor::Fraction(1.0), Anchor::Fraction(0.0));

    pub const fn new(element: Anchor, viewport: Anchor) -> Self {
        Self { element, viewport }
    }

    /// The document scroll offset at which this threshold is crossed.
    pub fn scroll_position(&self, bounds: Rect, viewport: Size) -> f32 {
        bounds.top() + self.element.resolve(bounds.height) - self.viewport.resolve(viewport.height)
    }
}

impl FromStr for Threshold {
    type Err = ChoreoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(element), Some(viewport), None) => Ok(Threshold::new(
                element
                    .parse()
                    .map_err(|_| ChoreoError::InvalidThreshold(s.to_string()))?,
                viewport
                    .parse()
                    .map_err(|_| ChoreoError::InvalidThreshold(s.to_string()))?,
            )),
            _ => Err(ChoreoError::InvalidThreshold(s.to_string())),
        }
    }
}

pub type ObserveCallback = Box<dyn FnMut(f32, f32)>;

pub enum TriggerMode {
    /// Play the bound timeline once when the start threshold is crossed.
    FireOnce,
    /// Map scroll progress to timeline position. With smoothing, displayed
    /// progress lags behind the scroll position by roughly that many ms.
    Scrub { smoothing_ms: Option<f64> },
    /// Report `(progress, velocity)` while inside the range.
    Observe(ObserveCallback),
}

impl std::fmt::Debug for TriggerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerMode::FireOnce => write!(f, "FireOnce"),
            TriggerMode::Scrub { smoothing_ms } => f
                .debug_struct("Scrub")
                .field("smoothing_ms", smoothing_ms)
                .finish(),
            TriggerMode::Observe(_) => write!(f, "Observe(<fn>)"),
        }
    }
}

/// Description of a trigger, handed to the engine for registration.
#[derive(Debug)]
pub struct Trigger {
    target: ElementId,
    start: Threshold,
    end: Threshold,
    mode: TriggerMode,
    timeline: Option<Timeline>,
}

impl Trigger {
    fn with_mode(target: ElementId, mode: TriggerMode, timeline: Option<Timeline>) -> Self {
        Self {
            target,
            start: Threshold::TOP_BOTTOM,
            end: Threshold::BOTTOM_TOP,
            mode,
            timeline,
        }
    }

    pub fn fire_once(target: ElementId, timeline: impl Into<Timeline>) -> Self {
        Self::with_mode(target, TriggerMode::FireOnce, Some(timeline.into()))
    }

    pub fn scrub(target: ElementId, timeline: impl Into<Timeline>) -> Self {
        Self::with_mode(
            target,
            TriggerMode::Scrub { smoothing_ms: None },
            Some(timeline.into()),
        )
    }

    pub fn observe(target: ElementId, callback: impl FnMut(f32, f32) + 'static) -> Self {
        Self::with_mode(target, TriggerMode::Observe(Box::new(callback)), None)
    }

    pub fn start(mut self, threshold: Threshold) -> Self {
        self.start = threshold;
        self
    }

    pub fn end(mut self, threshold: Threshold) -> Self {
        self.end = threshold;
        self
    }

    /// Lag for scrub triggers; ignored by other modes.
    pub fn smoothing(mut self, smoothing_ms: f64) -> Self {
        if let TriggerMode::Scrub { smoothing_ms: s } = &mut self.mode {
            *s = (smoothing_ms > 0.0).then_some(smoothing_ms);
        }
        self
    }

    pub fn target(&self) -> ElementId {
        self.target
    }

    pub(crate) fn is_smoothed(&self) -> bool {
        matches!(
            self.mode,
            TriggerMode::Scrub {
                smoothing_ms: Some(_)
            }
        )
    }

    pub(crate) fn take_timeline(&mut self) -> Option<Timeline> {
        self.timeline.take()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(u32);

/// What the engine should do to the bound animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerAction {
    Play(AnimationId),
    Seek(AnimationId, f32),
}

/// The shared scroll sample as seen by one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollInput {
    pub scroll: f32,
    /// px/s
    pub velocity: f32,
    pub viewport: Size,
}

enum ModeState {
    FireOnce {
        fired: bool,
    },
    Scrub {
        smoothing_ms: Option<f64>,
        target: f32,
        shown: Option<f32>,
    },
    Observe(ObserveCallback),
}

struct Entry {
    target: ElementId,
    start: Threshold,
    end: Threshold,
    state: ModeState,
    animation: Option<AnimationId>,
    degenerate_logged: bool,
}

/// Progress through `[start, end]`. An empty or inverted range is a step
/// at `start`.
pub fn scroll_progress(scroll: f32, start: f32, end: f32) -> f32 {
    if end <= start {
        if scroll >= start { 1.0 } else { 0.0 }
    } else {
        ((scroll - start) / (end - start)).clamp(0.0, 1.0)
    }
}

#[derive(Default)]
pub struct TriggerRegistry {
    entries: BTreeMap<TriggerId, Entry>,
    next_id: u32,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `trigger`, bound to an animation already in the scheduler.
    /// The caller runs the first evaluation pass.
    pub fn register(&mut self, trigger: Trigger, animation: Option<AnimationId>) -> TriggerId {
        let id = TriggerId(self.next_id);
        self.next_id += 1;

        let state = match trigger.mode {
            TriggerMode::FireOnce => ModeState::FireOnce { fired: false },
            TriggerMode::Scrub { smoothing_ms } => ModeState::Scrub {
                smoothing_ms,
                target: 0.0,
                shown: None,
            },
            TriggerMode::Observe(cb) => ModeState::Observe(cb),
        };
        self.entries.insert(
            id,
            Entry {
                target: trigger.target,
                start: trigger.start,
                end: trigger.end,
                state,
                animation,
                degenerate_logged: false,
            },
        );
        id
    }

    pub fn unregister(&mut self, id: TriggerId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn contains(&self, id: TriggerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn target(&self, id: TriggerId) -> Option<ElementId> {
        self.entries.get(&id).map(|e| e.target)
    }

    pub fn animation(&self, id: TriggerId) -> Option<AnimationId> {
        self.entries.get(&id).and_then(|e| e.animation)
    }

    /// `Some(true)` once a fire-once trigger has fired.
    pub fn is_fired(&self, id: TriggerId) -> Option<bool> {
        match &self.entries.get(&id)?.state {
            ModeState::FireOnce { fired } => Some(*fired),
            _ => None,
        }
    }

    /// Progress a scrub trigger is currently showing.
    pub fn progress(&self, id: TriggerId) -> Option<f32> {
        match &self.entries.get(&id)?.state {
            ModeState::Scrub { shown, .. } => *shown,
            _ => None,
        }
    }

    /// `(start, end)` scroll positions for the element at `bounds`.
    pub fn range(&self, id: TriggerId, bounds: Rect, viewport: Size) -> Option<(f32, f32)> {
        let entry = self.entries.get(&id)?;
        Some((
            entry.start.scroll_position(bounds, viewport),
            entry.end.scroll_position(bounds, viewport),
        ))
    }

    /// Re-check one trigger against the scroll sample. `bounds` are the
    /// target's current layout bounds.
    pub fn evaluate(
        &mut self,
        id: TriggerId,
        bounds: Rect,
        input: &ScrollInput,
    ) -> Option<TriggerAction> {
        let entry = self.entries.get_mut(&id)?;
        let start = entry.start.scroll_position(bounds, input.viewport);
        let end = entry.end.scroll_position(bounds, input.viewport);

        if end <= start
            && !entry.degenerate_logged
            && !matches!(entry.state, ModeState::FireOnce { .. })
        {
            log::debug!("trigger {id:?} has an empty scroll range at {start}px, stepping");
            entry.degenerate_logged = true;
        }

        let progress = scroll_progress(input.scroll, start, end);
        match &mut entry.state {
            ModeState::FireOnce { fired } => {
                if *fired || input.scroll < start {
                    return None;
                }
                *fired = true;
                log::debug!("trigger {id:?} fired at scroll {}", input.scroll);
                entry.animation.map(TriggerAction::Play)
            }
            ModeState::Scrub {
                smoothing_ms,
                target,
                shown,
            } => {
                *target = progress;
                match (*smoothing_ms, *shown) {
                    (Some(_), Some(_)) => None,
                    (_, Some(current)) if current == progress => None,
                    _ => {
                        *shown = Some(progress);
                        entry.animation.map(|a| TriggerAction::Seek(a, progress))
                    }
                }
            }
            ModeState::Observe(callback) => {
                if input.scroll >= start && input.scroll <= end.max(start) {
                    callback(progress, input.velocity);
                }
                None
            }
        }
    }

    /// Move a smoothed scrub trigger's shown progress toward its target.
    /// `catch_up` is the share of the gap closed after one smoothing period.
    pub fn advance_smoothing(
        &mut self,
        id: TriggerId,
        dt_ms: f64,
        catch_up: f32,
    ) -> Option<TriggerAction> {
        let entry = self.entries.get_mut(&id)?;
        let ModeState::Scrub {
            smoothing_ms: Some(smoothing),
            target,
            shown: Some(current),
        } = &mut entry.state
        else {
            return None;
        };
        if *current == *target || dt_ms <= 0.0 {
            return None;
        }

        let remaining = (1.0 - f64::from(catch_up.clamp(0.0, 0.9999))).powf(dt_ms / *smoothing);
        let mut next = *target + (*current - *target) * remaining as f32;
        if (next - *target).abs() < 1e-4 {
            next = *target;
        }
        *current = next;
        entry.animation.map(|a| TriggerAction::Seek(a, next))
    }

    /// Ids in registration order.
    pub fn ids(&self) -> Vec<TriggerId> {
        self.entries.keys().copied().collect()
    }
}
