//! A single property-interpolation descriptor and its playback lanes.

use super::spring::SpringState;
use super::timing::TimingFunction;
use crate::element::ElementId;
use crate::style::{Property, PropertySink};

/// Default clip duration in milliseconds.
pub const DEFAULT_DURATION_MS: f64 = 500.0;

/// One animated property of a clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub property: Property,
    /// Start value. `None` captures the displayed value when the clip first renders.
    pub from: Option<f32>,
    pub to: f32,
}

/// Interpolation of a set of properties on one or more targets.
///
/// With several targets, target `i` starts `i * stagger` after the first.
///
/// ```
/// use choreo::{Clip, ElementArena, Property, Rect, TimingFunction};
///
/// let mut arena = ElementArena::new();
/// let heading = arena.insert("works/heading", Rect::new(0.0, 1200.0, 800.0, 120.0));
///
/// let clip = Clip::new(heading)
///     .from_to(Property::Y, 60.0, 0.0)
///     .from_to(Property::Opacity, 0.0, 1.0)
///     .duration(1000.0)
///     .timing(TimingFunction::Power(4, choreo::EaseDirection::Out));
/// assert_eq!(clip.total_duration(), 1000.0);
/// ```
#[derive(Debug, Clone)]
pub struct Clip {
    targets: Vec<ElementId>,
    tweens: Vec<Tween>,
    duration_ms: f64,
    delay_ms: f64,
    stagger_ms: f64,
    timing: TimingFunction,
}

impl Clip {
    pub fn new(target: ElementId) -> Self {
        Self::batch([target])
    }

    /// Clip applied to every target in order, for use with [`Clip::stagger`].
    pub fn batch(targets: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            tweens: Vec::new(),
            duration_ms: DEFAULT_DURATION_MS,
            delay_ms: 0.0,
            stagger_ms: 0.0,
            timing: TimingFunction::default(),
        }
    }

    /// Animate `property` from `from` to `to`.
    pub fn from_to(mut self, property: Property, from: f32, to: f32) -> Self {
        self.tweens.retain(|t| t.property != property);
        self.tweens.push(Tween {
            property,
            from: Some(from),
            to,
        });
        self
    }

    /// Animate `property` from its displayed value to `to`.
    pub fn to(mut self, property: Property, to: f32) -> Self {
        self.tweens.retain(|t| t.property != property);
        self.tweens.push(Tween {
            property,
            from: None,
            to,
        });
        self
    }

    pub fn duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms.max(0.0);
        self
    }

    pub fn delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms.max(0.0);
        self
    }

    pub fn stagger(mut self, stagger_ms: f64) -> Self {
        self.stagger_ms = stagger_ms.max(0.0);
        self
    }

    pub fn timing(mut self, timing: TimingFunction) -> Self {
        self.timing = timing;
        self
    }

    pub fn targets(&self) -> &[ElementId] {
        &self.targets
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    pub fn stagger_ms(&self) -> f64 {
        self.stagger_ms
    }

    pub fn timing_function(&self) -> &TimingFunction {
        &self.timing
    }

    /// Delay, plus the stagger spread, plus one duration.
    pub fn total_duration(&self) -> f64 {
        let spread = self.targets.len().saturating_sub(1) as f64 * self.stagger_ms;
        self.delay_ms + spread + self.duration_ms
    }

    /// Every (element, property) pair this clip can write.
    pub fn footprint(&self) -> impl Iterator<Item = (ElementId, Property)> + '_ {
        self.targets
            .iter()
            .flat_map(move |t| self.tweens.iter().map(move |tw| (*t, tw.property)))
    }
}

/// Per-target playback state.
#[derive(Debug, Clone)]
struct Lane {
    target: ElementId,
    offset_ms: f64,
    start_values: Option<Vec<f32>>,
    last_eased: Option<f32>,
    spring: Option<SpringState>,
}

/// A clip being rendered at arbitrary local times.
#[derive(Debug, Clone)]
pub struct ClipRun {
    clip: Clip,
    lanes: Vec<Lane>,
}

impl ClipRun {
    pub fn new(clip: Clip) -> Self {
        let lanes = clip
            .targets
            .iter()
            .enumerate()
            .map(|(i, target)| Lane {
                target: *target,
                offset_ms: clip.delay_ms + i as f64 * clip.stagger_ms,
                start_values: None,
                last_eased: None,
                spring: clip.timing.is_spring().then(SpringState::new),
            })
            .collect();
        Self { clip, lanes }
    }

    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    /// Write explicit `from` values so targets show their start state before
    /// the clip begins.
    pub fn render_start_values(&self, sink: &mut dyn PropertySink) {
        for lane in &self.lanes {
            for tween in &self.clip.tweens {
                if let Some(from) = tween.from {
                    sink.write(lane.target, tween.property, from);
                }
            }
        }
    }

    /// Render the clip at `local_ms` after its own start.
    ///
    /// Lanes that have never rendered stay untouched while their start lies
    /// in the future; once rendered, moving back before the start writes the
    /// start values again.
    pub fn render(&mut self, local_ms: f64, sink: &mut dyn PropertySink) {
        let duration = self.clip.duration_ms;
        for lane in &mut self.lanes {
            let t = local_ms - lane.offset_ms;
            if t < 0.0 && lane.last_eased.is_none() {
                continue;
            }

            let progress = if t <= 0.0 {
                if duration <= 0.0 && t == 0.0 { 1.0 } else { 0.0 }
            } else if duration <= 0.0 {
                1.0
            } else {
                (t / duration).min(1.0) as f32
            };

            let eased = if progress >= 1.0 {
                1.0
            } else if let (Some(state), TimingFunction::Spring(config)) =
                (lane.spring.as_mut(), &self.clip.timing)
            {
                state.sample((t.max(0.0) / 1000.0) as f32, config)
            } else {
                self.clip.timing.evaluate(progress)
            };

            if lane.last_eased == Some(eased) {
                continue;
            }

            let starts = lane.start_values.get_or_insert_with(|| {
                self.clip
                    .tweens
                    .iter()
                    .map(|tw| tw.from.unwrap_or_else(|| sink.current(lane.target, tw.property)))
                    .collect()
            });

            for (tween, start) in self.clip.tweens.iter().zip(starts.iter()) {
                let value = start + (tween.to - start) * eased;
                sink.write(lane.target, tween.property, value);
            }
            lane.last_eased = Some(eased);
        }
    }

    /// True once every lane has rendered its end values.
    pub fn is_complete(&self) -> bool {
        self.lanes.iter().all(|l| l.last_eased == Some(1.0))
    }
}
