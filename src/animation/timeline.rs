//! Ordered composition of clips with relative offsets.
//!
//! Offsets are measured on the timeline's own clock. A clip added without an
//! explicit position starts where the timeline currently ends; relative
//! positions shift that point (negative values overlap the preceding span).
//!
//! ```
//! use choreo::{Clip, ElementArena, Position, Property, Rect, Timeline};
//!
//! let mut arena = ElementArena::new();
//! let eyebrow = arena.insert("hero/eyebrow", Rect::new(0.0, 100.0, 200.0, 20.0));
//! let title = arena.insert("hero/title", Rect::new(0.0, 140.0, 900.0, 200.0));
//!
//! let timeline = Timeline::new()
//!     .add(Clip::new(eyebrow).from_to(Property::Opacity, 0.0, 1.0).duration(800.0))
//!     .add_at(
//!         Clip::new(title).from_to(Property::Y, 200.0, 0.0).duration(1000.0),
//!         "-=400".parse::<Position>().unwrap(),
//!     );
//! assert_eq!(timeline.duration_ms(), 1400.0);
//! ```

use std::str::FromStr;

use super::clip::{Clip, ClipRun};
use crate::element::ElementId;
use crate::error::ChoreoError;
use crate::style::{Property, PropertySink};

/// Where a clip is placed when added to a timeline. All values in ms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    /// At the current end of the timeline.
    #[default]
    Sequential,
    /// Current end shifted by the offset (`"-=400"`, `"+=100"`).
    Relative(f64),
    /// Start of the previously added clip shifted by the offset (`"<"`, `"<200"`).
    WithPrevious(f64),
    /// Absolute time on the timeline (`"250"`).
    At(f64),
}

impl FromStr for Position {
    type Err = ChoreoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ChoreoError::InvalidPosition(s.to_string());
        let number = |text: &str| text.trim().parse::<f64>().map_err(|_| invalid());

        if s.is_empty() {
            Ok(Position::Sequential)
        } else if let Some(rest) = s.strip_prefix("-=") {
            Ok(Position::Relative(-number(rest)?))
        } else if let Some(rest) = s.strip_prefix("+=") {
            Ok(Position::Relative(number(rest)?))
        } else if let Some(rest) = s.strip_prefix('<') {
            if rest.trim().is_empty() {
                Ok(Position::WithPrevious(0.0))
            } else {
                Ok(Position::WithPrevious(number(rest)?))
            }
        } else {
            Ok(Position::At(number(s)?))
        }
    }
}

struct Entry {
    start_ms: f64,
    run: ClipRun,
}

/// A composed animation program.
pub struct Timeline {
    entries: Vec<Entry>,
    end_ms: f64,
    prev_start_ms: f64,
    delay_ms: f64,
    last_render_ms: Option<f64>,
    on_update: Option<Box<dyn FnMut(f32)>>,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            end_ms: 0.0,
            prev_start_ms: 0.0,
            delay_ms: 0.0,
            last_render_ms: None,
            on_update: None,
            on_complete: None,
        }
    }

    /// Compose `clips` in order. `offsets[i]` is the gap between the end of
    /// the timeline so far and clip `i`; negative gaps overlap, missing
    /// offsets count as zero. Starts never go below zero.
    pub fn compose(clips: impl IntoIterator<Item = Clip>, offsets: &[f64]) -> Self {
        clips
            .into_iter()
            .enumerate()
            .fold(Timeline::new(), |timeline, (i, clip)| {
                let offset = offsets.get(i).copied().unwrap_or(0.0);
                timeline.add_at(clip, Position::Relative(offset))
            })
    }

    /// Append `clip` at the current end.
    pub fn add(self, clip: Clip) -> Self {
        self.add_at(clip, Position::Sequential)
    }

    pub fn add_at(mut self, clip: Clip, position: Position) -> Self {
        let start = match position {
            Position::Sequential => self.end_ms,
            Position::Relative(offset) => self.end_ms + offset,
            Position::WithPrevious(offset) => self.prev_start_ms + offset,
            Position::At(at) => at,
        }
        .max(0.0);

        self.end_ms = self.end_ms.max(start + clip.total_duration());
        self.prev_start_ms = start;
        self.entries.push(Entry {
            start_ms: start,
            run: ClipRun::new(clip),
        });
        self
    }

    /// Wait before the first clip when played (not part of the duration).
    pub fn delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms.max(0.0);
        self
    }

    /// Called with the progress in [0, 1] after every render.
    pub fn on_update(mut self, f: impl FnMut(f32) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    /// Called once each time playback reaches the end.
    pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// max(start + clip duration) over all clips; 0 when empty.
    pub fn duration_ms(&self) -> f64 {
        self.end_ms
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolved start of the clip at `index`.
    pub fn start_of(&self, index: usize) -> Option<f64> {
        self.entries.get(index).map(|e| e.start_ms)
    }

    /// Every (element, property) pair the timeline can write.
    pub fn footprint(&self) -> Vec<(ElementId, Property)> {
        let mut pairs: Vec<_> = self
            .entries
            .iter()
            .flat_map(|e| e.run.clip().footprint())
            .collect();
        pairs.sort();
        pairs.dedup();
        pairs
    }

    pub fn targets(&self) -> Vec<ElementId> {
        let mut targets: Vec<_> = self
            .entries
            .iter()
            .flat_map(|e| e.run.clip().targets().iter().copied())
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// Show the explicit start values of every clip, in the order added.
    pub fn render_start_values(&self, sink: &mut dyn PropertySink) {
        for entry in &self.entries {
            entry.run.render_start_values(sink);
        }
    }

    /// Render all clips at `time_ms`. When moving backwards clips render in
    /// reverse order so earlier clips own the final start values.
    pub fn render(&mut self, time_ms: f64, sink: &mut dyn PropertySink) {
        let time_ms = time_ms.clamp(0.0, self.end_ms);
        let backwards = self.last_render_ms.is_some_and(|last| time_ms < last);
        if backwards {
            for entry in self.entries.iter_mut().rev() {
                entry.run.render(time_ms - entry.start_ms, sink);
            }
        } else {
            for entry in &mut self.entries {
                entry.run.render(time_ms - entry.start_ms, sink);
            }
        }
        self.last_render_ms = Some(time_ms);
    }

    pub fn progress_at(&self, time_ms: f64) -> f32 {
        if self.end_ms <= 0.0 {
            1.0
        } else {
            (time_ms / self.end_ms).clamp(0.0, 1.0) as f32
        }
    }

    pub(crate) fn notify_update(&mut self, progress: f32) {
        if let Some(f) = self.on_update.as_mut() {
            f(progress);
        }
    }

    pub(crate) fn notify_complete(&mut self) {
        if let Some(f) = self.on_complete.as_mut() {
            f();
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Clip> for Timeline {
    fn from(clip: Clip) -> Self {
        Timeline::new().add(clip)
    }
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("clips", &self.entries.len())
            .field("duration_ms", &self.end_ms)
            .field("delay_ms", &self.delay_ms)
            .finish()
    }
}
