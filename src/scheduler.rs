//! Playback of timelines against the engine clock.
//!
//! Every animation the engine runs, from a one-clip entrance to a scrubbed
//! parallax, is a [`Timeline`] stored here under an [`AnimationId`]. The
//! scheduler never looks at wall-clock time; callers pass the frame
//! timestamp they were given by the host. Playback started or resumed
//! between frames is anchored to the next frame, so the first tick after
//! `play` only records its timestamp.

use std::collections::BTreeMap;

use crate::animation::Timeline;
use crate::style::PropertySink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u32);

#[cfg(test)]
impl AnimationId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    /// Registered but never played (start values may be showing).
    Idle,
    Playing,
    Paused,
    Finished,
}

struct Animation {
    timeline: Timeline,
    state: PlayState,
    time_ms: f64,
    delay_left_ms: f64,
    last_now: Option<f64>,
}

impl Animation {
    fn render(&mut self, sink: &mut dyn PropertySink) {
        self.timeline.render(self.time_ms, sink);
        let progress = self.timeline.progress_at(self.time_ms);
        self.timeline.notify_update(progress);
    }

    fn complete(&mut self, sink: &mut dyn PropertySink) {
        self.time_ms = self.timeline.duration_ms();
        self.render(sink);
        self.state = PlayState::Finished;
        self.timeline.notify_complete();
    }
}

#[derive(Default)]
pub struct Scheduler {
    animations: BTreeMap<AnimationId, Animation>,
    next_id: u32,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `timeline` and render its explicit start values.
    pub fn insert(&mut self, timeline: Timeline, sink: &mut dyn PropertySink) -> AnimationId {
        let id = AnimationId(self.next_id);
        self.next_id += 1;

        timeline.render_start_values(sink);
        self.animations.insert(
            id,
            Animation {
                timeline,
                state: PlayState::Idle,
                time_ms: 0.0,
                delay_left_ms: 0.0,
                last_now: None,
            },
        );
        id
    }

    /// Drop an animation; it never writes again.
    pub fn remove(&mut self, id: AnimationId) -> bool {
        self.animations.remove(&id).is_some()
    }

    pub fn contains(&self, id: AnimationId) -> bool {
        self.animations.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn ids(&self) -> Vec<AnimationId> {
        self.animations.keys().copied().collect()
    }

    pub fn state(&self, id: AnimationId) -> Option<PlayState> {
        self.animations.get(&id).map(|a| a.state)
    }

    pub fn time_ms(&self, id: AnimationId) -> Option<f64> {
        self.animations.get(&id).map(|a| a.time_ms)
    }

    pub fn duration_ms(&self, id: AnimationId) -> Option<f64> {
        self.animations.get(&id).map(|a| a.timeline.duration_ms())
    }

    /// Start or resume playback. The clock starts on the next tick; clips at
    /// offset zero render in this same call and an empty timeline completes
    /// immediately.
    pub fn play(&mut self, id: AnimationId, sink: &mut dyn PropertySink) {
        let Some(anim) = self.animations.get_mut(&id) else {
            return;
        };
        match anim.state {
            PlayState::Playing | PlayState::Finished => return,
            PlayState::Idle => anim.delay_left_ms = anim.timeline.delay_ms(),
            PlayState::Paused => {}
        }
        anim.state = PlayState::Playing;
        anim.last_now = None;

        if anim.delay_left_ms > 0.0 {
            return;
        }
        if anim.time_ms >= anim.timeline.duration_ms() {
            anim.complete(sink);
        } else {
            anim.render(sink);
        }
    }

    pub fn pause(&mut self, id: AnimationId) {
        if let Some(anim) = self.animations.get_mut(&id) {
            if anim.state == PlayState::Playing {
                anim.state = PlayState::Paused;
            }
        }
    }

    /// Rewind to the start and play again.
    pub fn restart(&mut self, id: AnimationId, sink: &mut dyn PropertySink) {
        if let Some(anim) = self.animations.get_mut(&id) {
            anim.time_ms = 0.0;
            anim.state = PlayState::Idle;
        }
        self.play(id, sink);
    }

    /// Jump to `progress` of the duration without running the clock.
    pub fn seek(&mut self, id: AnimationId, progress: f32, sink: &mut dyn PropertySink) {
        let Some(anim) = self.animations.get_mut(&id) else {
            return;
        };
        let progress = f64::from(progress.clamp(0.0, 1.0));
        anim.time_ms = progress * anim.timeline.duration_ms();
        anim.render(sink);
    }

    /// Jump to the end and mark the animation finished.
    pub fn finish(&mut self, id: AnimationId, sink: &mut dyn PropertySink) {
        let Some(anim) = self.animations.get_mut(&id) else {
            return;
        };
        if anim.state != PlayState::Finished {
            anim.delay_left_ms = 0.0;
            anim.complete(sink);
        }
    }

    /// Advance every playing animation to `now`.
    pub fn tick(&mut self, now: f64, sink: &mut dyn PropertySink) {
        for anim in self.animations.values_mut() {
            if anim.state != PlayState::Playing {
                continue;
            }
            let Some(last) = anim.last_now.replace(now) else {
                continue;
            };
            let mut dt = (now - last).max(0.0);

            if anim.delay_left_ms > 0.0 {
                let used = dt.min(anim.delay_left_ms);
                anim.delay_left_ms -= used;
                dt -= used;
                if anim.delay_left_ms > 0.0 {
                    continue;
                }
            }

            anim.time_ms += dt;
            if anim.time_ms >= anim.timeline.duration_ms() {
                anim.complete(sink);
            } else {
                anim.render(sink);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::clip_tests::{MapSink, ids};
    use crate::animation::{Clip, TimingFunction};
    use crate::style::Property;
    use std::cell::Cell;
    use std::rc::Rc;

    fn fade(el: crate::element::ElementId, duration: f64) -> Clip {
        Clip::new(el)
            .from_to(Property::Opacity, 0.0, 1.0)
            .duration(duration)
            .timing(TimingFunction::Linear)
    }

    #[test]
    fn test_insert_renders_start_values() {
        let el = ids(1)[0];
        let mut sched = Scheduler::new();
        let mut sink = MapSink::default();
        let id = sched.insert(fade(el, 100.0).into(), &mut sink);
        assert_eq!(sink.get(el, Property::Opacity), 0.0);
        assert_eq!(sched.state(id), Some(PlayState::Idle));
    }

    #[test]
    fn test_play_advances_and_completes() {
        let el = ids(1)[0];
        let done = Rc::new(Cell::new(0));
        let d = done.clone();
        let mut sched = Scheduler::new();
        let mut sink = MapSink::default();
        let id = sched.insert(
            Timeline::from(fade(el, 100.0)).on_complete(move || d.set(d.get() + 1)),
            &mut sink,
        );

        sched.play(id, &mut sink);
        sched.tick(1000.0, &mut sink);
        sched.tick(1050.0, &mut sink);
        assert_eq!(sink.get(el, Property::Opacity), 0.5);
        sched.tick(1200.0, &mut sink);
        assert_eq!(sink.get(el, Property::Opacity), 1.0);
        assert_eq!(sched.state(id), Some(PlayState::Finished));

        sched.tick(1300.0, &mut sink);
        sched.play(id, &mut sink);
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn test_zero_duration_clip_ends_on_next_tick() {
        let el = ids(1)[0];
        let mut sched = Scheduler::new();
        let mut sink = MapSink::default();
        let id = sched.insert(fade(el, 0.0).into(), &mut sink);
        sched.play(id, &mut sink);
        sched.tick(16.0, &mut sink);
        assert_eq!(sink.get(el, Property::Opacity), 1.0);
        assert_eq!(sched.state(id), Some(PlayState::Finished));
    }

    #[test]
    fn test_empty_timeline_completes_on_play() {
        let mut sched = Scheduler::new();
        let mut sink = MapSink::default();
        let id = sched.insert(Timeline::new(), &mut sink);
        sched.play(id, &mut sink);
        assert_eq!(sched.state(id), Some(PlayState::Finished));
    }

    #[test]
    fn test_first_tick_after_play_anchors_the_clock() {
        let el = ids(1)[0];
        let mut sched = Scheduler::new();
        let mut sink = MapSink::default();
        let id = sched.insert(fade(el, 100.0).into(), &mut sink);
        sched.play(id, &mut sink);

        // host clock is far ahead of anything the scheduler has seen
        sched.tick(90_000.0, &mut sink);
        assert_eq!(sched.state(id), Some(PlayState::Playing));
        assert_eq!(sched.time_ms(id), Some(0.0));
        sched.tick(90_025.0, &mut sink);
        assert_eq!(sink.get(el, Property::Opacity), 0.25);
    }

    #[test]
    fn test_timeline_delay_holds_playback() {
        let el = ids(1)[0];
        let mut sched = Scheduler::new();
        let mut sink = MapSink::default();
        let id = sched.insert(Timeline::from(fade(el, 100.0)).delay(300.0), &mut sink);
        sched.play(id, &mut sink);
        sched.tick(0.0, &mut sink);
        sched.tick(200.0, &mut sink);
        assert_eq!(sched.time_ms(id), Some(0.0));
        sched.tick(350.0, &mut sink);
        assert_eq!(sched.time_ms(id), Some(50.0));
    }

    #[test]
    fn test_seek_does_not_start_clock() {
        let el = ids(1)[0];
        let mut sched = Scheduler::new();
        let mut sink = MapSink::default();
        let id = sched.insert(fade(el, 200.0).into(), &mut sink);
        sched.seek(id, 0.25, &mut sink);
        assert_eq!(sink.get(el, Property::Opacity), 0.25);
        sched.tick(5000.0, &mut sink);
        assert_eq!(sink.get(el, Property::Opacity), 0.25);
        assert_eq!(sched.state(id), Some(PlayState::Idle));
    }

    #[test]
    fn test_pause_and_resume_keep_position() {
        let el = ids(1)[0];
        let mut sched = Scheduler::new();
        let mut sink = MapSink::default();
        let id = sched.insert(fade(el, 100.0).into(), &mut sink);
        sched.play(id, &mut sink);
        sched.tick(0.0, &mut sink);
        sched.tick(40.0, &mut sink);
        sched.pause(id);
        sched.tick(90.0, &mut sink);
        assert_eq!(sched.time_ms(id), Some(40.0));
        sched.play(id, &mut sink);
        sched.tick(500.0, &mut sink);
        sched.tick(510.0, &mut sink);
        assert_eq!(sched.time_ms(id), Some(50.0));
    }

    #[test]
    fn test_removed_animation_stops_writing() {
        let el = ids(1)[0];
        let mut sched = Scheduler::new();
        let mut sink = MapSink::default();
        let id = sched.insert(fade(el, 100.0).into(), &mut sink);
        sched.play(id, &mut sink);
        sched.tick(0.0, &mut sink);
        assert!(sched.remove(id));
        let before = sink.writes.len();
        sched.tick(50.0, &mut sink);
        assert_eq!(sink.writes.len(), before);
        assert!(!sched.remove(id));
    }
}
