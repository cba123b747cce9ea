//! Pointer-reactive effects: magnetic displacement and pointer followers.
//!
//! An [`Effector`] watches the pointer over a containing region and pushes
//! each tracked element away from (or toward) it, scaled by a distance
//! falloff. Every pointer move retargets a short follow clip from whatever
//! is currently displayed; leaving the region starts a single rest clip per
//! element, usually an elastic overshoot back to zero.
//!
//! A [`Follower`] is the simpler sibling used for custom cursors and image
//! previews: the element chases the pointer plus an offset.
//!
//! A [`Hover`] plays one clip when the pointer enters a region and another
//! when it leaves, each starting from the displayed values so a quick
//! in-and-out never stacks.

use std::collections::BTreeMap;

use crate::animation::{Clip, EaseDirection, SpringState, TimingFunction, Transition};
use crate::element::ElementId;
use crate::geometry::{Point, Rect};
use crate::style::{Property, PropertySink};

/// How one tracked element reacts to the pointer.
///
/// Positive translation factors push the element away from the pointer,
/// negative ones pull it closer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Response {
    pub translate: (f32, f32),
    pub rotation: f32,
    pub tilt: (f32, f32),
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(mut self, x: f32, y: f32) -> Self {
        self.translate = (x, y);
        self
    }

    pub fn rotation(mut self, factor: f32) -> Self {
        self.rotation = factor;
        self
    }

    pub fn tilt(mut self, x: f32, y: f32) -> Self {
        self.tilt = (x, y);
        self
    }

    /// Target values for a pointer at `delta` from the element centre.
    /// Only properties with a non-zero factor are returned.
    pub fn targets(&self, delta: (f32, f32), intensity: f32) -> Vec<(Property, f32)> {
        let (dx, dy) = (delta.0 * intensity, delta.1 * intensity);
        [
            (Property::X, self.translate.0, -dx),
            (Property::Y, self.translate.1, -dy),
            (Property::Rotation, self.rotation, dx),
            (Property::RotationX, self.tilt.0, -dy),
            (Property::RotationY, self.tilt.1, dx),
        ]
        .into_iter()
        .filter(|(_, factor, _)| *factor != 0.0)
        .map(|(property, factor, value)| (property, value * factor))
        .collect()
    }
}

/// Distance falloff: `max * curve(max(0, 1 - d / radius))`.
#[derive(Debug, Clone)]
pub struct Falloff {
    pub radius: f32,
    pub curve: TimingFunction,
    pub max: f32,
}

impl Falloff {
    pub fn linear(radius: f32) -> Self {
        Self {
            radius,
            curve: TimingFunction::Linear,
            max: 1.0,
        }
    }

    /// Full intensity everywhere inside the region.
    pub fn none() -> Self {
        Self::linear(f32::INFINITY)
    }

    /// The curve should map 0 to 0 and 1 to 1 and be monotonic; overshooting
    /// curves break the non-increasing-with-distance guarantee.
    pub fn curve(mut self, curve: TimingFunction) -> Self {
        self.curve = curve;
        self
    }

    pub fn max(mut self, max: f32) -> Self {
        self.max = max;
        self
    }

    /// A zero (or NaN) radius never produces any effect.
    pub fn is_inert(&self) -> bool {
        self.radius.is_nan() || self.radius <= 0.0
    }

    pub fn intensity(&self, distance: f32) -> f32 {
        if self.is_inert() {
            return 0.0;
        }
        let raw = (1.0 - distance / self.radius).max(0.0);
        if raw <= 0.0 {
            return 0.0;
        }
        self.max * self.curve.evaluate(raw)
    }
}

#[derive(Debug, Clone)]
pub struct Effector {
    region: ElementId,
    items: Vec<(ElementId, Response)>,
    falloff: Falloff,
    follow: Transition,
    rest: Transition,
}

impl Effector {
    /// Effect scoped to pointer movement over `region`. Defaults to a 250px
    /// linear falloff, a 400ms power2.out follow and a 1s elastic return.
    pub fn new(region: ElementId) -> Self {
        Self {
            region,
            items: Vec::new(),
            falloff: Falloff::linear(250.0),
            follow: Transition::default(),
            rest: Transition::new(
                1000.0,
                TimingFunction::ElasticOut {
                    amplitude: 1.0,
                    period: 0.4,
                },
            ),
        }
    }

    pub fn track(mut self, element: ElementId, response: Response) -> Self {
        self.items.push((element, response));
        self
    }

    pub fn track_all(
        mut self,
        elements: impl IntoIterator<Item = ElementId>,
        response: Response,
    ) -> Self {
        self.items
            .extend(elements.into_iter().map(|element| (element, response)));
        self
    }

    pub fn falloff(mut self, falloff: Falloff) -> Self {
        self.falloff = falloff;
        self
    }

    pub fn follow(mut self, transition: Transition) -> Self {
        self.follow = transition;
        self
    }

    pub fn rest(mut self, transition: Transition) -> Self {
        self.rest = transition;
        self
    }

    pub fn region(&self) -> ElementId {
        self.region
    }

    pub fn items(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.items.iter().map(|(element, _)| *element)
    }

    pub fn falloff_ref(&self) -> &Falloff {
        &self.falloff
    }

    /// Every (element, property) this effector can write.
    pub fn footprint(&self) -> Vec<(ElementId, Property)> {
        self.items
            .iter()
            .flat_map(|(element, response)| {
                response
                    .targets((1.0, 1.0), 1.0)
                    .into_iter()
                    .map(move |(property, _)| (*element, property))
            })
            .collect()
    }
}

struct Retarget {
    from: f32,
    to: f32,
    start_ms: f64,
    transition: Transition,
    spring: SpringState,
    done: bool,
}

/// In-flight retargeted clips, one per (element, property).
#[derive(Default)]
struct Retargets {
    active: BTreeMap<(ElementId, Property), Retarget>,
}

impl Retargets {
    /// Restart the clip for `(element, property)` from the displayed value.
    fn retarget(
        &mut self,
        element: ElementId,
        property: Property,
        to: f32,
        transition: &Transition,
        now: f64,
        sink: &dyn PropertySink,
    ) {
        self.active.insert(
            (element, property),
            Retarget {
                from: sink.current(element, property),
                to,
                start_ms: now,
                transition: transition.clone(),
                spring: SpringState::new(),
                done: false,
            },
        );
    }

    /// Start every tween of `clip`, honouring its delay and stagger. Targets
    /// without an explicit `from` start at their displayed value.
    fn play_clip(&mut self, clip: &Clip, now: f64, sink: &dyn PropertySink) {
        let transition = Transition::new(clip.duration_ms(), clip.timing_function().clone());
        for (i, element) in clip.targets().iter().enumerate() {
            let start_ms = now + clip.delay_ms() + i as f64 * clip.stagger_ms();
            for tween in clip.tweens() {
                self.active.insert(
                    (*element, tween.property),
                    Retarget {
                        from: tween
                            .from
                            .unwrap_or_else(|| sink.current(*element, tween.property)),
                        to: tween.to,
                        start_ms,
                        transition: transition.clone(),
                        spring: SpringState::new(),
                        done: false,
                    },
                );
            }
        }
    }

    fn advance(&mut self, now: f64, sink: &mut dyn PropertySink) {
        for ((element, property), r) in self.active.iter_mut() {
            if r.done {
                continue;
            }
            let elapsed = now - r.start_ms;
            let eased = r.transition.eased_at(elapsed, &mut r.spring);
            sink.write(*element, *property, r.from + (r.to - r.from) * eased);
            r.done = elapsed >= r.transition.duration_ms;
        }
    }

    fn is_settled(&self) -> bool {
        self.active.values().all(|r| r.done)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectorPhase {
    /// Pointer outside, elements at rest.
    Idle,
    Tracking,
    Returning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectorId(u32);

struct Attached {
    effector: Effector,
    phase: EffectorPhase,
    tweens: Retargets,
    returns_started: u32,
}

impl Attached {
    fn start_return(&mut self, now: f64, sink: &dyn PropertySink) {
        for (element, property) in self.effector.footprint() {
            self.tweens
                .retarget(element, property, property.rest_value(), &self.effector.rest, now, sink);
        }
        self.phase = EffectorPhase::Returning;
        self.returns_started += 1;
    }
}

/// Every attached effector.
#[derive(Default)]
pub struct EffectorSet {
    attached: BTreeMap<EffectorId, Attached>,
    next_id: u32,
}

impl EffectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, effector: Effector) -> EffectorId {
        let id = EffectorId(self.next_id);
        self.next_id += 1;
        if self.attached.values().any(|a| a.effector.region == effector.region) {
            log::debug!("effector {id:?} shares its region with another effector");
        }
        if effector.falloff.is_inert() {
            log::debug!("effector {id:?} has a zero falloff radius, it will not react");
        }
        self.attached.insert(
            id,
            Attached {
                effector,
                phase: EffectorPhase::Idle,
                tweens: Retargets::default(),
                returns_started: 0,
            },
        );
        id
    }

    pub fn detach(&mut self, id: EffectorId) -> bool {
        self.attached.remove(&id).is_some()
    }

    pub fn contains(&self, id: EffectorId) -> bool {
        self.attached.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    pub fn get(&self, id: EffectorId) -> Option<&Effector> {
        self.attached.get(&id).map(|a| &a.effector)
    }

    pub fn phase(&self, id: EffectorId) -> Option<EffectorPhase> {
        self.attached.get(&id).map(|a| a.phase)
    }

    /// How many rest clips have been started since attach.
    pub fn returns_started(&self, id: EffectorId) -> Option<u32> {
        self.attached.get(&id).map(|a| a.returns_started)
    }

    /// React to the pointer at `pointer` (document space). `region` is the
    /// region's bounds and `centers[i]` the displayed centre of item `i`.
    pub fn pointer_move(
        &mut self,
        id: EffectorId,
        pointer: Point,
        region: Rect,
        centers: &[Option<Point>],
        now: f64,
        sink: &mut dyn PropertySink,
    ) {
        let Some(att) = self.attached.get_mut(&id) else {
            return;
        };

        if !region.contains(pointer) {
            if att.phase == EffectorPhase::Tracking {
                att.start_return(now, sink);
            }
            return;
        }

        if att.effector.falloff.is_inert() {
            return;
        }
        if att.phase == EffectorPhase::Returning {
            log::trace!("effector {id:?} return cancelled by pointer move");
        }
        att.phase = EffectorPhase::Tracking;

        for ((element, response), center) in att.effector.items.iter().zip(centers) {
            let Some(center) = center else { continue };
            let delta = center.delta_to(pointer);
            let intensity = att.effector.falloff.intensity(center.distance_to(pointer));
            for (property, value) in response.targets(delta, intensity) {
                att.tweens
                    .retarget(*element, property, value, &att.effector.follow, now, sink);
            }
        }
    }

    /// The pointer left the window or the region reported a leave.
    pub fn pointer_leave(&mut self, id: EffectorId, now: f64, sink: &dyn PropertySink) {
        let Some(att) = self.attached.get_mut(&id) else {
            return;
        };
        if att.phase == EffectorPhase::Tracking {
            att.start_return(now, sink);
        }
    }

    pub fn tick(&mut self, id: EffectorId, now: f64, sink: &mut dyn PropertySink) {
        let Some(att) = self.attached.get_mut(&id) else {
            return;
        };
        att.tweens.advance(now, sink);
        if att.phase == EffectorPhase::Returning && att.tweens.is_settled() {
            att.phase = EffectorPhase::Idle;
        }
    }
}

/// An element that chases the pointer, such as a custom cursor.
#[derive(Debug, Clone)]
pub struct Follower {
    target: ElementId,
    offset: (f32, f32),
    transition: Transition,
    region: Option<ElementId>,
}

impl Follower {
    /// Follow the pointer in client space with a 500ms power3.out clip.
    pub fn new(target: ElementId) -> Self {
        Self {
            target,
            offset: (0.0, 0.0),
            transition: Transition::new(500.0, TimingFunction::Power(3, EaseDirection::Out)),
            region: None,
        }
    }

    pub fn offset(mut self, x: f32, y: f32) -> Self {
        self.offset = (x, y);
        self
    }

    pub fn transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }

    /// Only follow while the pointer is over `region`.
    pub fn within(mut self, region: ElementId) -> Self {
        self.region = Some(region);
        self
    }

    pub fn target(&self) -> ElementId {
        self.target
    }

    pub fn region(&self) -> Option<ElementId> {
        self.region
    }

    pub fn footprint(&self) -> [(ElementId, Property); 2] {
        [(self.target, Property::X), (self.target, Property::Y)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FollowerId(u32);

struct Following {
    follower: Follower,
    tweens: Retargets,
}

#[derive(Default)]
pub struct FollowerSet {
    following: BTreeMap<FollowerId, Following>,
    next_id: u32,
}

impl FollowerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follow(&mut self, follower: Follower) -> FollowerId {
        let id = FollowerId(self.next_id);
        self.next_id += 1;
        self.following.insert(
            id,
            Following {
                follower,
                tweens: Retargets::default(),
            },
        );
        id
    }

    pub fn unfollow(&mut self, id: FollowerId) -> bool {
        self.following.remove(&id).is_some()
    }

    pub fn contains(&self, id: FollowerId) -> bool {
        self.following.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.following.len()
    }

    pub fn is_empty(&self) -> bool {
        self.following.is_empty()
    }

    pub fn get(&self, id: FollowerId) -> Option<&Follower> {
        self.following.get(&id).map(|f| &f.follower)
    }

    /// Retarget toward `client + offset`. `inside_region` is false when the
    /// follower is gated to a region the pointer is not over.
    pub fn pointer_move(
        &mut self,
        id: FollowerId,
        client: Point,
        inside_region: bool,
        now: f64,
        sink: &dyn PropertySink,
    ) {
        let Some(f) = self.following.get_mut(&id) else {
            return;
        };
        if !inside_region {
            return;
        }
        let (ox, oy) = f.follower.offset;
        let target = f.follower.target;
        let transition = &f.follower.transition;
        f.tweens
            .retarget(target, Property::X, client.x + ox, transition, now, sink);
        f.tweens
            .retarget(target, Property::Y, client.y + oy, transition, now, sink);
    }

    pub fn tick(&mut self, id: FollowerId, now: f64, sink: &mut dyn PropertySink) {
        if let Some(f) = self.following.get_mut(&id) {
            f.tweens.advance(now, sink);
        }
    }
}

/// Enter and leave clips bound to a region, like a cursor that grows over
/// links or a preview that fades in over a project row.
#[derive(Debug, Clone)]
pub struct Hover {
    region: ElementId,
    enter: Clip,
    leave: Clip,
}

impl Hover {
    pub fn new(region: ElementId, enter: Clip, leave: Clip) -> Self {
        Self {
            region,
            enter,
            leave,
        }
    }

    pub fn region(&self) -> ElementId {
        self.region
    }

    /// Region plus every clip target.
    pub fn elements(&self) -> Vec<ElementId> {
        let mut elements = vec![self.region];
        elements.extend_from_slice(self.enter.targets());
        elements.extend_from_slice(self.leave.targets());
        elements
    }

    pub fn footprint(&self) -> Vec<(ElementId, Property)> {
        self.enter.footprint().chain(self.leave.footprint()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HoverId(u32);

struct Hovering {
    hover: Hover,
    inside: bool,
    tweens: Retargets,
    enters: u32,
}

#[derive(Default)]
pub struct HoverSet {
    hovering: BTreeMap<HoverId, Hovering>,
    next_id: u32,
}

impl HoverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, hover: Hover) -> HoverId {
        let id = HoverId(self.next_id);
        self.next_id += 1;
        self.hovering.insert(
            id,
            Hovering {
                hover,
                inside: false,
                tweens: Retargets::default(),
                enters: 0,
            },
        );
        id
    }

    pub fn remove(&mut self, id: HoverId) -> bool {
        self.hovering.remove(&id).is_some()
    }

    pub fn contains(&self, id: HoverId) -> bool {
        self.hovering.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.hovering.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hovering.is_empty()
    }

    pub fn get(&self, id: HoverId) -> Option<&Hover> {
        self.hovering.get(&id).map(|h| &h.hover)
    }

    pub fn is_inside(&self, id: HoverId) -> Option<bool> {
        self.hovering.get(&id).map(|h| h.inside)
    }

    /// How many enter clips have been started.
    pub fn enters_started(&self, id: HoverId) -> Option<u32> {
        self.hovering.get(&id).map(|h| h.enters)
    }

    /// Play the enter or leave clip when `pointer` (document space) crosses
    /// the region's edge. Moves that stay on one side do nothing.
    pub fn pointer_move(
        &mut self,
        id: HoverId,
        pointer: Point,
        region: Rect,
        now: f64,
        sink: &dyn PropertySink,
    ) {
        let Some(h) = self.hovering.get_mut(&id) else {
            return;
        };
        let inside = region.contains(pointer);
        if inside == h.inside {
            return;
        }
        h.inside = inside;
        if inside {
            h.enters += 1;
            h.tweens.play_clip(&h.hover.enter, now, sink);
        } else {
            h.tweens.play_clip(&h.hover.leave, now, sink);
        }
    }

    pub fn pointer_leave(&mut self, id: HoverId, now: f64, sink: &dyn PropertySink) {
        let Some(h) = self.hovering.get_mut(&id) else {
            return;
        };
        if h.inside {
            h.inside = false;
            h.tweens.play_clip(&h.hover.leave, now, sink);
        }
    }

    pub fn tick(&mut self, id: HoverId, now: f64, sink: &mut dyn PropertySink) {
        if let Some(h) = self.hovering.get_mut(&id) {
            h.tweens.advance(now, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::clip_tests::{MapSink, ids};

    fn letters() -> (Vec<ElementId>, Rect, Vec<Option<Point>>) {
        let els = ids(3);
        let region = Rect::new(0.0, 0.0, 1000.0, 400.0);
        let centers = vec![
            Some(Point::new(100.0, 200.0)),
            Some(Point::new(300.0, 200.0)),
            Some(Point::new(900.0, 200.0)),
        ];
        (els, region, centers)
    }

    #[test]
    fn test_intensity_falloff() {
        let f = Falloff::linear(250.0);
        assert_eq!(f.intensity(0.0), 1.0);
        assert_eq!(f.intensity(125.0), 0.5);
        assert_eq!(f.intensity(250.0), 0.0);
        assert_eq!(f.intensity(1000.0), 0.0);

        let mut last = f32::MAX;
        for d in 0..300 {
            let i = f.intensity(d as f32);
            assert!(i <= last, "intensity rose at {d}");
            last = i;
        }

        let capped = Falloff::linear(100.0).max(0.6);
        assert_eq!(capped.intensity(0.0), 0.6);
        assert_eq!(Falloff::linear(0.0).intensity(0.0), 0.0);
        assert_eq!(Falloff::none().intensity(5000.0), 1.0);
    }

    #[test]
    fn test_response_targets() {
        let r = Response::new().translate(0.2, 0.4).rotation(0.08);
        let t = r.targets((100.0, -50.0), 0.5);
        assert_eq!(
            t,
            vec![
                (Property::X, -10.0),
                (Property::Y, 10.0),
                (Property::Rotation, 4.0),
            ]
        );

        let tilt = Response::new().tilt(0.02, 0.02).targets((100.0, 50.0), 1.0);
        assert_eq!(
            tilt,
            vec![(Property::RotationX, -1.0), (Property::RotationY, 2.0)]
        );
    }

    #[test]
    fn test_move_tracks_then_returns_once() {
        let (els, region, centers) = letters();
        let mut set = EffectorSet::new();
        let mut sink = MapSink::default();
        let id = set.attach(
            Effector::new(els[0])
                .track_all(els.clone(), Response::new().translate(1.0, 1.0))
                .falloff(Falloff::linear(250.0))
                .follow(Transition::new(100.0, TimingFunction::Linear)),
        );

        set.pointer_move(id, Point::new(150.0, 200.0), region, &centers, 0.0, &mut sink);
        assert_eq!(set.phase(id), Some(EffectorPhase::Tracking));
        set.tick(id, 100.0, &mut sink);
        // d = 50, intensity 0.8, pushed away from the pointer
        assert!((sink.get(els[0], Property::X) + 40.0).abs() < 1e-4);
        // d = 150, intensity 0.4
        assert!((sink.get(els[1], Property::X) - 60.0).abs() < 1e-4);
        // out of range
        assert_eq!(sink.get(els[2], Property::X), 0.0);

        set.pointer_leave(id, 200.0, &sink);
        set.pointer_leave(id, 210.0, &sink);
        set.pointer_move(id, Point::new(-10.0, 200.0), region, &centers, 220.0, &mut sink);
        assert_eq!(set.returns_started(id), Some(1));
        assert_eq!(set.phase(id), Some(EffectorPhase::Returning));

        set.tick(id, 1300.0, &mut sink);
        assert_eq!(sink.get(els[0], Property::X), 0.0);
        assert_eq!(set.phase(id), Some(EffectorPhase::Idle));
    }

    #[test]
    fn test_move_during_return_resumes_from_displayed_value() {
        let (els, region, centers) = letters();
        let mut set = EffectorSet::new();
        let mut sink = MapSink::default();
        let id = set.attach(
            Effector::new(els[0])
                .track(els[0], Response::new().translate(1.0, 0.0))
                .follow(Transition::new(100.0, TimingFunction::Linear))
                .rest(Transition::new(1000.0, TimingFunction::Linear)),
        );

        set.pointer_move(id, Point::new(150.0, 200.0), region, &centers[..1], 0.0, &mut sink);
        set.tick(id, 100.0, &mut sink);
        set.pointer_leave(id, 100.0, &sink);
        set.tick(id, 600.0, &mut sink);
        let mid_return = sink.get(els[0], Property::X);
        assert!(mid_return < 0.0 && mid_return > -40.0);

        set.pointer_move(id, Point::new(150.0, 200.0), region, &centers[..1], 600.0, &mut sink);
        assert_eq!(set.phase(id), Some(EffectorPhase::Tracking));
        set.tick(id, 600.0, &mut sink);
        assert_eq!(sink.get(els[0], Property::X), mid_return);
    }

    #[test]
    fn test_zero_radius_has_no_effect() {
        let (els, region, centers) = letters();
        let mut set = EffectorSet::new();
        let mut sink = MapSink::default();
        let id = set.attach(
            Effector::new(els[0])
                .track(els[0], Response::new().translate(1.0, 1.0))
                .falloff(Falloff::linear(0.0)),
        );
        set.pointer_move(id, Point::new(100.0, 200.0), region, &centers[..1], 0.0, &mut sink);
        set.tick(id, 1000.0, &mut sink);
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn test_detached_effector_is_silent() {
        let (els, region, centers) = letters();
        let mut set = EffectorSet::new();
        let mut sink = MapSink::default();
        let id = set.attach(
            Effector::new(els[0]).track(els[0], Response::new().translate(1.0, 1.0)),
        );
        assert!(set.detach(id));
        set.pointer_move(id, Point::new(100.0, 200.0), region, &centers[..1], 0.0, &mut sink);
        set.tick(id, 1000.0, &mut sink);
        assert!(sink.writes.is_empty());
    }

    fn grow(el: ElementId) -> Hover {
        Hover::new(
            el,
            Clip::new(el)
                .to(Property::Scale, 2.0)
                .duration(100.0)
                .timing(TimingFunction::Linear),
            Clip::new(el)
                .to(Property::Scale, 1.0)
                .duration(100.0)
                .timing(TimingFunction::Linear),
        )
    }

    #[test]
    fn test_hover_plays_enter_once_per_crossing() {
        let el = ids(1)[0];
        let region = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut set = HoverSet::new();
        let mut sink = MapSink::default();
        let id = set.add(grow(el));

        set.pointer_move(id, Point::new(50.0, 50.0), region, 0.0, &sink);
        set.pointer_move(id, Point::new(60.0, 50.0), region, 20.0, &sink);
        set.pointer_move(id, Point::new(70.0, 50.0), region, 40.0, &sink);
        assert_eq!(set.enters_started(id), Some(1));
        set.tick(id, 100.0, &mut sink);
        assert_eq!(sink.get(el, Property::Scale), 2.0);

        set.pointer_move(id, Point::new(500.0, 50.0), region, 200.0, &sink);
        assert_eq!(set.is_inside(id), Some(false));
        set.tick(id, 300.0, &mut sink);
        assert_eq!(sink.get(el, Property::Scale), 1.0);
    }

    #[test]
    fn test_hover_leave_cancels_enter_midway() {
        let el = ids(1)[0];
        let region = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut set = HoverSet::new();
        let mut sink = MapSink::default();
        let id = set.add(grow(el));

        set.pointer_move(id, Point::new(50.0, 50.0), region, 0.0, &sink);
        set.tick(id, 50.0, &mut sink);
        assert_eq!(sink.get(el, Property::Scale), 1.5);

        // leave starts from the displayed 1.5, not from the enter target
        set.pointer_leave(id, 50.0, &sink);
        set.pointer_leave(id, 60.0, &sink);
        set.tick(id, 100.0, &mut sink);
        assert_eq!(sink.get(el, Property::Scale), 1.25);
        set.tick(id, 150.0, &mut sink);
        assert_eq!(sink.get(el, Property::Scale), 1.0);
        assert_eq!(set.enters_started(id), Some(1));
    }

    #[test]
    fn test_follower_chases_pointer_with_offset() {
        let el = ids(1)[0];
        let mut set = FollowerSet::new();
        let mut sink = MapSink::default();
        let id = set.follow(
            Follower::new(el)
                .offset(20.0, -150.0)
                .transition(Transition::new(400.0, TimingFunction::Linear)),
        );

        set.pointer_move(id, Point::new(300.0, 400.0), true, 0.0, &sink);
        set.tick(id, 200.0, &mut sink);
        assert_eq!(sink.get(el, Property::X), 160.0);
        set.tick(id, 400.0, &mut sink);
        assert_eq!(sink.get(el, Property::X), 320.0);
        assert_eq!(sink.get(el, Property::Y), 250.0);

        set.pointer_move(id, Point::new(0.0, 0.0), false, 500.0, &sink);
        set.tick(id, 900.0, &mut sink);
        assert_eq!(sink.get(el, Property::X), 320.0);
    }
}
