//! The process-wide scroll/pointer sample and its subscriptions.
//!
//! There is exactly one scroll position, one velocity estimate, one pointer
//! position and one viewport size per engine. The host writes them once per
//! input event; triggers, loopers, effectors and followers only read them.
//! Anything that wants to be told about an event holds a
//! [`SubscriptionId`]; dispatch walks subscriptions in the order they were
//! made, which is what gives triggers their registration-order evaluation.

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::effector::{EffectorId, FollowerId, HoverId};
use crate::geometry::{Point, Size};
use crate::looper::LooperId;
use crate::trigger::TriggerId;

bitflags! {
    /// Which host events a subscription wants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Interest: u8 {
        const SCROLL = 1;
        const RESIZE = 1 << 1;
        const POINTER = 1 << 2;
        const TICK = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

/// What a subscription dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    Trigger(TriggerId),
    Looper(LooperId),
    Effector(EffectorId),
    Follower(FollowerId),
    Hover(HoverId),
}

/// Latest scroll position and the velocity derived from the last delta.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollSample {
    /// Document scroll offset in px.
    pub position: f32,
    /// px/s, signed (positive = scrolling down).
    pub velocity: f32,
    /// Timestamp of the last scroll event.
    pub last_event_ms: Option<f64>,
}

impl ScrollSample {
    fn record(&mut self, position: f32, now: f64) {
        if let Some(last) = self.last_event_ms {
            let dt = now - last;
            if dt > 0.0 {
                self.velocity = ((f64::from(position - self.position) / dt) * 1000.0) as f32;
            }
        }
        self.position = position;
        self.last_event_ms = Some(now);
    }

    /// Velocity at `now`; samples older than `stale_ms` read as zero.
    pub fn velocity_at(&self, now: f64, stale_ms: f64) -> f32 {
        match self.last_event_ms {
            Some(last) if now - last <= stale_ms => self.velocity,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct SampleHub {
    scroll: ScrollSample,
    pointer: Option<Point>,
    viewport: Size,
    subscriptions: BTreeMap<SubscriptionId, (Listener, Interest)>,
    next_id: u32,
}

impl SampleHub {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn subscribe(&mut self, listener: Listener, interest: Interest) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.insert(id, (listener, interest));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Listeners interested in any of `interest`, in subscription order.
    pub fn listeners(&self, interest: Interest) -> Vec<Listener> {
        self.subscriptions
            .values()
            .filter(|(_, i)| i.intersects(interest))
            .map(|(l, _)| *l)
            .collect()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn record_scroll(&mut self, position: f32, now: f64) {
        self.scroll.record(position, now);
    }

    pub fn scroll(&self) -> &ScrollSample {
        &self.scroll
    }

    /// Record the pointer in client coordinates.
    pub fn record_pointer(&mut self, client: Point) {
        self.pointer = Some(client);
    }

    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    /// Pointer position in document space, if the pointer is over the page.
    pub fn pointer_in_document(&self) -> Option<Point> {
        self.pointer
            .map(|p| Point::new(p.x, p.y + self.scroll.position))
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }
}
