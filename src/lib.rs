//! Headless animation choreography for scroll-driven single-page sites.
//!
//! The host page registers its elements in an [`ElementArena`], opens a
//! [`ScopeId`] per section and registers effects against it:
//!
//! - [`Timeline`]s of staggered [`Clip`]s, played immediately or bound to a
//!   scroll [`Trigger`] (fire-once, scrubbed or observed)
//! - [`Looper`]s whose marquee speed follows the scroll velocity
//! - pointer [`Effector`]s with distance falloff, [`Follower`]s and
//!   [`Hover`] enter/leave clips
//!
//! It then feeds input events into the [`Engine`] and drains ordered
//! [`PropertyWrite`]s. Reverting a scope releases everything it created and
//! restores the styles it touched.

pub mod animation;
pub mod effector;
pub mod element;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod looper;
pub mod sample;
pub mod scheduler;
pub mod scope;
pub mod style;
pub mod trigger;

pub use animation::{
    Clip, EaseDirection, Position, SpringConfig, Timeline, TimingFunction, Transform, Transition,
};
pub use effector::{Effector, EffectorId, Falloff, Follower, FollowerId, Hover, HoverId, Response};
pub use element::{ElementArena, ElementId, ElementSet};
pub use engine::{Engine, EngineConfig, ScopeGuard};
pub use error::{ChoreoError, Result};
pub use geometry::{Point, Rect, Size};
pub use looper::{LoopDirection, Looper, LooperId};
pub use sample::Interest;
pub use scheduler::{AnimationId, PlayState};
pub use scope::ScopeId;
pub use style::{Property, PropertyWrite, Style};
pub use trigger::{Threshold, Trigger, TriggerId};

pub mod prelude {
    pub use crate::{
        Clip, EaseDirection, Effector, ElementArena, ElementId, ElementSet, Engine,
        EngineConfig, Falloff, Follower, Hover, LoopDirection, Looper, PlayState, Point, Position,
        Property, PropertyWrite, Rect, Response, ScopeId, Size, Threshold, Timeline,
        TimingFunction, Transition, Trigger,
    };
}
