//! Animatable properties and the per-element style store.

use std::collections::BTreeMap;

use crate::element::{ElementArena, ElementId};

/// A property the engine knows how to write.
///
/// Units are the host's: translations in pixels, percentages in percent of
/// the element's own size, rotations in degrees, scale and opacity unitless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    X,
    Y,
    XPercent,
    YPercent,
    Rotation,
    RotationX,
    RotationY,
    Scale,
    ScaleX,
    ScaleY,
    Opacity,
    Width,
    Height,
}

impl Property {
    /// Value the property has when nothing has written it.
    pub fn rest_value(self) -> f32 {
        match self {
            Property::Scale | Property::ScaleX | Property::ScaleY | Property::Opacity => 1.0,
            _ => 0.0,
        }
    }
}

/// Inline style of one element: only explicitly written properties are stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    values: BTreeMap<Property, f32>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, falling back to the property's rest value.
    pub fn get(&self, property: Property) -> f32 {
        self.values
            .get(&property)
            .copied()
            .unwrap_or_else(|| property.rest_value())
    }

    /// Value only if it was explicitly written.
    pub fn explicit(&self, property: Property) -> Option<f32> {
        self.values.get(&property).copied()
    }

    pub fn set(&mut self, property: Property, value: f32) {
        self.values.insert(property, value);
    }

    pub fn clear(&mut self, property: Property) {
        self.values.remove(&property);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, f32)> + '_ {
        self.values.iter().map(|(p, v)| (*p, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One output record for the host: set `property` of `element` to `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyWrite {
    pub element: ElementId,
    pub property: Property,
    pub value: f32,
}

/// Destination of interpolated values.
///
/// The engine implements this over its element arena; tests use a plain map.
pub trait PropertySink {
    /// Current displayed value of `property` on `element`.
    fn current(&self, element: ElementId, property: Property) -> f32;

    fn write(&mut self, element: ElementId, property: Property, value: f32);
}

/// [`PropertySink`] over the element arena that also records every write
/// for the host, in invocation order. Writes to elements that are no longer
/// in the arena are dropped.
pub struct ArenaSink<'a> {
    elements: &'a mut ElementArena,
    writes: &'a mut Vec<PropertyWrite>,
}

impl<'a> ArenaSink<'a> {
    pub fn new(elements: &'a mut ElementArena, writes: &'a mut Vec<PropertyWrite>) -> Self {
        Self { elements, writes }
    }
}

impl PropertySink for ArenaSink<'_> {
    fn current(&self, element: ElementId, property: Property) -> f32 {
        self.elements
            .style(element)
            .map_or_else(|| property.rest_value(), |s| s.get(property))
    }

    fn write(&mut self, element: ElementId, property: Property, value: f32) {
        let Some(node) = self.elements.get_mut(element) else {
            return;
        };
        node.style.set(property, value);
        self.writes.push(PropertyWrite {
            element,
            property,
            value,
        });
    }
}
