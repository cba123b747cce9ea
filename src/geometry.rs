//! Document-space geometry shared by the trigger, looper and pointer modules.
//!
//! All coordinates are CSS pixels in document space (the page scrolled to
//! the top). Pointer input arrives in client space and is converted with the
//! current scroll offset before it reaches these types.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `other`.
    pub fn delta_to(&self, other: Point) -> (f32, f32) {
        (other.x - self.x, other.y - self.y)
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let (dx, dy) = self.delta_to(other);
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_edges() {
        let r = Rect::new(10.0, 100.0, 40.0, 20.0);
        assert_eq!(r.center(), Point::new(30.0, 110.0));
        assert_eq!(r.top(), 100.0);
        assert_eq!(r.bottom(), 120.0);
    }

    #[test]
    fn test_contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(9.9, 9.9)));
        assert!(!r.contains(Point::new(10.0, 5.0)));
    }

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        assert_eq!(a.distance_to(Point::new(3.0, 4.0)), 5.0);
        assert_eq!(a.delta_to(Point::new(-2.0, 1.0)), (-2.0, 1.0));
    }
}
