//! Float geometry for the paddle games

use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Mul<f32> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f32) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict overlap; rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// A paddle that moves along one axis and stays inside the playfield
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub rect: Rect,
    pub speed: f32,
}

impl Paddle {
    pub fn new(x: f32, y: f32, width: f32, height: f32, speed: f32) -> Self {
        Self {
            rect: Rect::new(x, y, width, height),
            speed,
        }
    }

    /// Move by `speed` times the given factors, clamped to `bounds_w` x `bounds_h`
    pub fn shift(&mut self, x_factor: f32, y_factor: f32, bounds_w: f32, bounds_h: f32) {
        self.rect.x = (self.rect.x + self.speed * x_factor).clamp(0.0, bounds_w - self.rect.width);
        self.rect.y =
            (self.rect.y + self.speed * y_factor).clamp(0.0, bounds_h - self.rect.height);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vector2,
    /// Unit-per-axis heading; each component is ±1
    pub direction: Vector2,
    pub speed: f32,
    pub radius: f32,
}

impl Ball {
    pub fn new(pos: Vector2, direction: Vector2, speed: f32, radius: f32) -> Self {
        Self {
            pos,
            direction,
            speed,
            radius,
        }
    }

    pub fn advance(&mut self) {
        self.pos += self.direction * self.speed;
    }

    pub fn velocity(&self) -> Vector2 {
        self.direction * self.speed
    }

    /// Bounding box of the ball
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.pos.x - self.radius,
            self.pos.y - self.radius,
            self.radius * 2.0,
            self.radius * 2.0,
        )
    }
}
