/*
 * Vector Module
 *
 * This module defines the Vector2 value type used throughout the simulation core.
 * Arithmetic operators return new values, while the compound assignment operators
 * and the set_* helpers mutate in place so the integration loops stay allocation free.
 */

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use nannou::prelude::Vec2;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn magnitude(&self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    // Unit vector in the same direction, None for a zero (or non-finite) vector
    #[inline]
    pub fn unit_vector(&self) -> Option<Vector2> {
        let magnitude = self.magnitude();
        if magnitude > 0.0 && magnitude.is_finite() {
            Some(Vector2::new(self.x / magnitude, self.y / magnitude))
        } else {
            None
        }
    }

    // Rotate this point counter-clockwise about `centre` by `angle` radians
    pub fn rotate_about(&self, centre: Vector2, angle: f32) -> Vector2 {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - centre.x;
        let dy = self.y - centre.y;
        Vector2::new(centre.x + dx * cos - dy * sin, centre.y + dx * sin + dy * cos)
    }

    #[inline]
    pub fn distance_squared_to(&self, other: Vector2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance_to(&self, other: Vector2) -> f32 {
        self.distance_squared_to(other).sqrt()
    }

    #[inline]
    pub fn set_to(&mut self, other: Vector2) {
        self.x = other.x;
        self.y = other.y;
    }

    #[inline]
    pub fn set_zero(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    #[inline]
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    #[inline]
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vector2 {
    type Output = Vector2;

    #[inline]
    fn mul(self, scalar: f32) -> Vector2 {
        Vector2::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f32> for Vector2 {
    type Output = Vector2;

    #[inline]
    fn div(self, scalar: f32) -> Vector2 {
        Vector2::new(self.x / scalar, self.y / scalar)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;

    #[inline]
    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

impl AddAssign for Vector2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vector2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vector2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl MulAssign<f32> for Vector2 {
    #[inline]
    fn mul_assign(&mut self, scalar: f32) {
        self.x *= scalar;
        self.y *= scalar;
    }
}

// Conversions for the renderer, which works in nannou's glam vectors
impl From<Vector2> for Vec2 {
    fn from(v: Vector2) -> Self {
        Vec2::new(v.x, v.y)
    }
}

impl From<Vec2> for Vector2 {
    fn from(v: Vec2) -> Self {
        Vector2::new(v.x, v.y)
    }
}
