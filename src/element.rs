/*
 * World Element Module
 *
 * Shared aging and expiry behaviour for particles and constraints.
 * An element's age counts the cleanup phases it has survived; it expires once
 * its age reaches an optional lifetime. Elements without a lifetime are immortal.
 */

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lifecycle {
    pub age: u32,
    pub lifetime: Option<u32>,
}

impl Lifecycle {
    pub fn immortal() -> Self {
        Self::default()
    }

    pub fn with_lifetime(lifetime: u32) -> Self {
        Self { age: 0, lifetime: Some(lifetime) }
    }

    #[inline]
    pub fn has_expired(&self) -> bool {
        matches!(self.lifetime, Some(lifetime) if self.age >= lifetime)
    }

    // Advance the age by one step and report whether the element has now expired
    #[inline]
    pub fn advance(&mut self) -> bool {
        self.age = self.age.saturating_add(1);
        self.has_expired()
    }
}

// Implemented by everything the world ages during cleanup
pub trait WorldElement {
    fn lifecycle(&self) -> &Lifecycle;
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    fn age(&self) -> u32 {
        self.lifecycle().age
    }

    fn lifetime(&self) -> Option<u32> {
        self.lifecycle().lifetime
    }

    fn set_lifetime(&mut self, lifetime: Option<u32>) {
        self.lifecycle_mut().lifetime = lifetime;
    }

    fn has_expired(&self) -> bool {
        self.lifecycle().has_expired()
    }
}
