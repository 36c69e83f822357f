pub mod fixture;
pub mod venue;

// Re-export commonly used types at the model level.
pub use fixture::{DmxAddress, Fixture, FixtureSource, Universe};
pub use venue::VenueInfo;
