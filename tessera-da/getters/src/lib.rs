pub mod archive;
pub mod availability;
pub mod cascade;
pub mod store;

pub use archive::{ArchiveGetter, ArchiveGetterSettings};
pub use availability::{LightAvailability, LightAvailabilitySettings};
pub use cascade::CascadeGetter;
pub use store::StoreGetter;
