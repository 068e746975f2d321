pub mod da;
pub mod header;

pub use da::{
    Availability, Getter, GetterError, NamespacedRow, NamespacedShares,
};
pub use header::{DataAvailabilityHeader, ExtendedHeader, HeaderError};
