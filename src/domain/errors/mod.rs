//! Domain error types.

mod classification_error;
mod delivery_error;

pub use classification_error::ClassificationError;
pub use delivery_error::DeliveryError;
