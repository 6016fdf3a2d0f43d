pub mod error;
pub mod config;

pub(crate) mod choice;
#[cfg(feature = "validation")]
pub mod validation;

// Evidence domain
pub mod case;
pub mod item;

pub use choice::InvalidChoice;
pub use config::*;
pub use error::*;

pub use case::*;
pub use item::*;
