pub use silo_core::*;
pub use silo_macros::Entity;
