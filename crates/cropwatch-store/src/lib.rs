//! SQLite persistence for plants, farms and their plant assignments.

mod farms;
mod plants;
mod store;

pub use plants::PlantName;
pub use store::{FarmStore, StoreError};
