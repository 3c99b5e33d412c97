pub mod errors;
pub mod faces;
pub mod store_key;

pub use errors::{AppError, AppResult};
