pub mod error;
mod library;
mod names;
mod titles;

pub use crate::library::Library;
pub use crate::names::{NameCache, NameResponse};
pub use crate::titles::load_titles;
