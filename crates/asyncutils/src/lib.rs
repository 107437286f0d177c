mod coalesce;

pub use crate::coalesce::Coalescer;
