//! Parsing and formatting of refs: textual citations such as
//! `"Genesis 1:4-6"` that name a work and a location within it.
//!
//! A [`RefParser`] is built once from a [`TitleIndex`] (the set of known book
//! titles and index records) and memoizes every parse for its lifetime.

mod consts;
pub mod error;
mod index;
pub mod models;
mod numeral;
mod parser;
mod split;

pub use crate::index::{IndexEntry, SHEET_BOOK, TitleIndex};
pub use crate::models::{ParsedRef, Section};
pub use crate::numeral::hebrew_numeral;
pub use crate::parser::RefParser;
pub use crate::split::SectionLengths;
