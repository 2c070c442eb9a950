//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates the field registry and value accessor for gridquery from
//! struct fields and their `#[grid(...)]` annotations.

mod attrs;
mod derive;

pub use derive::record_derive_impl;
