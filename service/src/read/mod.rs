//! Read entities definitions.

pub mod house;
