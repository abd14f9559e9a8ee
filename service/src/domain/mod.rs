//! Domain definitions.

pub mod house;

pub use self::house::House;
