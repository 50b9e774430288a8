#![allow(dead_code)]

mod region_properties;
mod ring_modifiers;

pub use region_properties::*;
pub use ring_modifiers::*;
