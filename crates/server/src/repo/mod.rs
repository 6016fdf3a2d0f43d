pub mod case;
pub mod item;
