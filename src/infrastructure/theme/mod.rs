//! Theme setting adapters

mod shared;

pub use shared::SharedThemeSink;
