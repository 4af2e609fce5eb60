pub mod keybind;
pub mod loader;
pub mod types;

pub use keybind::{KeybindResolution, KeybindStatus};
pub use loader::Config;
pub use types::*;
