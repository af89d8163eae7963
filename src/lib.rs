pub mod abilities;
pub mod components;
pub mod enums;
pub mod level;
pub mod plugins;

pub use abilities::*;
pub use components::*;
pub use enums::*;
pub use level::*;
