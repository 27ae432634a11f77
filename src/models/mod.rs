pub mod directory;
pub mod enums;
pub mod filters;
pub mod shift;

pub use directory::*;
pub use enums::*;
pub use filters::*;
pub use shift::*;
