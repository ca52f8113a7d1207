pub mod organization;
pub mod roster;
pub mod team;

pub use organization::*;
pub use roster::*;
pub use team::*;
