//! CLI command implementations

pub mod clean;
pub mod init;
pub mod render;
pub mod sign;

pub use clean::execute as clean;
pub use init::execute as init;
pub use render::execute as render;
pub use sign::execute as sign;
