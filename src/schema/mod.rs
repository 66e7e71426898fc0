pub mod columns;
pub mod types;

pub use columns::*;
pub use types::*;
