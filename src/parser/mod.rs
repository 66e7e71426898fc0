pub mod record;
pub mod row;
pub mod value;

pub use record::*;
pub use row::*;
pub use value::*;
