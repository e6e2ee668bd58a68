pub mod filter_where;
pub mod types;

pub use filter_where::FilterWhere;
pub use types::*;
