pub mod error;
pub mod table_info;

pub use table_info::*;
