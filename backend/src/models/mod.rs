pub mod batch;
pub mod body;
pub mod records;
pub mod time;

pub use batch::*;
pub use body::*;
pub use records::*;
pub use time::*;
