pub mod day;
pub mod error;
pub mod retry;
pub mod traits;
pub mod types;

pub use day::*;
pub use error::*;
pub use retry::*;
pub use traits::*;
pub use types::*;
