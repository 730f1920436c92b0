pub mod column;
pub mod error;
pub mod key;
pub mod number;
pub mod period;

pub use column::*;
pub use error::*;
pub use key::*;
pub use number::*;
pub use period::*;
