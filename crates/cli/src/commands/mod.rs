pub mod generate;
pub mod goodware;
pub mod util;

pub use generate::*;
pub use goodware::*;
pub use util::*;
