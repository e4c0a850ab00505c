pub mod archive;
pub mod features;
pub mod report;
pub mod util;

pub use archive::*;
pub use features::*;
pub use report::*;
pub use util::*;
