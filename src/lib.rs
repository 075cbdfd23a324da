pub mod arguments;
pub mod error;
pub mod git;
pub mod release;
pub mod schemes;
pub mod tag_format;
pub mod updater;
pub mod version;

pub use error::{Result, TagitError};
