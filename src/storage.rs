pub mod directory;
mod path_parser;

pub use directory::{DirectoryError, PropertyDirectory, Resolution};
pub use path_parser::FilePattern;
