pub mod directory;
mod paper_file;
mod path_parser;

pub use directory::{Directory, FlushError, InitError, LoadError, Loaded, Unloaded};
pub use paper_file::FileError;
pub use path_parser::{
    PaperKey, ParseError, construct_course_path, construct_paper_path, parse_paper_from_path,
};
