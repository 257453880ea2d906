pub mod install;
pub mod migrate;
pub mod note_path;
pub mod process;
pub mod summary;
