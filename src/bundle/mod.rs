//! Steps that materialise the offline installer bundle.

pub mod assemble;
pub mod dependencies;
pub mod installer;

pub use assemble::{SkipList, assemble_bundle, copy_file_preserving, prepare_bundle_dir};
pub use dependencies::prefetch_dependencies;
pub use installer::InstallerScript;
