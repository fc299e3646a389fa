pub mod file;
pub mod record;
pub mod rest;
pub mod store;

pub use file::FileMirror;
pub use record::{MirrorFlag, MirrorRecord};
pub use rest::RestMirror;
pub use store::MirrorStore;
