pub mod share;

pub use share::{ShareEntry, ShareResponse};
