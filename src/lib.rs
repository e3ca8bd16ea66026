pub mod charset;
pub mod constant;
pub mod error;
mod opts;
pub mod protocol;
pub mod sync;
mod value;

pub use opts::{Compress, Opts, SslOpts};
pub use value::Value;
