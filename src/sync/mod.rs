mod conn;
mod framer;
mod result;
mod stream;

pub use conn::Conn;
pub use framer::Framer;
pub use result::{QueryResult, Row};
pub use stream::Stream;
