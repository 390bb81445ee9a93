mod local_stream;
mod media_source;

pub use local_stream::*;
pub use media_source::*;
