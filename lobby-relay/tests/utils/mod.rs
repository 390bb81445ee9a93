mod relay_helpers;
mod test_socket;

pub use relay_helpers::*;
pub use test_socket::*;
