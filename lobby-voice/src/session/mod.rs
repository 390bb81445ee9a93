mod session_command;
mod session_notice;
mod session_params;
mod voice_session;

pub use session_command::*;
pub use session_notice::*;
pub use session_params::*;
pub use voice_session::*;
