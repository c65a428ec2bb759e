//! Session actor and the reply backends it talks to.

pub mod local;
pub mod messages;
pub mod remote;
pub mod session;
pub mod traits;
