// Camera domain — acquisition, stream sessions, and render targets.

pub mod backend;
pub mod dummy;
pub mod error;
pub mod resolve;
pub mod session;
pub mod surface;
pub mod types;
