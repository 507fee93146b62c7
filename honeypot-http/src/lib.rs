pub mod decoy;
pub mod extract;
pub mod handlers;
pub mod recorder;
pub mod server;

pub use decoy::DecoyPage;
pub use recorder::Recorder;
pub use server::{AppState, build_router, start};
