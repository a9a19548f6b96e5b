pub mod runtime;
pub mod store;

pub use runtime::{PlaybackCommand, PositionUpdate, SessionRuntime, UpdateCause};
pub use store::{AppState, SessionListing};
