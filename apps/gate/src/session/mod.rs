// Admin-surface session handling: backend API, verification gate, sign-out.
// Each gate or coordinator instance keeps at most one backend call in flight.

pub mod api;
pub mod sign_out;
pub mod verify;

pub use api::{HttpSessionApi, SessionApi};
pub use sign_out::SignOutCoordinator;
pub use verify::{AdminGate, AdminSession, Navigator};
