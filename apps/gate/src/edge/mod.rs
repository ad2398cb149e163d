// Edge layer: runs before any forwarding or admin verification.
// Order on the router: enforce_https (outer) → intercept (inner).

pub mod https;
pub mod interceptor;

pub use https::enforce_https;
pub use interceptor::{intercept, EdgeInterceptor};
