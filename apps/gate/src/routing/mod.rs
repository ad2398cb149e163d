// Request path matching for the edge interceptor.
// Pure functions only: no I/O, no shared state, safe under any request parallelism.

pub mod classifier;
pub mod scope;

pub use classifier::{classify, RouteClassification, RouteTable};
pub use scope::is_intercepted;
