//! Fan-out/fan-in engine.
//!
//! Split into focused submodules:
//! - `dispatch` - one fetch task per parent, one outcome per task
//! - `aggregate` - single-consumer drain into the keyed result
//! - `fan_out` - run driver tying listing, dispatch and drain together

mod aggregate;
mod dispatch;
mod fan_out;


pub use aggregate::aggregate;
pub use dispatch::dispatch;
pub use fan_out::FanOut;
