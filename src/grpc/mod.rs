mod control;
mod control_ext;
#[cfg(test)]
mod control_ext_test;

pub use control::coordinator_server::{Coordinator, CoordinatorServer};
pub use control::*;
pub use control_ext::{pack, unpack, TypedMessage};
