pub mod invocation;
pub mod runner;

pub use invocation::{Invocation, InvocationError, Volume};
pub use runner::{run, Streams};
