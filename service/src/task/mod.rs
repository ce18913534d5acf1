//! Background [`Task`]s definitions.

mod background;
pub mod run_sweeps;

pub use common::Handler as Task;

pub use self::{background::Background, run_sweeps::RunSweeps};
