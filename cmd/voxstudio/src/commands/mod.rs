//! CLI command implementations.

mod job;
mod util;
mod voice;

pub use job::{CancelCommand, StatusCommand, WaitCommand};
pub use voice::{DeleteCommand, GenerateCommand, TrainCommand, VoicesCommand};

pub(crate) use util::{finish_job, open_orchestrator, print_json};
