mod report;
mod run;

pub use report::run_report;
pub use run::{run_writer, RunMode};
