//! CLI Commands

mod init;
mod run;
mod status;

pub use init::InitCommand;
pub use run::RunCommand;
pub use status::StatusCommand;
