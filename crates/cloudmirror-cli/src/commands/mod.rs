pub mod common;
pub mod config;
pub mod run;
pub mod status;

pub use common::CommandOptions;
pub use config::Config;
pub use run::Run;
pub use status::Status;
