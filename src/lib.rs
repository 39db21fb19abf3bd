pub mod config;
pub mod error_handler;
pub mod input;
pub mod ledger;
pub mod logging;
pub mod output;
pub mod process;
pub mod run;
