pub mod bot_config;
pub mod candidates;
pub mod config;
pub mod first_run;
pub mod interpreter;
pub mod locator;
pub mod logging;
pub mod materializer;
pub mod mirror;
pub mod path_guard;
pub mod process;
