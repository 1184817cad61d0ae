// Library surface for the solve-capture core and its collaborators.
// The binary in main.rs only adds the terminal loop and rendering.
pub mod app_dirs;
pub mod config;
pub mod history;
pub mod input;
pub mod logging;
pub mod runtime;
pub mod scramble;
pub mod session;
pub mod stats;
pub mod timer;
pub mod util;
