mod app;
mod input;
mod logging;
mod settings;

pub use app::run_app;
