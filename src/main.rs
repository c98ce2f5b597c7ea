mod app;
mod config;
mod effects;
mod engine;
mod library;
mod playlist;
mod plugin;
mod runtime;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
