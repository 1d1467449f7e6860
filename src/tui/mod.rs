//! TUI module: Terminal User Interface using Ratatui.
//!
//! One search screen (query form above, ranked case cards below) and a
//! detail view for the selected case.

mod app;
mod styles;
mod ui;
mod worker;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
pub use worker::{
    HealthWorker, ImageLoadProgress, ImageLoadWorker, SearchProgress, SearchWorker,
    SearchWorkerHandle,
};
