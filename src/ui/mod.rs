pub mod json;
pub mod report;
pub mod spinner;
pub mod theme;

pub use json::render_json;
pub use report::render_report;
pub use spinner::Spinner;
pub use theme::Theme;
