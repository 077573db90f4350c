use crossterm::style::{Color, Stylize};
use crossterm::tty::IsTty;

use crate::config::ColorChoice;

/// How alarming a rendered value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Good,
    Notice,
    Alert,
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub enabled: bool,
    pub title: Color,
    pub section_fg: Color,
    pub section_bg: Color,
    pub separator: Color,
    pub key: Color,
    pub text: Color,
    pub good: Color,
    pub notice: Color,
    pub alert: Color,
    pub alert_bg: Color,
    pub recommend: Color,
    pub recommend_bg: Color,
    pub spinner: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            enabled: true,
            title: Color::Rgb { r: 14, g: 165, b: 233 },
            section_fg: Color::Rgb { r: 139, g: 92, b: 246 },
            section_bg: Color::Rgb { r: 30, g: 41, b: 59 },
            separator: Color::Rgb { r: 100, g: 116, b: 139 },
            key: Color::Rgb { r: 100, g: 116, b: 139 },
            text: Color::Rgb { r: 248, g: 250, b: 252 },
            good: Color::Rgb { r: 34, g: 197, b: 94 },
            notice: Color::Rgb { r: 245, g: 158, b: 11 },
            alert: Color::Rgb { r: 239, g: 68, b: 68 },
            alert_bg: Color::Rgb { r: 127, g: 29, b: 29 },
            recommend: Color::Rgb { r: 96, g: 165, b: 250 },
            recommend_bg: Color::Rgb { r: 30, g: 58, b: 138 },
            spinner: Color::Rgb { r: 139, g: 92, b: 246 },
        }
    }

    /// No escape sequences at all; used for pipes, `--color never` and tests.
    pub fn plain() -> Self {
        Theme {
            enabled: false,
            ..Self::dark()
        }
    }

    pub fn from_choice(choice: ColorChoice) -> Self {
        if color_enabled(choice) {
            Self::dark()
        } else {
            Self::plain()
        }
    }

    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn bold(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.with(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn badge(&self, text: &str, fg: Color, bg: Color) -> String {
        if self.enabled {
            text.with(fg).on(bg).bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn tone(&self, text: &str, tone: Tone) -> String {
        match tone {
            Tone::Plain => self.paint(text, self.text),
            Tone::Good => self.paint(text, self.good),
            Tone::Notice => self.paint(text, self.notice),
            Tone::Alert => self.bold(text, self.alert),
        }
    }
}

/// `auto` colors only a terminal stdout, and honours `NO_COLOR`.
pub fn color_enabled(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::env::var_os("NO_COLOR").is_none_or(|v| v.is_empty()) && std::io::stdout().is_tty()
        }
    }
}
