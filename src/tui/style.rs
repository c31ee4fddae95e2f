//! Color scheme and styles.

use ratatui::style::{Color, Modifier, Style};

/// Dashboard palette.
pub struct Theme;

impl Theme {
    // Background colors
    pub const BG: Color = Color::Reset;
    pub const TITLE_BG: Color = Color::Rgb(30, 80, 160);
    pub const FOOTER_BG: Color = Color::Rgb(230, 230, 230);
    pub const SELECTED_BG: Color = Color::Rgb(220, 230, 255);

    pub const ALERT_BG: Color = Color::Rgb(190, 30, 30);

    // Foreground colors
    pub const FG: Color = Color::Reset;
    pub const TITLE_FG: Color = Color::White;
    pub const FOOTER_FG: Color = Color::Black;
    pub const LABEL_FG: Color = Color::Rgb(0, 100, 200);
    pub const BORDER_FG: Color = Color::Rgb(150, 150, 150);
    pub const VALUE_FG: Color = Color::Rgb(0, 128, 0);
    pub const SPARK_FG: Color = Color::Rgb(0, 100, 255);
    pub const ACTIVE_FG: Color = Color::Rgb(0, 128, 0);
    pub const INACTIVE_FG: Color = Color::Rgb(128, 128, 128);
    pub const ERROR_FG: Color = Color::Red;
}

/// Pre-defined styles.
pub struct Styles;

impl Styles {
    /// Default text style.
    pub fn default() -> Style {
        Style::default().fg(Theme::FG).bg(Theme::BG)
    }

    /// Title bar style.
    pub fn title() -> Style {
        Style::default()
            .fg(Theme::TITLE_FG)
            .bg(Theme::TITLE_BG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn footer() -> Style {
        Style::default().fg(Theme::FOOTER_FG).bg(Theme::FOOTER_BG)
    }

    /// Panel border and title style.
    pub fn border() -> Style {
        Style::default().fg(Theme::BORDER_FG)
    }

    /// Column header and metric label style.
    pub fn label() -> Style {
        Style::default()
            .fg(Theme::LABEL_FG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn value() -> Style {
        Style::default().fg(Theme::VALUE_FG)
    }

    /// Values carried over from an earlier cycle.
    pub fn stale() -> Style {
        Style::default().fg(Theme::INACTIVE_FG)
    }

    pub fn sparkline() -> Style {
        Style::default().fg(Theme::SPARK_FG)
    }

    /// Selected row style.
    pub fn selected() -> Style {
        Style::default()
            .bg(Theme::SELECTED_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Session row style by status.
    pub fn session(status: &str) -> Style {
        if status.eq_ignore_ascii_case("ACTIVE") {
            Style::default().fg(Theme::ACTIVE_FG)
        } else {
            Style::default().fg(Theme::INACTIVE_FG)
        }
    }

    /// Error text style.
    pub fn error() -> Style {
        Style::default()
            .fg(Theme::ERROR_FG)
            .add_modifier(Modifier::BOLD)
    }

    /// Collector state badge while the collector is failing.
    pub fn alert() -> Style {
        Styles::error().fg(Theme::TITLE_FG).bg(Theme::ALERT_BG)
    }

    /// Wait row style by wait class.
    pub fn wait_class(class: &str) -> Style {
        Style::default().fg(wait_class_color(class))
    }
}

/// Foreground color for a normalized wait class.
pub fn wait_class_color(class: &str) -> Color {
    match class {
        "User I/O" => Color::Rgb(0, 50, 200),
        "System I/O" => Color::Rgb(50, 100, 200),
        "Concurrency" => Color::Rgb(200, 50, 50),
        "Application" => Color::Rgb(180, 0, 0),
        "Commit" => Color::Rgb(200, 100, 0),
        "Configuration" | "Administrative" => Color::Rgb(150, 50, 150),
        "Network" => Color::Rgb(120, 120, 0),
        "CPU" => Color::Rgb(0, 150, 0),
        _ => Theme::FG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_class_colors() {
        assert_eq!(wait_class_color("User I/O"), Color::Rgb(0, 50, 200));
        assert_eq!(
            wait_class_color("Configuration"),
            wait_class_color("Administrative")
        );
        assert_eq!(wait_class_color("Lock"), Theme::FG);
    }

    #[test]
    fn alert_stands_out_from_title() {
        assert_ne!(Styles::alert().bg, Styles::title().bg);
        assert!(Styles::alert().add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn session_status_style() {
        assert_eq!(Styles::session("ACTIVE").fg, Some(Theme::ACTIVE_FG));
        assert_eq!(Styles::session("active").fg, Some(Theme::ACTIVE_FG));
        assert_eq!(Styles::session("idle").fg, Some(Theme::INACTIVE_FG));
    }
}
