use scope_tui::config::Config;
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    pub dim: Color,
    pub header: Color,
    pub selected_bg: Color,
    pub installed: Color,
    pub disabled: Color,
    pub staged: Color,
    pub update: Color,
    pub error: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::White,
            dim: Color::DarkGray,
            header: Color::Cyan,
            selected_bg: Color::Rgb(50, 50, 70),
            installed: Color::Rgb(100, 200, 120),
            disabled: Color::Rgb(200, 160, 80),
            staged: Color::Rgb(255, 200, 100),
            update: Color::Rgb(100, 150, 255),
            error: Color::Rgb(255, 100, 100),
            status_bar_bg: Color::Rgb(40, 40, 40),
            status_bar_fg: Color::White,
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Black,
            ..Self::default_theme()
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::White,
            foreground: Color::Black,
            dim: Color::Gray,
            header: Color::Blue,
            selected_bg: Color::Rgb(210, 220, 240),
            installed: Color::Rgb(30, 130, 60),
            disabled: Color::Rgb(160, 110, 0),
            staged: Color::Rgb(180, 90, 0),
            update: Color::Rgb(50, 100, 200),
            error: Color::Rgb(200, 50, 50),
            status_bar_bg: Color::LightBlue,
            status_bar_fg: Color::Black,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        match config.theme.as_str() {
            "dark" => Self::dark(),
            "light" => Self::light(),
            _ => Self::default_theme(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}
