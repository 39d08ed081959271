use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Terminal styles for CLI output
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
}

impl Theme {
    /// Colors only for an interactive stdout without `NO_COLOR`
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if no_color || !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            info: Style::new(),
            dim: Style::new(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
