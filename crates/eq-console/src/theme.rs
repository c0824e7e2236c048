use ratatui::style::{Color, Modifier, Style};

/// Palette for the console. Two variants, toggled at runtime.
#[derive(Clone, Copy)]
pub struct Theme {
    pub bg: Color,
    pub surface: Color,
    pub border: Color,
    pub title: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub user: Color,
    pub reasoning: Color,
    pub explanation: Color,
    pub sql: Color,
    pub ok: Color,
    pub warn: Color,
    pub critical: Color,
}

pub fn dark() -> Theme {
    Theme {
        bg: Color::Rgb(11, 18, 32),
        surface: Color::Rgb(17, 26, 46),
        border: Color::Rgb(71, 85, 105),
        title: Color::Rgb(191, 219, 254),
        text: Color::Rgb(226, 232, 240),
        muted: Color::Rgb(148, 163, 184),
        accent: Color::Rgb(56, 189, 248),
        user: Color::Rgb(250, 189, 47),
        reasoning: Color::Rgb(59, 130, 246),
        explanation: Color::Rgb(34, 197, 94),
        sql: Color::Rgb(167, 139, 250),
        ok: Color::Rgb(34, 197, 94),
        warn: Color::Rgb(245, 158, 11),
        critical: Color::Rgb(239, 68, 68),
    }
}

pub fn light() -> Theme {
    Theme {
        bg: Color::Rgb(248, 250, 252),
        surface: Color::Rgb(241, 245, 249),
        border: Color::Rgb(148, 163, 184),
        title: Color::Rgb(30, 58, 138),
        text: Color::Rgb(15, 23, 42),
        muted: Color::Rgb(100, 116, 139),
        accent: Color::Rgb(2, 132, 199),
        user: Color::Rgb(180, 83, 9),
        reasoning: Color::Rgb(29, 78, 216),
        explanation: Color::Rgb(21, 128, 61),
        sql: Color::Rgb(109, 40, 217),
        ok: Color::Rgb(21, 128, 61),
        warn: Color::Rgb(180, 83, 9),
        critical: Color::Rgb(185, 28, 28),
    }
}

impl Theme {
    pub fn header(&self) -> Style {
        Style::new().fg(self.title).add_modifier(Modifier::BOLD)
    }

    pub fn section(&self, color: Color) -> Style {
        Style::new().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn muted_style(&self) -> Style {
        Style::new().fg(self.muted)
    }
}
