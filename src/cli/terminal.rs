//! Terminal capability detection and output styling

use owo_colors::{OwoColorize, colors::css};

/// Whether colored output should be enabled on stdout
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Terminal width in columns, if stdout is a terminal
pub fn terminal_width() -> Option<usize> {
    terminal_size::terminal_size().map(|(w, _)| usize::from(w.0))
}

/// Shorten `text` to its first line, cut to fit in `width` characters.
pub fn preview(text: &str, width: Option<usize>) -> String {
    let line = text.lines().next().unwrap_or_default();
    match width {
        Some(width) if line.chars().count() > width => {
            let mut cut: String = line.chars().take(width.saturating_sub(1)).collect();
            cut.push('…');
            cut
        }
        _ => line.to_string(),
    }
}

fn paint(text: &str, styled: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        styled(text)
    } else {
        text.to_string()
    }
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Green, for completed actions
    fn success(&self) -> String;
    /// Amber, for stale or ambiguous state
    fn warning(&self) -> String;
    /// Blue, for question labels
    fn label(&self) -> String;
    /// Dimmed, for secondary details
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        paint(self, |s| s.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        paint(self, |s| s.fg::<css::Orange>().to_string())
    }

    fn label(&self) -> String {
        paint(self, |s| s.fg::<css::LightBlue>().bold().to_string())
    }

    fn dim(&self) -> String {
        paint(self, |s| s.dimmed().to_string())
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn label(&self) -> String {
        self.as_str().label()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("Define entropy.", None, "Define entropy."; "no width")]
    #[test_case("Define entropy.\nThen derive it.", None, "Define entropy."; "first line only")]
    #[test_case("Define entropy.", Some(7), "Define…"; "truncated")]
    #[test_case("", Some(7), ""; "empty")]
    fn previews_content(text: &str, width: Option<usize>, expected: &str) {
        assert_eq!(preview(text, width), expected);
    }
}
