//! Small drawing helpers shared by the base layout and the screens.

use crate::config::Theme;

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Bordered block used by every popup.
pub fn popup_block(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style(true))
        .style(theme.popup_style())
        .title(Span::styled(format!(" {title} "), theme.accent_style()))
}

/// Area of a popup `width` x `height` placed `top` rows down and centered horizontally.
/// Clamped to `area`.
pub fn popup_area(area: Rect, width: u16, height: u16, top: u16) -> Rect {
    let width = width.min(area.width);
    let top = top.min(area.height.saturating_sub(1));
    let height = height.min(area.height.saturating_sub(top));
    let left = (area.width - width) / 2;
    Rect::new(area.x + left, area.y + top, width, height)
}

/// Area of a popup centered both ways.
pub fn centered_area(area: Rect, width: u16, height: u16) -> Rect {
    let height = height.min(area.height);
    popup_area(area, width, height, (area.height - height) / 2)
}

/// Blanks `area` before drawing a popup over the base layout.
pub fn clear(frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);
}

/// Cuts `s` to at most `width` columns, marking the cut with `…`.
pub fn truncate_to_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Truncates or right-pads `s` to exactly `width` columns.
pub fn fit_to_width(s: &str, width: usize) -> String {
    let mut out = truncate_to_width(s, width);
    let w = out.width();
    if w < width {
        out.push_str(&" ".repeat(width - w));
    }
    out
}

/// One-line hint row: `key description` pairs separated by two spaces.
pub fn hint_line(hints: &[(&str, &str)], theme: &Theme) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(key.to_string(), theme.accent_style()));
        spans.push(Span::styled(format!(" {desc}"), theme.muted_style()));
    }
    Line::from(spans)
}

/// "Loading..." shown until the terminal size is known.
pub fn draw_placeholder(frame: &mut Frame) {
    let area = frame.area();
    frame.render_widget(Paragraph::new("Loading..."), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_wide_chars() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
        assert_eq!(fit_to_width("ab", 4), "ab  ");
    }

    #[test]
    fn popup_is_clamped_and_centered() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(popup_area(area, 40, 10, 3), Rect::new(20, 3, 40, 10));
        assert_eq!(popup_area(area, 200, 50, 5), Rect::new(0, 5, 80, 19));
        assert_eq!(centered_area(area, 20, 4), Rect::new(30, 10, 20, 4));
    }
}
