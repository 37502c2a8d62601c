//! UI renderer implementation.
//!
//! Contains the top-level [render] entry point used by the terminal loop and the layout
//! helpers that split the frame into header, filter bar, body and footer.
//!
//! This module stays "pure rendering": it reads the model and produces widgets.

use crate::app::Model;
use crate::ui::{overlays, panes, widgets};

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

/// Below this width the detail pane goes under the list instead of beside it.
const NARROW_WIDTH: u16 = 90;

/// Draws one frame: the base layout, then the active screen on top of it.
pub fn render(frame: &mut Frame, model: &Model) {
    if model.size() == (0, 0) {
        widgets::draw_placeholder(frame);
        return;
    }
    let area = frame.area();
    let theme = model.theme();
    frame.render_widget(Paragraph::new("").style(theme.text_style()), area);

    let [header, filter, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header, model);
    render_filter(frame, filter, model);
    render_body(frame, body, model);
    render_footer(frame, footer, model);

    if let Some(screen) = model.screen() {
        overlays::draw_screen(frame, area, screen, theme);
    }
}

fn render_header(frame: &mut Frame, area: Rect, model: &Model) {
    let theme = model.theme();
    let mut spans = vec![Span::styled(" lazyworktree", theme.header_style())];
    let repo = model.repo_name();
    if !repo.is_empty() {
        spans.push(Span::styled(format!(" · {repo}"), theme.text_style()));
    }
    if model.is_refreshing() {
        spans.push(Span::styled("  refreshing…", theme.muted_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_filter(frame: &mut Frame, area: Rect, model: &Model) {
    let theme = model.theme();
    let line = if model.filter_active() || !model.filter().is_empty() {
        Line::from(vec![
            Span::styled(" / ", theme.accent_style()),
            Span::styled(model.filter().to_string(), theme.text_style()),
        ])
    } else {
        Line::styled(" Press / to filter", theme.muted_style())
    };
    frame.render_widget(Paragraph::new(line), area);

    if model.filter_active() && model.screen().is_none() {
        let x = area.x + 3 + model.filter().width() as u16;
        frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
    }
}

fn render_body(frame: &mut Frame, area: Rect, model: &Model) {
    let [list, detail] = if area.width < NARROW_WIDTH {
        Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area)
    } else {
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area)
    };
    panes::draw_list(frame, list, model);
    panes::draw_detail(frame, detail, model);
}

fn render_footer(frame: &mut Frame, area: Rect, model: &Model) {
    let theme = model.theme();
    let right = format!(
        "sort: {}  {}/{} ",
        model.sort_mode().as_str(),
        model.view().selected().map_or(0, |p| p + 1),
        model.view().len()
    );
    let [left_area, right_area] = Layout::horizontal([
        Constraint::Min(1),
        Constraint::Length(right.width() as u16),
    ])
    .areas(area);

    let left = if model.status().is_empty() {
        widgets::hint_line(
            &[
                ("enter", "select"),
                ("n", "new"),
                ("D", "delete"),
                ("v", "CI"),
                ("/", "filter"),
                ("?", "help"),
                ("q", "quit"),
            ],
            theme,
        )
    } else {
        Line::styled(model.status().to_string(), theme.footer_style())
    };
    frame.render_widget(Paragraph::new(left), left_area);
    frame.render_widget(
        Paragraph::new(Line::styled(right, theme.muted_style())),
        right_area,
    );
}
