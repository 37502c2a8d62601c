//! The two panes of the base layout: the worktree table and the detail pane.
//!
//! Used internally by [render](crate::ui::render).

use crate::app::{Model, Pane};
use crate::config::Theme;
use crate::core::models::{PrState, WorkingTree};
use crate::ui::widgets::truncate_to_width;
use crate::utils::relative_time;

use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};

const DETAIL_LABELS: &[&str] = &[
    "Path",
    "Branch",
    "Status",
    "Divergence",
    "Last active",
    "CI Checks",
];

fn pane_block<'a>(title: &'a str, focused: bool, theme: &Theme) -> Block<'a> {
    let title_style = if focused {
        theme.accent_style()
    } else {
        theme.muted_style()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style(focused))
        .title(Span::styled(format!(" {title} "), title_style))
}

fn status_cell(wt: &WorkingTree, theme: &Theme) -> Cell<'static> {
    if wt.dirty {
        Cell::from(Span::styled("●", theme.warn_style()))
    } else {
        Cell::from(Span::styled("✓", theme.success_style()))
    }
}

fn pr_cell(wt: &WorkingTree, theme: &Theme) -> Cell<'static> {
    match &wt.pr {
        Some(pr) => {
            let style = match pr.state {
                PrState::Open => theme.success_style(),
                PrState::Merged => theme.accent_style(),
                PrState::Closed => theme.muted_style(),
            };
            Cell::from(Span::styled(format!("#{}", pr.number), style))
        }
        None => Cell::from(""),
    }
}

/// One table row. `name_width` bounds the first column so long paths do not push the rest.
fn worktree_row(
    wt: &WorkingTree,
    name_width: usize,
    show_pr: bool,
    now: DateTime<Utc>,
    theme: &Theme,
) -> Row<'static> {
    let name_style = if wt.is_main {
        theme.accent_style()
    } else {
        theme.text_style()
    };
    let active = if wt.last_active > 0 {
        relative_time(wt.last_active, now)
    } else {
        String::new()
    };
    let mut cells = vec![
        Cell::from(Span::styled(truncate_to_width(&wt.name(), name_width), name_style)),
        status_cell(wt, theme),
        Cell::from(Span::styled(wt.divergence.clone(), theme.muted_style())),
    ];
    if show_pr {
        cells.push(pr_cell(wt, theme));
    }
    cells.push(Cell::from(Span::styled(active, theme.muted_style())));
    Row::new(cells)
}

/// Draws the worktree table with the selected row highlighted.
pub fn draw_list(frame: &mut Frame, area: Rect, model: &Model) {
    let theme = model.theme();
    let focused = model.focus() == Pane::List && !model.filter_active();
    let title = format!("Worktrees ({})", model.view().len());
    let block = pane_block(&title, focused, theme);

    if model.view().is_empty() {
        let text = if model.worktrees().is_empty() {
            if model.is_refreshing() {
                "Loading worktrees..."
            } else {
                "No worktrees."
            }
        } else {
            "No worktrees match the filter."
        };
        frame.render_widget(
            Paragraph::new(text).style(theme.muted_style()).block(block),
            area,
        );
        return;
    }

    let show_pr = model.pr_data_loaded();
    let name_width = (area.width as usize).saturating_sub(if show_pr { 32 } else { 24 }).max(8);
    let now = Utc::now();
    let rows: Vec<Row> = model
        .visible()
        .map(|wt| worktree_row(wt, name_width, show_pr, now, theme))
        .collect();

    let mut widths = vec![
        Constraint::Min(8),
        Constraint::Length(2),
        Constraint::Length(7),
    ];
    let mut header = vec!["Name", "", "±"];
    if show_pr {
        widths.push(Constraint::Length(7));
        header.push("PR");
    }
    widths.push(Constraint::Length(9));
    header.push("Active");

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(theme.header_style()))
        .row_highlight_style(theme.selection_style())
        .block(block);

    let mut state = TableState::default().with_selected(model.view().selected());
    frame.render_stateful_widget(table, area, &mut state);
}

/// Draws [Model::info_content] for the selected worktree, colouring the section headings.
pub fn draw_detail(frame: &mut Frame, area: Rect, model: &Model) {
    let theme = model.theme();
    let focused = model.focus() == Pane::Detail;
    let block = pane_block("Details", focused, theme);

    let lines: Vec<Line> = model
        .info_content()
        .lines()
        .map(|l| detail_line(l, theme))
        .collect();
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((model.detail_scroll(), 0)),
        area,
    );
}

fn detail_line(line: &str, theme: &Theme) -> Line<'static> {
    let check_style = |symbol: &str| -> Style {
        match symbol {
            "S" => theme.success_style(),
            "F" => theme.error_style(),
            "P" => theme.warn_style(),
            _ => theme.muted_style(),
        }
    };
    if let Some(rest) = line.strip_prefix("  ")
        && let Some((symbol, name)) = rest.split_once(' ')
    {
        return Line::from(vec![
            Span::raw("  "),
            Span::styled(symbol.to_string(), check_style(symbol)),
            Span::styled(format!(" {name}"), theme.text_style()),
        ]);
    }
    match line.split_once(':') {
        Some((label, value)) if DETAIL_LABELS.contains(&label) => {
            Line::from(vec![
                Span::styled(format!("{label}:"), theme.accent_style()),
                Span::styled(value.to_string(), theme.text_style()),
            ])
        }
        _ => Line::styled(line.to_string(), theme.text_style()),
    }
}
