//! Places the active [Screen] over the base layout.
//!
//! List-like screens sit a few rows below the top edge so the header stays visible; the trust
//! prompt and the welcome screen are centered.

use crate::config::Theme;
use crate::screen::Screen;
use crate::ui::widgets::{centered_area, clear, popup_area};

use ratatui::{Frame, layout::Rect};

/// Area the screen occupies inside `area`.
pub fn screen_area(screen: &Screen, area: Rect) -> Rect {
    let (width, height) = screen.size(area);
    match screen.kind().overlay_offset() {
        Some(top) => popup_area(area, width, height, top),
        None => centered_area(area, width, height),
    }
}

pub fn draw_screen(frame: &mut Frame, area: Rect, screen: &Screen, theme: &Theme) {
    let rect = screen_area(screen, area);
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    clear(frame, rect);
    screen.render(frame, rect, theme);
}
