//! Brightness gauge: `███████░░░  70%`, dimmed when the light is off.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use lumen_core::Brightness;

use crate::theme;

/// Cells in the bar. Each cell is ten points.
pub const BAR_WIDTH: usize = 10;

/// Filled and empty halves of the bar, rounded to the nearest cell.
pub fn bar_text(brightness: Brightness) -> String {
    let filled = (usize::from(brightness.percent()) + 5) / 10;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// The styled brightness cell. Unreachable lights show `N/A`.
pub fn brightness_line(brightness: Brightness, power: bool, reachable: bool) -> Line<'static> {
    if !reachable {
        return Line::from(Span::styled("N/A", theme::unreachable()));
    }

    let color = if !power {
        theme::SLATE
    } else if brightness.percent() >= 70 {
        theme::LAMP_YELLOW
    } else {
        theme::FILAMENT
    };

    Line::from(vec![
        Span::styled(bar_text(brightness), Style::default().fg(color)),
        Span::styled(format!(" {:>4}", brightness.to_string()), theme::table_row()),
    ])
}
