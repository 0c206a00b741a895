//! The lights table: cursor marker, selection mark, name, archetype,
//! power status and brightness.

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, Cell, Row, Table, TableState},
};

use lumen_core::{Light, LightRegistry, Selection};

use crate::theme;
use crate::widgets::brightness_bar;

/// Status column text and style.
pub fn status_cell(light: &Light) -> (&'static str, Style) {
    match (light.reachable, light.power) {
        (false, _) => ("UNREACHABLE", theme::unreachable()),
        (true, true) => ("ON", theme::power_on()),
        (true, false) => ("OFF", theme::power_off()),
    }
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    registry: &LightRegistry,
    selection: &Selection,
    focused: bool,
) {
    let block = Block::default()
        .title(" Lights ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            theme::border_focused()
        } else {
            theme::border_default()
        });

    let header = Row::new(vec![
        Cell::from(""),
        Cell::from(""),
        Cell::from("Name").style(theme::table_header()),
        Cell::from("Type").style(theme::table_header()),
        Cell::from("Status").style(theme::table_header()),
        Cell::from("Brightness").style(theme::table_header()),
    ]);

    let cursor = selection.cursor();
    let rows: Vec<Row> = registry
        .iter()
        .enumerate()
        .map(|(i, light)| {
            let at_cursor = i == cursor;
            let marked = selection.is_selected(&light.id);
            let (status, status_style) = status_cell(light);

            let name_style = Style::default()
                .fg(theme::DAYLIGHT)
                .add_modifier(if at_cursor {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });

            Row::new(vec![
                Cell::from(if at_cursor { "▶" } else { " " })
                    .style(Style::default().fg(theme::DUSK_VIOLET)),
                Cell::from(if marked { "✓" } else { " " })
                    .style(Style::default().fg(theme::ON_GREEN)),
                Cell::from(light.name.clone()).style(name_style),
                Cell::from(light.archetype.clone()).style(theme::table_row()),
                Cell::from(status).style(status_style),
                Cell::from(brightness_bar::brightness_line(
                    light.brightness,
                    light.power,
                    light.reachable,
                )),
            ])
            .style(if at_cursor {
                theme::table_cursor()
            } else {
                theme::table_row()
            })
        })
        .collect();

    let widths = [
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(3),
        Constraint::Fill(2),
        Constraint::Length(11),
        Constraint::Length(15),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1);

    let mut state = TableState::default().with_selected((!registry.is_empty()).then_some(cursor));
    frame.render_stateful_widget(table, area, &mut state);
}
