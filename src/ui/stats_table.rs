use ratatui::{
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
};
use ratatui::layout::Constraint;

use cubik::stats::Statistics;
use cubik::util::{format_stat, format_time_short};

pub struct StatRowData {
    pub label: &'static str,
    pub value: String,
    pub color: Option<Color>,
}

/// Rows in display order: solves, best, worst, mean, Ao5, Ao12
pub fn stat_rows(stats: &Statistics) -> Vec<StatRowData> {
    let ms = |v: Option<u64>| v.map_or_else(|| "-".to_string(), format_time_short);
    vec![
        StatRowData {
            label: "Solves",
            value: stats.count.to_string(),
            color: None,
        },
        StatRowData {
            label: "Best",
            value: ms(stats.best),
            color: Some(Color::Green),
        },
        StatRowData {
            label: "Worst",
            value: ms(stats.worst),
            color: Some(Color::Red),
        },
        StatRowData {
            label: "Average",
            value: format_stat(stats.average),
            color: None,
        },
        StatRowData {
            label: "Ao5",
            value: format_stat(stats.ao5),
            color: None,
        },
        StatRowData {
            label: "Ao12",
            value: format_stat(stats.ao12),
            color: None,
        },
    ]
}

pub fn present_row(data: &StatRowData) -> Row<'static> {
    let value_style = data
        .color
        .map_or_else(Style::default, |c| Style::default().fg(c))
        .add_modifier(Modifier::BOLD);

    Row::new(vec![
        Cell::from(data.label).style(Style::default().fg(Color::Gray)),
        Cell::from(data.value.clone()).style(value_style),
    ])
}

pub fn stats_table(stats: &Statistics) -> Table<'static> {
    let rows: Vec<Row> = stat_rows(stats).iter().map(present_row).collect();
    Table::new(rows, [Constraint::Length(9), Constraint::Min(8)])
        .block(Block::default().borders(Borders::ALL).title("Statistics"))
        .column_spacing(1)
}
