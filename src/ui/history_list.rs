use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use cubik::history::Solve;
use cubik::util::format_time_short;

/// Numbered lines, newest first; the newest solve carries the highest number
pub fn history_lines(solves: &[Solve], limit: usize) -> Vec<Line<'static>> {
    if solves.is_empty() {
        return vec![Line::from(Span::styled(
            "No solves yet",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ))];
    }

    let total = solves.len();
    solves
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, solve)| {
            Line::from(vec![
                Span::styled(format!("{:>4}. ", total - idx), Style::default().fg(Color::Gray)),
                Span::styled(
                    format!("{:>8}", format_time_short(solve.time_ms)),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}", solve.timestamp.format("%H:%M")),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ])
        })
        .collect()
}
