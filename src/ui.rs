pub mod history_list;
pub mod stats_table;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use cubik::session::SessionState;
use cubik::util::format_time;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Holding is red until the threshold passes, then green through the solve
pub fn timer_style(state: SessionState) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match state {
        SessionState::Holding => bold.fg(Color::Red),
        SessionState::Ready | SessionState::Running => bold.fg(Color::Green),
        SessionState::Idle | SessionState::Stopped => bold,
    }
}

fn legend(state: SessionState) -> &'static str {
    if state.is_active() {
        ""
    } else {
        "(space) hold to start / (d)elete last / (c)lear history / (esc)ape"
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let snapshot = session.snapshot();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3), // scramble
                Constraint::Min(3),    // timer + instruction
                Constraint::Length(8), // stats | history
                Constraint::Length(1), // status
                Constraint::Length(1), // legend
            ])
            .split(area);

        let scramble = Paragraph::new(Span::styled(
            session.scramble().to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        scramble.render(chunks[0], buf);

        let timer_area = chunks[1];
        let pad = timer_area.height.saturating_sub(2) / 2;
        let timer_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(pad),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(timer_area);

        Paragraph::new(Span::styled(
            format_time(snapshot.elapsed_ms),
            timer_style(snapshot.state),
        ))
        .alignment(Alignment::Center)
        .render(timer_chunks[1], buf);

        Paragraph::new(Span::styled(
            snapshot.instruction,
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(timer_chunks[2], buf);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[2]);

        Widget::render(stats_table::stats_table(session.statistics()), bottom[0], buf);

        let visible = bottom[1].height.saturating_sub(2) as usize;
        Paragraph::new(history_list::history_lines(session.history().solves(), visible))
            .block(Block::default().borders(Borders::ALL).title("History"))
            .render(bottom[1], buf);

        if let Some(status) = &self.status {
            Paragraph::new(Line::from(Span::styled(
                status.clone(),
                Style::default().fg(Color::Red),
            )))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(
            legend(snapshot.state),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }
}
