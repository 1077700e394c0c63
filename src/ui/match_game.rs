use crate::modes::match_game::GRID_COLUMNS;
use crate::modes::{MatchCard, MatchMode};
use crate::ui::flashcards::draw_empty;
use crate::utils::{centered_rect, key_hint};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn card_style(mode: &MatchMode, card: &MatchCard) -> Style {
    if mode.is_matched(card.pair_id) {
        Style::default().fg(Color::Green)
    } else if mode.is_incorrect(card.id) {
        Style::default().fg(Color::Red)
    } else if mode.is_selected(card.id) {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn draw_card(f: &mut Frame, area: Rect, mode: &MatchMode, card: &MatchCard, focused: bool) {
    let border_type = if focused {
        BorderType::Thick
    } else {
        BorderType::Plain
    };

    if card.hidden {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(block, area);
        return;
    }

    let style = card_style(mode, card);
    let border_style = if focused {
        style.fg(style.fg.unwrap_or(Color::Cyan))
    } else {
        style
    };
    let widget = Paragraph::new(card.text.as_str())
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(border_type)
                .border_style(border_style),
        );
    f.render_widget(widget, area);
}

pub fn draw_match(f: &mut Frame, area: Rect, mode: &MatchMode) {
    if mode.cards().is_empty() {
        draw_empty(f, area, "No match cards available. Press g to generate again.");
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    let status = Line::from(vec![
        Span::styled(
            format!("Time: {} sec", mode.elapsed_seconds()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::from(format!(
            "    Matched: {}/{}",
            mode.matched_count(),
            mode.pair_count()
        )),
    ]);
    f.render_widget(Paragraph::new(status).alignment(Alignment::Center), chunks[0]);

    let rows: Vec<&[MatchCard]> = mode.cards().chunks(GRID_COLUMNS).collect();
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows.len() as u32); rows.len()])
        .split(chunks[1]);

    for (ri, row) in rows.iter().enumerate() {
        let cell_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
            .split(row_areas[ri]);
        for (ci, card) in row.iter().enumerate() {
            let index = ri * GRID_COLUMNS + ci;
            draw_card(f, cell_areas[ci], mode, card, index == mode.cursor());
        }
    }

    if mode.is_complete() {
        draw_congratulations(f, area, mode.elapsed_seconds());
    }
}

fn draw_congratulations(f: &mut Frame, area: Rect, elapsed: u64) {
    let popup = centered_rect(60, 40, area);
    f.render_widget(Clear, popup);

    let mut spans = Vec::new();
    spans.extend(key_hint("r", " Play again", true));
    let text = vec![
        Line::from(Span::styled(
            "Congratulations!",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("You matched every pair in {} sec", elapsed)),
        Line::from(""),
        Line::from(spans),
    ];
    let dialog = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        );
    f.render_widget(dialog, popup);
}

pub fn match_help(mode: &MatchMode) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if mode.is_complete() {
        spans.extend(key_hint("r", " Play again  ", true));
        return spans;
    }
    let playing = !mode.cards().is_empty();
    spans.extend(key_hint("←↑↓→", " Move  ", playing));
    spans.extend(key_hint("Enter", " Select  ", playing));
    spans
}
