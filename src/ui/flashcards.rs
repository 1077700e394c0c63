use crate::modes::{CardFace, FlashcardMode};
use crate::utils::key_hint;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn draw_flashcards(f: &mut Frame, area: Rect, mode: &FlashcardMode) {
    let Some(card) = mode.current_card() else {
        draw_empty(f, area, "No flashcards available. Press g to generate again.");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let (title, text, color) = match mode.face() {
        CardFace::Question => ("Question", card.question.as_str(), Color::Cyan),
        CardFace::Answer => ("Answer", card.answer.as_str(), Color::Green),
    };

    let card_widget = Paragraph::new(text)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title),
        );
    f.render_widget(card_widget, chunks[0]);

    let autoplay = if mode.is_autoplaying() {
        Span::styled("▶ Playing", Style::default().fg(Color::Green))
    } else {
        Span::styled("⏸ Paused", Style::default().fg(Color::DarkGray))
    };
    let status = Line::from(vec![
        Span::styled(
            format!("{} / {}", mode.current_index() + 1, mode.len()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::from("   "),
        autoplay,
    ]);
    f.render_widget(
        Paragraph::new(status).alignment(Alignment::Center),
        chunks[1],
    );
}

pub fn flashcard_help(mode: &FlashcardMode) -> Vec<Span<'static>> {
    let has_cards = !mode.is_empty();
    let mut spans = Vec::new();
    spans.extend(key_hint("←", " Previous  ", has_cards && !mode.at_first()));
    spans.extend(key_hint("→", " Next  ", has_cards && !mode.at_last()));
    spans.extend(key_hint("Space", " Flip  ", has_cards));
    spans.extend(key_hint(
        "p",
        if mode.is_autoplaying() { " Pause  " } else { " Play  " },
        has_cards,
    ));
    spans.extend(key_hint("s", " Shuffle  ", has_cards));
    spans
}

pub(crate) fn draw_empty(f: &mut Frame, area: Rect, message: &str) {
    let empty = Paragraph::new(message)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(empty, area);
}
