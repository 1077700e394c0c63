use crate::controller::{ModeController, NotificationKind};
use crate::models::LearningMode;
use crate::modes::ModeView;
use crate::ui::flashcards::{draw_empty, draw_flashcards, flashcard_help};
use crate::ui::layout::calculate_learning_chunks;
use crate::ui::match_game::{draw_match, match_help};
use crate::ui::quiz::{draw_quiz, quiz_help};
use crate::utils::{centered_rect, key_hint, truncate_string};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph},
    Frame,
};

pub fn draw_learning(f: &mut Frame, controller: &ModeController) {
    let layout = calculate_learning_chunks(f.area());

    let header_width = layout.header_area.width.saturating_sub(4) as usize;
    let header = Paragraph::new(truncate_string(
        &format!("{} - {}", controller.title(), controller.active_mode().label()),
        header_width,
    ))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, layout.header_area);

    match controller.view() {
        _ if controller.is_loading() => draw_progress(f, layout.body_area, controller),
        Some(ModeView::Flashcards(mode)) => draw_flashcards(f, layout.body_area, mode),
        Some(ModeView::Quiz(mode)) => draw_quiz(f, layout.body_area, mode),
        Some(ModeView::Match(mode)) => draw_match(f, layout.body_area, mode),
        None => draw_empty(f, layout.body_area, "Nothing to study yet. Press g to generate."),
    }

    let mut spans = match controller.view() {
        Some(ModeView::Flashcards(mode)) => flashcard_help(mode),
        Some(ModeView::Quiz(mode)) => quiz_help(mode),
        Some(ModeView::Match(mode)) => match_help(mode),
        None => Vec::new(),
    };
    spans.extend(key_hint("m", " Mode  ", true));
    spans.extend(key_hint("g", " Regenerate  ", !controller.is_loading()));
    spans.extend(key_hint("x", " Exit", true));
    let help = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, layout.help_area);

    if let Some(notification) = controller.notification() {
        let color = match notification.kind {
            NotificationKind::Info => Color::Green,
            NotificationKind::Error => Color::Red,
        };
        let line = Paragraph::new(notification.message.as_str())
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        f.render_widget(line, layout.notification_area);
    }

    if controller.selector_open() {
        draw_mode_selector(f, controller.active_mode(), controller.selector_index());
    }
}

fn draw_progress(f: &mut Frame, area: Rect, controller: &ModeController) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Generating {}", controller.active_mode().schema().noun()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .percent(controller.progress_percent().min(100))
        .label(format!("{}%", controller.progress_percent()));
    f.render_widget(gauge, chunks[1]);

    let status = Paragraph::new(controller.status_line())
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(status, chunks[3]);
}

fn draw_mode_selector(f: &mut Frame, active: LearningMode, highlighted: usize) {
    let area = centered_rect(40, 40, f.area());
    f.render_widget(Clear, area);

    let items: Vec<ListItem> = LearningMode::ALL
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let marker = if *mode == active { "● " } else { "  " };
            let style = if i == highlighted {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else if *mode == active {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::from(marker),
                Span::from(format!("{} {}", i + 1, mode.label())),
            ]))
            .style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Select Mode"),
    );
    f.render_widget(list, area);
}
