use crate::document::document_title;
use crate::ui::layout::calculate_menu_chunks;
use crate::utils::key_hint;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use std::path::{Path, PathBuf};

pub struct MenuView<'a> {
    pub documents: &'a [PathBuf],
    pub selected_index: usize,
    pub documents_dir: &'a Path,
    pub ai_enabled: bool,
    pub model: &'a str,
    pub error: Option<&'a str>,
}

pub fn draw_menu(f: &mut Frame, menu: &MenuView) {
    let layout = calculate_menu_chunks(f.area());

    let title = Paragraph::new("Learning Modes v0.1.0")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, layout.title_area);

    let items: Vec<ListItem> = if menu.documents.is_empty() {
        vec![ListItem::new(format!(
            "No documents found in {}/ (.txt, .md)",
            menu.documents_dir.display()
        ))
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]
    } else {
        menu.documents
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| document_title(path));
                let style = if i == menu.selected_index {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(name).style(style)
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Documents"),
    );
    f.render_widget(list, layout.list_area);

    let status_content = match (menu.error, menu.ai_enabled) {
        (Some(error), _) => vec![
            Line::from("Error:"),
            Line::from(error.to_string()),
        ],
        (None, true) => vec![
            Line::from("AI: Enabled"),
            Line::from(format!("Model: {}", menu.model)),
        ],
        (None, false) => vec![
            Line::from("AI: Disabled"),
            Line::from("Set OPENROUTER_API_KEY"),
        ],
    };
    let status_color = match (menu.error, menu.ai_enabled) {
        (Some(_), _) => Color::Red,
        (None, true) => Color::Green,
        (None, false) => Color::Yellow,
    };
    let status = Paragraph::new(status_content)
        .style(
            Style::default()
                .fg(status_color)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, layout.status_area);

    let mut spans = Vec::new();
    spans.extend(key_hint("↑/↓", " Navigate  ", true));
    spans.extend(key_hint("Enter", " Study  ", !menu.documents.is_empty()));
    spans.extend(key_hint("Esc/q", " Quit", true));
    let help = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, layout.help_area);
}
