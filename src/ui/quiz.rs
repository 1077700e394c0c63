use crate::models::AnswerLabel;
use crate::modes::{OptionMark, QuizMode, QuizPhase};
use crate::ui::flashcards::draw_empty;
use crate::utils::{centered_rect, key_hint};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

fn wrapped_height(line: &Line, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    let line_width: usize = line.spans.iter().map(|s| s.content.width()).sum();
    line_width.div_ceil(width).max(1)
}

fn option_line(label: AnswerLabel, text: &str, mark: OptionMark) -> Line<'static> {
    let (prefix, style) = match mark {
        OptionMark::Neutral => ("  ", Style::default()),
        OptionMark::Selected => (
            "● ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        OptionMark::Correct => (
            "✓ ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        OptionMark::IncorrectSelected => (
            "✗ ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };
    Line::from(Span::styled(format!("  {}{}. {}", prefix, label, text), style))
}

/// Lines for every question plus the line index where each question starts.
fn quiz_text(mode: &QuizMode) -> (Text<'static>, Vec<usize>) {
    let mut text = Text::default();
    let mut starts = Vec::with_capacity(mode.questions().len());
    let total = mode.questions().len();

    if mode.is_submitted() {
        text.push_line(Line::from(Span::styled(
            "Your Answers for Quiz",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));
        text.push_line(Line::from(format!(
            "Score: {}/{}    Time Taken: {} sec",
            mode.score(),
            total,
            mode.elapsed_seconds()
        )));
        text.push_line(Line::from(""));
    }

    for (qi, question) in mode.questions().iter().enumerate() {
        starts.push(text.lines.len());
        let focused = qi == mode.focus() && !mode.is_submitted();
        let heading_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        };
        text.push_line(Line::from(Span::styled(
            format!(
                "{}Question {} of {}",
                if focused { "▶ " } else { "" },
                qi + 1,
                total
            ),
            heading_style,
        )));
        text.push_line(Line::from(question.question.clone()));
        for (oi, option) in question.options.iter().enumerate() {
            if let Some(label) = AnswerLabel::from_index(oi) {
                text.push_line(option_line(label, option, mode.option_mark(qi, oi)));
            }
        }
        if mode.is_submitted() && mode.answer(qi).is_none() {
            text.push_line(Line::from(Span::styled(
                "  Skipped",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        text.push_line(Line::from(""));
    }

    (text, starts)
}

pub fn draw_quiz(f: &mut Frame, area: Rect, mode: &QuizMode) {
    if mode.questions().is_empty() {
        draw_empty(f, area, "No quiz questions available. Press g to generate again.");
        return;
    }

    let (text, starts) = quiz_text(mode);
    let inner_width = area.width.saturating_sub(2) as usize;

    // Keep the focused question at the top; after submission start from the summary.
    let scroll = if mode.is_submitted() {
        0
    } else {
        let first_line = starts.get(mode.focus()).copied().unwrap_or(0);
        text.lines[..first_line]
            .iter()
            .map(|line| wrapped_height(line, inner_width))
            .sum::<usize>()
    };

    let title = match mode.phase() {
        QuizPhase::Finalizing => "Quiz (submitting…)",
        QuizPhase::Submitted => "Quiz Results",
        _ => "Quiz",
    };
    let quiz = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((scroll.min(u16::MAX as usize) as u16, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(quiz, area);

    if let QuizPhase::ReviewPrompt { skipped } = mode.phase() {
        draw_review_prompt(f, area, skipped);
    }
}

fn draw_review_prompt(f: &mut Frame, area: Rect, skipped: usize) {
    let popup = centered_rect(70, 50, area);
    f.render_widget(Clear, popup);

    let mut spans = Vec::new();
    spans.extend(key_hint("r", " Review skipped  ", true));
    spans.extend(key_hint("y", " Submit anyway", true));

    let text = vec![
        Line::from(Span::styled(
            format!(
                "You have skipped {} question{}",
                skipped,
                if skipped == 1 { "" } else { "s" }
            ),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Do you want to go back and review them before submitting?"),
        Line::from(""),
        Line::from(spans),
    ];
    let dialog = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title("Submit Quiz"),
        );
    f.render_widget(dialog, popup);
}

pub fn quiz_help(mode: &QuizMode) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if mode.is_submitted() {
        spans.extend(key_hint("p", " Print Results  ", true));
        return spans;
    }
    let answering = mode.phase() == QuizPhase::Answering && !mode.questions().is_empty();
    spans.extend(key_hint("↑/↓", " Question  ", answering));
    spans.extend(key_hint("a-d", " Answer  ", answering));
    spans.extend(key_hint("k", " Don't know  ", answering));
    spans.extend(key_hint("Enter", " Submit  ", answering));
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_height() {
        let line = Line::from("abcdefghij");
        assert_eq!(wrapped_height(&line, 5), 2);
        assert_eq!(wrapped_height(&line, 10), 1);
        assert_eq!(wrapped_height(&Line::from(""), 10), 1);
        assert_eq!(wrapped_height(&line, 0), 1);
    }
}
