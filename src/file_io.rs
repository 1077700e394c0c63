use crate::modes::{OptionMark, QuizMode};
use crate::models::AnswerLabel;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keeps report file names portable.
pub fn sanitize_file_stem(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "quiz".to_string() } else { stem }
}

pub fn report_path(dir: &Path, title: &str) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    dir.join(format!("{}-{}.md", sanitize_file_stem(title), timestamp))
}

pub fn render_quiz_report(title: &str, quiz: &QuizMode) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Your Answers for Quiz: {}\n\n", title));
    out.push_str(&format!(
        "**Score:** {}/{}\n\n**Time Taken:** {} sec\n\n",
        quiz.score(),
        quiz.questions().len(),
        quiz.elapsed_seconds()
    ));

    for (qi, question) in quiz.questions().iter().enumerate() {
        out.push_str(&format!(
            "## Question {} of {}\n\n{}\n\n",
            qi + 1,
            quiz.questions().len(),
            question.question
        ));
        for (oi, option) in question.options.iter().enumerate() {
            let label = AnswerLabel::from_index(oi).map_or("?", AnswerLabel::as_str);
            let marker = match quiz.option_mark(qi, oi) {
                OptionMark::Correct => " ✓",
                OptionMark::IncorrectSelected => " ✗ (your answer)",
                OptionMark::Selected | OptionMark::Neutral => "",
            };
            out.push_str(&format!("- {}. {}{}\n", label, option, marker));
        }
        if quiz.answer(qi).is_none() {
            out.push_str("\n_Skipped_\n");
        }
        out.push('\n');
    }

    out
}

/// Writes the submitted quiz to `<dir>/<title>-<timestamp>.md`.
pub fn write_quiz_report(dir: &Path, title: &str, quiz: &QuizMode) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = report_path(dir, title);
    let mut file = fs::File::create(&path)?;
    file.write_all(render_quiz_report(title, quiz).as_bytes())?;
    file.flush()?;
    Ok(path)
}
