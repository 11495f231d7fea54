//! Terminal rendering of recognized clips and evaluation results.

use crate::error::Result;
use crate::evaluate::EvaluationReport;
use crate::pipeline::{ClipText, TextSink, format_line};
use owo_colors::{OwoColorize, Style};

/// `text` in `style` when `enabled`, plain otherwise.
pub fn paint(text: impl std::fmt::Display, style: Style, enabled: bool) -> String {
    if enabled {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// Style for a clip confidence.
fn confidence_style(confidence: f32) -> Style {
    if confidence >= 0.9 {
        Style::new().green()
    } else if confidence >= 0.7 {
        Style::new()
    } else if confidence >= 0.5 {
        Style::new().yellow()
    } else {
        Style::new().red()
    }
}

/// Longest common subsequence of two word slices as (old, new) index pairs.
fn lcs_indices(old_words: &[&str], new_words: &[&str]) -> Vec<(usize, usize)> {
    let m = old_words.len();
    let n = new_words.len();

    let mut table = vec![vec![0usize; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            table[i][j] = if old_words[i - 1].eq_ignore_ascii_case(new_words[j - 1]) {
                table[i - 1][j - 1] + 1
            } else {
                table[i - 1][j].max(table[i][j - 1])
            };
        }
    }

    let mut matches = Vec::new();
    let (mut i, mut j) = (m, n);
    while i > 0 && j > 0 {
        if old_words[i - 1].eq_ignore_ascii_case(new_words[j - 1]) {
            matches.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if table[i - 1][j] >= table[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    matches.reverse();
    matches
}

#[derive(Debug, PartialEq)]
enum DiffOp<'a> {
    Equal(&'a str),
    /// Recognizer word the corrector removed or replaced.
    Delete(&'a str),
    /// Word the corrector introduced.
    Insert(&'a str),
}

fn word_diff<'a>(old_words: &[&'a str], new_words: &[&'a str]) -> Vec<DiffOp<'a>> {
    let mut ops = Vec::new();
    let (mut oi, mut ni) = (0, 0);

    for (om, nm) in lcs_indices(old_words, new_words) {
        ops.extend(old_words[oi..om].iter().map(|&w| DiffOp::Delete(w)));
        ops.extend(new_words[ni..nm].iter().map(|&w| DiffOp::Insert(w)));
        ops.push(DiffOp::Equal(new_words[nm]));
        oi = om + 1;
        ni = nm + 1;
    }
    ops.extend(old_words[oi..].iter().map(|&w| DiffOp::Delete(w)));
    ops.extend(new_words[ni..].iter().map(|&w| DiffOp::Insert(w)));
    ops
}

/// Corrected sentence with replaced recognizer words shown struck through.
fn render_correction(raw_text: &str, text: &str, style: Style) -> String {
    let old_words: Vec<&str> = raw_text.split_whitespace().collect();
    let new_words: Vec<&str> = text.split_whitespace().collect();

    let mut out = String::new();
    let mut prev_was_delete = false;
    for op in word_diff(&old_words, &new_words) {
        // a Delete followed by an Insert reads as one replacement
        if !out.is_empty() && !(prev_was_delete && matches!(op, DiffOp::Insert(_))) {
            out.push(' ');
        }
        prev_was_delete = matches!(op, DiffOp::Delete(_));
        match op {
            DiffOp::Equal(w) => out.push_str(&w.style(style).to_string()),
            DiffOp::Delete(w) => {
                out.push_str(&format!("[{w}]").strikethrough().dimmed().to_string());
            }
            DiffOp::Insert(w) => out.push_str(w),
        }
    }
    out
}

/// One output line for a recognized clip.
///
/// Without color this is exactly [`format_line`], so piped output stays
/// machine-readable.
pub fn render_clip(text: &ClipText, show_id: bool, color: bool) -> String {
    if !color {
        return format_line(text, show_id);
    }
    let style = confidence_style(text.confidence);
    let body = match &text.raw_text {
        Some(raw) => render_correction(raw, &text.text, style),
        None => text.text.style(style).to_string(),
    };
    if show_id {
        format!("{}\t{body}", text.clip_id.dimmed())
    } else {
        body
    }
}

/// Evaluation table: one row per example, then corpus rates.
pub fn render_evaluation(report: &EvaluationReport, color: bool) -> String {
    let mut out = String::new();
    for score in &report.scores {
        let rates = format!("cer {:.3}  wer {:.3}", score.cer, score.wer);
        if color {
            let style = if score.wer == 0.0 {
                Style::new().green()
            } else {
                confidence_style(1.0 - score.wer as f32)
            };
            out.push_str(&format!(
                "{}\t{}\t{}\n",
                score.id.dimmed(),
                rates,
                score.hypothesis.style(style)
            ));
        } else {
            out.push_str(&format!("{}\t{rates}\t{}\n", score.id, score.hypothesis));
        }
    }
    for (id, message) in &report.failures {
        if color {
            out.push_str(&format!("{}\t{}\n", id.dimmed(), message.red()));
        } else {
            out.push_str(&format!("{id}\tfailed: {message}\n"));
        }
    }
    out.push_str(&format!(
        "examples {}  failures {}  CER {:.4}  WER {:.4}  (mean CER {:.4}, mean WER {:.4})\n",
        report.scores.len(),
        report.failures.len(),
        report.cer(),
        report.wer(),
        report.mean_cer(),
        report.mean_wer()
    ));
    out
}

/// Prints each recognized clip to stdout, colored by confidence on a terminal.
#[derive(Debug, Default)]
pub struct TerminalSink {
    show_ids: bool,
    color: bool,
}

impl TerminalSink {
    pub fn new(show_ids: bool, color: bool) -> Self {
        Self { show_ids, color }
    }
}

impl TextSink for TerminalSink {
    fn handle(&mut self, text: &ClipText) -> Result<()> {
        println!("{}", render_clip(text, self.show_ids, self.color));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "terminal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::ExampleScore;

    #[test]
    fn word_diff_identical_text() {
        let words = ["bin", "blue"];
        let ops = word_diff(&words, &words);
        assert_eq!(ops, vec![DiffOp::Equal("bin"), DiffOp::Equal("blue")]);
    }

    #[test]
    fn word_diff_single_replacement() {
        let ops = word_diff(&["bim", "blue", "at"], &["bin", "blue", "at"]);
        assert_eq!(
            ops,
            vec![
                DiffOp::Delete("bim"),
                DiffOp::Insert("bin"),
                DiffOp::Equal("blue"),
                DiffOp::Equal("at"),
            ]
        );
    }

    #[test]
    fn word_diff_insertion_and_deletion_at_ends() {
        assert_eq!(
            word_diff(&["blue"], &["bin", "blue"]),
            vec![DiffOp::Insert("bin"), DiffOp::Equal("blue")]
        );
        assert_eq!(
            word_diff(&["bin", "blue", "x"], &["bin", "blue"]),
            vec![DiffOp::Equal("bin"), DiffOp::Equal("blue"), DiffOp::Delete("x")]
        );
    }

    #[test]
    fn word_diff_is_case_insensitive() {
        assert_eq!(word_diff(&["BIN"], &["bin"]), vec![DiffOp::Equal("bin")]);
    }

    #[test]
    fn plain_render_matches_line_format() {
        let mut text = ClipText::new("s1/bbaf2n", "bin blue", 0.3);
        text.raw_text = Some("bim blue".into());
        assert_eq!(render_clip(&text, true, false), "s1/bbaf2n\tbin blue");
        assert_eq!(render_clip(&text, false, false), "bin blue");
    }

    #[test]
    fn colored_render_shows_replaced_words() {
        let mut text = ClipText::new("a", "bin blue", 0.95);
        text.raw_text = Some("bim blue".into());
        let line = render_clip(&text, true, true);
        assert!(line.contains("[bim]"));
        assert!(line.contains("bin"));
        assert!(line.contains('\t'));
        assert!(line.contains("\x1b["));
    }

    #[test]
    fn confidence_thresholds() {
        let plain = Style::new();
        assert_eq!("x".style(confidence_style(0.8)).to_string(), "x".style(plain).to_string());
        assert_ne!("x".style(confidence_style(0.95)).to_string(), "x");
        assert_ne!(
            "x".style(confidence_style(0.6)).to_string(),
            "x".style(confidence_style(0.1)).to_string()
        );
    }

    #[test]
    fn paint_is_plain_off_a_terminal() {
        assert_eq!(paint("ready", Style::new().green(), false), "ready");
        assert_eq!(paint(3, Style::new().red(), false), "3");
        let colored = paint("ready", Style::new().green(), true);
        assert!(colored.contains("\x1b[") && colored.contains("ready"));
    }

    #[test]
    fn evaluation_table_plain() {
        let report = EvaluationReport {
            scores: vec![ExampleScore {
                id: "a".into(),
                reference: "bin blue".into(),
                hypothesis: "bin".into(),
                raw_hypothesis: None,
                confidence: 0.5,
                cer: 0.625,
                wer: 0.5,
            }],
            failures: vec![("b".into(), "too short".into())],
            ..EvaluationReport::default()
        };
        let table = render_evaluation(&report, false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "a\tcer 0.625  wer 0.500\tbin");
        assert_eq!(lines[1], "b\tfailed: too short");
        assert!(lines[2].starts_with("examples 1  failures 1"));
    }
}
