// Terminal summary of a run — final translation plus a similarity table

use std::fmt::Write;

use crate::refinement::Trace;

const BAR_WIDTH: usize = 20;

/// Fixed-width bar for a score in `[0, 1]`.
pub fn similarity_bar(similarity: f64) -> String {
    let filled = (similarity.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Render the per-iteration table followed by the final translation.
pub fn render_summary(trace: &Trace, epsilon: f64) -> String {
    let mut out = String::new();

    if trace.is_empty() {
        out.push_str("No iterations completed.\n");
        return out;
    }

    let _ = writeln!(out, "{:>4}  {:<8}  {:<width$}  critique", "iter", "score", "", width = BAR_WIDTH);
    for record in trace {
        let critique = record
            .critique
            .as_deref()
            .map(first_line)
            .unwrap_or("-");
        let _ = writeln!(
            out,
            "{:>4}  {:<8.4}  {}  {}",
            record.iteration,
            record.similarity,
            similarity_bar(record.similarity),
            truncate(critique, 60)
        );
    }

    let status = if trace.converged(epsilon) {
        "converged"
    } else {
        "budget exhausted"
    };
    let _ = writeln!(
        out,
        "\n{} after {} iteration(s), final similarity {:.4}",
        status,
        trace.len(),
        trace.final_similarity().unwrap_or(0.0)
    );
    let _ = writeln!(out, "\n{}", trace.final_translation().unwrap_or_default());
    out
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
