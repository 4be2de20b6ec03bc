//! Canonical comparison form for raw code text.
//!
//! Normalization is the first step of every dedup comparison: trailing
//! whitespace is stripped per line, runs of blank lines collapse to one,
//! leading and trailing blank lines are dropped, and line endings unify to
//! `\n`. Indentation and semantic content are preserved. The function is
//! pure and a fixed point under re-application.

/// Normalize raw code text into its canonical comparison form.
///
/// Non-empty output always ends with exactly one `\n`; input that contains
/// no non-blank line normalizes to the empty string.
pub fn normalize(code: &str) -> String {
    let unified = code.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;
    for line in unified.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || lines.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }

    // Trailing blank lines survive the forward pass; drop them here.
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        return String::new();
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
