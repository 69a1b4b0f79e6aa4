//! Greedy word wrap against a measured pixel width.

use log::error;

use crate::error::RenderError;

/// Wrap `text` into lines no wider than `max_width` where possible.
///
/// Words are separated by single spaces and never split; a word wider than `max_width`
/// gets a line of its own. The trailing line is always emitted, so empty input yields one
/// empty line. Joining the result with `" "` gives back `text`.
///
/// If `measure` fails the whole wrap is abandoned and an empty list is returned: callers
/// then paint nothing for this block rather than half a block. The failure is logged.
pub fn wrap_text<F>(text: &str, measure: F, max_width: f32) -> Vec<String>
where
    F: Fn(&str) -> Result<f32, RenderError>,
{
    match try_wrap(text, &measure, max_width) {
        Ok(lines) => lines,
        Err(e) => {
            error!("Failed to wrap {text:?}: {e}");
            Vec::new()
        }
    }
}

fn try_wrap<F>(text: &str, measure: &F, max_width: f32) -> Result<Vec<String>, RenderError>
where
    F: Fn(&str) -> Result<f32, RenderError>,
{
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut has_word = false;

    for word in text.split(' ') {
        let candidate = if has_word { format!("{current} {word}") } else { word.to_string() };
        if has_word && measure(&candidate)? > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
        has_word = true;
    }
    lines.push(current);
    Ok(lines)
}
