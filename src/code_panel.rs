//! Syntax-highlighted code panel.
//!
//! Rendering is two passes over the same source. The measure pass tokenizes every line,
//! wraps at token boundaries and derives the panel size. The paint pass re-tokenizes,
//! paints one character at a time (wrapping mid-token when a row overflows) and stops once
//! the row cap is reached. Both passes share only the inputs.

use log::error;

use crate::config::FontSettings;
use crate::error::RenderError;
use crate::highlight::{Grammar, LanguageRegistry};
use crate::surface::{FontSpec, RoundedRect, Surface};
use crate::theme::Color;
use crate::token::{Category, Token};

/// Outcome of the measure pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    /// Unwrapped source lines, as split on `\n`. Rows produced by wrapping are only
    /// reflected in `counted`.
    pub source_lines: Vec<String>,
    pub line_height: f32,
    /// Background height: counted rows plus top and bottom padding.
    pub height: f32,
    /// Background width, never more than the requested maximum.
    pub width: f32,
    /// Visual rows that contribute to `height`.
    pub counted: usize,
}

/// Rows that fit in `max_height`.
pub fn row_cap(max_height: f32, line_height: f32) -> usize {
    if line_height <= 0.0 {
        return 0;
    }
    (max_height / line_height).floor().max(0.0) as usize
}

fn resolve_grammar(language: Option<&str>) -> Result<&'static Grammar, RenderError> {
    let id = language.unwrap_or_default();
    LanguageRegistry::builtin()
        .get(id)
        .ok_or_else(|| RenderError::UnsupportedLanguage(id.to_string()))
}

/// Measure pass only. `None` when the language has no grammar.
pub fn layout_code<S: Surface>(
    surface: &S,
    code: &str,
    language: Option<&str>,
    max_width: f32,
    max_height: f32,
    settings: &FontSettings,
) -> Option<LineLayout> {
    match resolve_grammar(language) {
        Ok(grammar) => Some(measure(surface, code, grammar, max_width.max(0.0), max_height, settings)),
        Err(e) => {
            error!("{e}");
            None
        }
    }
}

fn measure<S: Surface>(
    surface: &S,
    code: &str,
    grammar: &Grammar,
    max_width: f32,
    max_height: f32,
    settings: &FontSettings,
) -> LineLayout {
    let font = FontSpec::new(settings.code_family(), settings.code_size);
    let padding = settings.panel_padding;
    let line_height = FontSettings::line_height(settings.code_size);
    let cap = row_cap(max_height, line_height);
    let lines: Vec<String> = code.split('\n').map(str::to_string).collect();

    let mut width: f32 = 0.0;
    let mut rows = 0usize;
    for line in &lines {
        match measure_line(surface, line, grammar, &font, padding, max_width) {
            Ok((line_rows, line_width)) => {
                rows += line_rows;
                width = width.max(line_width);
            }
            Err(e) => {
                error!("Failed to measure code line {line:?}: {e}");
                width = max_width;
            }
        }
    }

    let counted = rows.min(cap);
    LineLayout {
        source_lines: lines,
        line_height,
        height: counted as f32 * line_height + 2.0 * padding,
        width: width.min(max_width),
        counted,
    }
}

/// Rows and widest row (including both paddings) of one source line, wrapping whole tokens.
fn measure_line<S: Surface>(
    surface: &S,
    line: &str,
    grammar: &Grammar,
    font: &FontSpec,
    padding: f32,
    max_width: f32,
) -> Result<(usize, f32), RenderError> {
    let tokens = grammar.tokenize(line)?;
    let mut cursor = padding;
    let mut rows = 1;
    let mut widest: f32 = 0.0;
    for token in &tokens {
        // wrap only once more text follows the overflowing token
        if cursor > max_width {
            cursor = padding;
            rows += 1;
        }
        cursor += surface.measure_text(&token.flatten(), font)?.width;
        widest = widest.max(cursor + padding);
    }
    widest = widest.max(cursor + padding);
    Ok((rows, widest))
}

/// Color for a top-level token; nested categories inherit their parent's color.
pub fn token_color(category: Option<Category>, settings: &FontSettings) -> Color {
    let hl = &settings.highlight;
    let chosen = match category {
        Some(Category::Comment) => hl.comment,
        Some(Category::String | Category::Number) => hl.string.or(hl.number),
        Some(Category::Keyword) => hl.keyword,
        Some(Category::Function) => hl.function,
        Some(Category::Parameter) => hl.parameter,
        Some(Category::Variable) => hl.variable,
        Some(Category::Operator | Category::Punctuation) => hl.operator.or(hl.punctuation),
        _ => None,
    };
    chosen.unwrap_or(settings.code_color)
}

/// Paint the panel at (`x`, `y`) and return the height it reserves.
///
/// Returns 0 without painting when the language is unsupported. The height comes from
/// the measure pass, so it is a layout reservation rather than a report of what was painted.
#[allow(clippy::too_many_arguments)]
pub fn render_code_panel<S: Surface>(
    surface: &mut S,
    code: &str,
    language: Option<&str>,
    x: f32,
    y: f32,
    max_width: f32,
    max_height: f32,
    settings: &FontSettings,
) -> f32 {
    let grammar = match resolve_grammar(language) {
        Ok(g) => g,
        Err(e) => {
            error!("{e}");
            return 0.0;
        }
    };
    let max_width = max_width.max(0.0);
    let layout = measure(surface, code, grammar, max_width, max_height, settings);
    let rect = RoundedRect::new(x, y, layout.width, layout.height, settings.panel_radius);

    if let Err(e) = surface
        .fill_rounded_rect(rect, settings.code_background)
        .and_then(|_| surface.stroke_rounded_rect(rect, settings.panel_border_color, 1.0))
    {
        error!("Failed to draw code panel background at ({x}, {y}): {e}");
        return 0.0;
    }

    let mut painter = RowPainter {
        font: FontSpec::new(settings.code_family(), settings.code_size),
        left: x + settings.panel_padding,
        right: x + max_width,
        cursor: x + settings.panel_padding,
        baseline: y + settings.panel_padding + layout.line_height,
        line_height: layout.line_height,
        rows: 0,
        cap: row_cap(max_height, layout.line_height),
    };

    match surface.clipped(rect) {
        Ok(mut clipped) => {
            for line in &layout.source_lines {
                if painter.full() {
                    break;
                }
                let tokens = match grammar.tokenize(line) {
                    Ok(tokens) => tokens,
                    Err(e) => {
                        error!("Failed to highlight {line:?}: {e}");
                        continue;
                    }
                };
                if let Err(e) = painter.paint_line(&mut *clipped, &tokens, settings) {
                    error!("Failed to paint code line {line:?}: {e}");
                }
                painter.next_row();
            }
        }
        Err(e) => error!("Failed to clip code panel: {e}"),
    }

    layout.height
}

/// Cursor state of the paint pass.
struct RowPainter<'a> {
    font: FontSpec<'a>,
    left: f32,
    right: f32,
    cursor: f32,
    baseline: f32,
    line_height: f32,
    rows: usize,
    cap: usize,
}

impl RowPainter<'_> {
    fn full(&self) -> bool {
        self.rows >= self.cap
    }

    fn next_row(&mut self) {
        self.cursor = self.left;
        self.baseline += self.line_height;
        self.rows += 1;
    }

    fn paint_line<S: Surface>(&mut self, surface: &mut S, tokens: &[Token], settings: &FontSettings) -> Result<(), RenderError> {
        let mut buf = [0u8; 4];
        for token in tokens {
            let color = token_color(token.category(), settings);
            for ch in token.flatten().chars() {
                if self.cursor > self.right {
                    self.next_row();
                }
                if self.full() {
                    return Ok(());
                }
                let glyph: &str = ch.encode_utf8(&mut buf);
                if !ch.is_whitespace() {
                    surface.fill_text(glyph, self.cursor, self.baseline, &self.font, color)?;
                }
                self.cursor += surface.measure_text(glyph, &self.font)?.width;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HighlightColors;
    use crate::surface::testing::{Op, RecordingSurface};

    /// Code font 16px: 8px per char, 21px rows.
    fn settings() -> FontSettings {
        FontSettings {
            font_family: "Mono".into(),
            highlight: HighlightColors {
                keyword: Some(Color::rgb(255, 0, 0)),
                number: Some(Color::rgb(0, 255, 0)),
                operator: Some(Color::rgb(0, 0, 255)),
                ..HighlightColors::default()
            },
            ..FontSettings::default()
        }
    }

    #[test]
    fn single_line_panel_geometry() {
        let mut surface = RecordingSurface::new(600, 400);
        let height = render_code_panel(&mut surface, "const x = 1;", Some("javascript"), 10.0, 10.0, 580.0, 300.0, &settings());
        assert_eq!(height, 21.0 + 20.0);
        // 12 chars * 8px + both paddings
        assert_eq!(surface.rects(), vec![RoundedRect::new(10.0, 10.0, 116.0, 41.0, 8.0)]);
        let texts = surface.texts();
        assert_eq!(texts[0].0, "c");
        assert_eq!((texts[0].1, texts[0].2), (20.0, 41.0));
    }

    #[test]
    fn colors_follow_categories() {
        let mut surface = RecordingSurface::new(600, 400);
        render_code_panel(&mut surface, "const x = 1;", Some("js"), 0.0, 0.0, 580.0, 300.0, &settings());
        let color_of = |s: &str| surface.texts().into_iter().find(|t| t.0 == s).map(|t| t.3);
        let s = settings();
        assert_eq!(color_of("c"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(color_of("x"), Some(s.code_color));
        // number falls back from string to number color
        assert_eq!(color_of("1"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(color_of("="), Some(Color::rgb(0, 0, 255)));
        // punctuation falls back to the operator color
        assert_eq!(color_of(";"), Some(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn dispatch_chain_defaults_to_body_color() {
        let s = FontSettings::default();
        for category in [None, Some(Category::Keyword), Some(Category::Boolean), Some(Category::TemplateString)] {
            assert_eq!(token_color(category, &s), s.code_color);
        }
        let mut s = FontSettings::default();
        s.highlight.string = Some(Color::WHITE);
        s.highlight.number = Some(Color::BLACK);
        assert_eq!(token_color(Some(Category::Number), &s), Color::WHITE);
    }

    #[test]
    fn unsupported_language_paints_nothing() {
        let mut surface = RecordingSurface::new(600, 400);
        let height = render_code_panel(&mut surface, "+[-->+<]", Some("brainfuck"), 10.0, 10.0, 580.0, 300.0, &settings());
        assert_eq!(height, 0.0);
        assert!(surface.ops.is_empty());
        assert_eq!(render_code_panel(&mut surface, "x", None, 0.0, 0.0, 580.0, 300.0, &settings()), 0.0);
    }

    #[test]
    fn height_is_capped() {
        let code: String = (0..40).map(|i| format!("x{i}\n")).collect();
        let mut surface = RecordingSurface::new(600, 400);
        let height = render_code_panel(&mut surface, &code, Some("plain"), 0.0, 0.0, 580.0, 100.0, &settings());
        // floor(100 / 21) = 4 rows
        assert_eq!(height, 4.0 * 21.0 + 20.0);
        let last_baseline = surface.texts().iter().map(|t| t.2).fold(0.0, f32::max);
        assert_eq!(last_baseline, 10.0 + 4.0 * 21.0);
    }

    #[test]
    fn cap_counts_wrapped_rows() {
        for lines in [1usize, 3, 9, 30] {
            let code = vec!["aaaa bbbb cccc dddd"; lines].join("\n");
            let layout = layout_code(&RecordingSurface::new(600, 400), &code, Some("plain"), 60.0, 130.0, &settings()).unwrap();
            assert!(layout.counted <= row_cap(130.0, 21.0));
            assert_eq!(layout.height, layout.counted as f32 * 21.0 + 20.0);
        }
    }

    #[test]
    fn long_lines_wrap_mid_token_when_painting() {
        let mut surface = RecordingSurface::new(600, 400);
        // 40px wide: 10px padding + 3 chars, then wrap
        render_code_panel(&mut surface, "abcdefgh", Some("plain"), 0.0, 0.0, 40.0, 300.0, &settings());
        let rows: Vec<f32> = surface.texts().iter().map(|t| t.2).collect();
        assert_eq!(rows.first(), Some(&31.0));
        assert!(rows.iter().any(|&y| y > 31.0));
        assert_eq!(surface.rects()[0].width, 40.0);
    }

    #[test]
    fn overflowing_last_token_adds_no_row() {
        // 10px padding + 3 * 8px overflows 30px, but nothing follows on that line
        let layout = layout_code(&RecordingSurface::new(600, 400), "abc", Some("plain"), 30.0, 300.0, &settings()).unwrap();
        assert_eq!(layout.counted, 1);
        assert_eq!(layout.height, 21.0 + 20.0);

        let mut surface = RecordingSurface::new(600, 400);
        render_code_panel(&mut surface, "abc\nd", Some("plain"), 0.0, 0.0, 30.0, 300.0, &settings());
        let baselines: Vec<(String, f32)> = surface.texts().into_iter().map(|t| (t.0, t.2)).collect();
        assert_eq!(baselines, vec![("a".into(), 31.0), ("b".into(), 31.0), ("c".into(), 31.0), ("d".into(), 52.0)]);
    }

    #[test]
    fn token_following_overflow_starts_new_row() {
        // "ab", "=" and "cd" are separate tokens; "ab" alone overflows 20px
        let layout = layout_code(&RecordingSurface::new(600, 400), "ab=cd", Some("javascript"), 20.0, 300.0, &settings()).unwrap();
        assert_eq!(layout.counted, 2);
    }

    #[test]
    fn empty_code_is_one_empty_row() {
        let layout = layout_code(&RecordingSurface::new(600, 400), "", Some("rust"), 580.0, 300.0, &settings()).unwrap();
        assert_eq!(layout.source_lines, vec![String::new()]);
        assert_eq!(layout.counted, 1);
        assert_eq!(layout.width, 20.0);
    }

    #[test]
    fn zero_width_paints_no_background() {
        let mut surface = RecordingSurface::new(600, 400);
        let height = render_code_panel(&mut surface, "let x = 1;", Some("rust"), 0.0, 0.0, 0.0, 300.0, &settings());
        assert!(height > 0.0);
        assert_eq!(surface.rects()[0].width, 0.0);
    }

    #[test]
    fn failing_line_takes_full_width_and_rest_continue() {
        let mut surface = RecordingSurface::new(600, 400);
        surface.fail_on = Some('@');
        let layout = layout_code(&surface, "ok\n@bad\nfine", Some("plain"), 300.0, 300.0, &settings()).unwrap();
        assert_eq!(layout.width, 300.0);
        assert_eq!(layout.counted, 2);

        render_code_panel(&mut surface, "ok\n@bad\nfine", Some("plain"), 0.0, 0.0, 300.0, 300.0, &settings());
        assert!(surface.texts().iter().any(|t| t.0 == "f"));
    }

    #[test]
    fn painting_is_clipped_to_panel() {
        let mut surface = RecordingSurface::new(600, 400);
        render_code_panel(&mut surface, "a", Some("plain"), 5.0, 5.0, 100.0, 300.0, &settings());
        assert!(matches!(surface.ops.iter().find(|op| matches!(op, Op::PushClip(_))), Some(Op::PushClip(r)) if r.x == 5.0));
        assert_eq!(surface.ops.last(), Some(&Op::PopClip));
        assert_eq!(surface.clip_depth, 0);
    }
}
