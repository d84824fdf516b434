//! # Text Formatter
//!
//! Converts the small markdown subset the backend answers with into an HTML
//! fragment: bold, italic, ordered and bulleted list lines, two heading
//! levels and line breaks. Anything else passes through as text.
//!
//! Formatting is an ordered pipeline of pure `&str -> String` passes:
//!
//! ```text
//! escape → Bold → Italic → OrderedList → UnorderedList → Heading → LineBreak
//! ```
//!
//! Each pass scans the output of the one before it, so a later pass can match
//! text that an earlier pass produced (e.g. an `*` left inside a `<strong>`
//! span still pairs with a later `*` during the italic pass). The tests below
//! pin those cases as current behaviour.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::{Captures, Regex};

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern compiles"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern compiles"));
static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\d+)\.[ \t]+(.*)$").expect("ordered list pattern compiles")
});
static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[*-][ \t]+(.*)$").expect("bullet pattern compiles"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#+)[ \t]+(.*)$").expect("heading pattern compiles"));

// ============================================================================
// Heading table
// ============================================================================

/// Maps a heading marker depth (`#` = 1, `##` = 2, ...) to an HTML heading level.
///
/// Depths without an entry are left as literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMap {
    levels: BTreeMap<usize, u8>,
}

impl HeadingMap {
    /// An empty table: no line is treated as a heading.
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Builder form of [`HeadingMap::insert`].
    pub fn with(mut self, depth: usize, level: u8) -> Self {
        self.insert(depth, level);
        self
    }

    /// Maps `depth` to `<h{level}>`. Returns false (and leaves the table
    /// untouched) when the depth is zero or the level is outside `1..=6`.
    pub fn insert(&mut self, depth: usize, level: u8) -> bool {
        if depth == 0 || !(1..=6).contains(&level) {
            return false;
        }
        self.levels.insert(depth, level);
        true
    }

    pub fn level_for(&self, depth: usize) -> Option<u8> {
        self.levels.get(&depth).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for HeadingMap {
    /// `#` and `##` both render as `<h2>`, `###` as `<h3>`.
    fn default() -> Self {
        HeadingMap::new().with(1, 2).with(2, 2).with(3, 3)
    }
}

// ============================================================================
// Passes
// ============================================================================

/// One rewrite step of the formatting pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Bold,
    Italic,
    OrderedList,
    UnorderedList,
    Heading,
    LineBreak,
}

impl Pass {
    /// The passes in the order they run.
    pub const PIPELINE: [Pass; 6] = [
        Pass::Bold,
        Pass::Italic,
        Pass::OrderedList,
        Pass::UnorderedList,
        Pass::Heading,
        Pass::LineBreak,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pass::Bold => "bold",
            Pass::Italic => "italic",
            Pass::OrderedList => "ordered-list",
            Pass::UnorderedList => "unordered-list",
            Pass::Heading => "heading",
            Pass::LineBreak => "line-break",
        }
    }

    pub fn apply(self, text: &str, headings: &HeadingMap) -> String {
        match self {
            Pass::Bold => bold(text),
            Pass::Italic => italic(text),
            Pass::OrderedList => ordered_list(text),
            Pass::UnorderedList => unordered_list(text),
            Pass::Heading => heading(text, headings),
            Pass::LineBreak => line_breaks(text),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `**text**` → `<strong>text</strong>`, shortest span first.
pub fn bold(text: &str) -> String {
    BOLD.replace_all(text, "<strong>${1}</strong>").into_owned()
}

/// `*text*` → `<em>text</em>`, shortest span first. A lone `*` stays literal.
pub fn italic(text: &str) -> String {
    ITALIC.replace_all(text, "<em>${1}</em>").into_owned()
}

/// `12. body` at the start of a line → list item with a separate number label.
pub fn ordered_list(text: &str) -> String {
    ORDERED_ITEM
        .replace_all(
            text,
            r#"<div class="list-item"><span class="list-number">${1}. </span>${2}</div>"#,
        )
        .into_owned()
}

/// `- body` or `* body` at the start of a line → bullet item.
pub fn unordered_list(text: &str) -> String {
    BULLET_ITEM
        .replace_all(
            text,
            r#"<div class="bullet-item"><span class="bullet">•</span> ${1}</div>"#,
        )
        .into_owned()
}

/// `#... body` at the start of a line → `<hN>` per the heading table.
pub fn heading(text: &str, headings: &HeadingMap) -> String {
    HEADING
        .replace_all(text, |caps: &Captures| {
            match headings.level_for(caps[1].len()) {
                Some(level) => format!("<h{level}>{}</h{level}>", &caps[2]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Every newline → `<br>`.
pub fn line_breaks(text: &str) -> String {
    text.replace('\n', "<br>")
}

/// Escapes the five HTML-significant characters. None of them is markdown
/// syntax for this formatter, so escaping before the passes is safe.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Formatter
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig {
    /// Escape raw text before formatting. When false, HTML in the input
    /// reaches the output untouched.
    pub escape_html: bool,
    pub headings: HeadingMap,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            escape_html: true,
            headings: HeadingMap::default(),
        }
    }
}

/// Renders backend and user text into HTML fragments.
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    config: FormatterConfig,
}

impl TextFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        if !config.escape_html {
            warn!("HTML escaping disabled: formatted output will carry raw markup from its input");
        }
        Self { config }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Formats `text`. Empty input comes back unchanged.
    pub fn format(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let mut out = self.prepare(text);
        for pass in Pass::PIPELINE {
            out = pass.apply(&out, &self.config.headings);
        }
        debug!("Formatted {} bytes into {} bytes", text.len(), out.len());
        out
    }

    /// Like [`TextFormatter::format`], passing `None` through.
    pub fn format_opt(&self, text: Option<&str>) -> Option<String> {
        text.map(|t| self.format(t))
    }

    /// Runs the pipeline and keeps the output of every pass, in order.
    /// The last entry equals `format(text)`.
    pub fn trace(&self, text: &str) -> Vec<(Pass, String)> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut steps: Vec<(Pass, String)> = Vec::with_capacity(Pass::PIPELINE.len());
        let mut current = self.prepare(text);
        for pass in Pass::PIPELINE {
            current = pass.apply(&current, &self.config.headings);
            steps.push((pass, current.clone()));
        }
        steps
    }

    fn prepare(&self, text: &str) -> String {
        if self.config.escape_html {
            escape_html(text)
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(text: &str) -> String {
        TextFormatter::default().format(text)
    }

    fn raw(text: &str) -> String {
        TextFormatter::new(FormatterConfig {
            escape_html: false,
            ..Default::default()
        })
        .format(text)
    }

    /// Generates one test per `input => expected` pair using the default formatter.
    macro_rules! test_format_rules {
        ( $($name:ident: $input:expr => $expected:expr,)+ ) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(fmt($input), $expected);
                }
            )+
        };
    }

    test_format_rules! {
        test_format_bold: "**a**" => "<strong>a</strong>",
        test_format_italic: "*a*" => "<em>a</em>",
        test_format_bold_and_italic: "**b** and *i*" => "<strong>b</strong> and <em>i</em>",
        test_format_ordered_item: "1. first" =>
            r#"<div class="list-item"><span class="list-number">1. </span>first</div>"#,
        test_format_ordered_multi_digit: "12. twelfth" =>
            r#"<div class="list-item"><span class="list-number">12. </span>twelfth</div>"#,
        test_format_dash_bullet: "- item" =>
            r#"<div class="bullet-item"><span class="bullet">•</span> item</div>"#,
        test_format_star_bullet: "* item" =>
            r#"<div class="bullet-item"><span class="bullet">•</span> item</div>"#,
        test_format_h1_marker: "# Title" => "<h2>Title</h2>",
        test_format_h2_marker: "## Title" => "<h2>Title</h2>",
        test_format_h3_marker: "### Sub" => "<h3>Sub</h3>",
        test_format_unmapped_depth_is_literal: "#### Deep" => "#### Deep",
        test_format_heading_needs_space: "#tag" => "#tag",
        test_format_line_break: "line1\nline2" => "line1<br>line2",
        test_format_plain_text: "nothing to see" => "nothing to see",
        test_format_lone_star_is_literal: "2 * 3 = 6" => "2 * 3 = 6",
        test_format_number_without_space: "3.14 is pi" => "3.14 is pi",
    }

    #[test]
    fn test_empty_input_is_identity() {
        assert_eq!(fmt(""), "");
        assert_eq!(TextFormatter::default().format_opt(None), None);
        assert_eq!(
            TextFormatter::default().format_opt(Some("")),
            Some(String::new())
        );
    }

    #[test]
    fn test_bold_is_not_also_italic() {
        let out = fmt("**a**");
        assert!(out.contains("<strong>a</strong>"));
        assert!(!out.contains("<em>"));
    }

    #[test]
    fn test_exactly_one_break_between_lines() {
        let out = fmt("line1\nline2");
        assert_eq!(out.matches("<br>").count(), 1);
    }

    #[test]
    fn test_list_lines_apply_per_line() {
        let out = fmt("1. a\n2. b\n- c");
        assert_eq!(
            out,
            concat!(
                r#"<div class="list-item"><span class="list-number">1. </span>a</div><br>"#,
                r#"<div class="list-item"><span class="list-number">2. </span>b</div><br>"#,
                r#"<div class="bullet-item"><span class="bullet">•</span> c</div>"#,
            )
        );
    }

    #[test]
    fn test_bold_inside_list_item() {
        let out = fmt("- **key** value");
        assert_eq!(
            out,
            r#"<div class="bullet-item"><span class="bullet">•</span> <strong>key</strong> value</div>"#
        );
    }

    #[test]
    fn test_italic_does_not_cross_lines() {
        assert_eq!(fmt("a *b\nc* d"), "a *b<br>c* d");
    }

    // Pass reapplication: later passes see earlier substitutions.

    #[test]
    fn test_star_left_in_bold_pairs_with_later_star() {
        assert_eq!(fmt("**a*b** *c"), "<strong>a<em>b</strong> </em>c");
    }

    #[test]
    fn test_unbalanced_bold_becomes_empty_italic() {
        assert_eq!(fmt("**a"), "<em></em>a");
    }

    #[test]
    fn test_star_bullet_with_italic_on_same_line_is_consumed_by_italic() {
        assert_eq!(fmt("* one *two*"), "<em> one </em>two*");
    }

    // Escaping

    #[test]
    fn test_markup_is_escaped_by_default() {
        assert_eq!(
            fmt("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escaping_keeps_markdown_working() {
        assert_eq!(fmt("**a & b**"), "<strong>a &amp; b</strong>");
        assert_eq!(fmt("# \"Quoted\""), "<h2>&quot;Quoted&quot;</h2>");
    }

    #[test]
    fn test_raw_mode_passes_markup_through() {
        assert_eq!(raw("<b>x</b> *y*"), "<b>x</b> <em>y</em>");
    }

    // Heading table

    #[test]
    fn test_custom_heading_table() {
        let formatter = TextFormatter::new(FormatterConfig {
            headings: HeadingMap::new().with(1, 1).with(3, 4),
            ..Default::default()
        });
        assert_eq!(formatter.format("# Top"), "<h1>Top</h1>");
        assert_eq!(formatter.format("## Skipped"), "## Skipped");
        assert_eq!(formatter.format("### Four"), "<h4>Four</h4>");
    }

    #[test]
    fn test_heading_map_rejects_bad_levels() {
        let mut map = HeadingMap::new();
        assert!(!map.insert(1, 0));
        assert!(!map.insert(1, 7));
        assert!(!map.insert(0, 2));
        assert!(map.is_empty());
        assert!(map.insert(2, 6));
        assert_eq!(map.level_for(2), Some(6));
    }

    // Individual passes

    #[test]
    fn test_passes_in_isolation() {
        let headings = HeadingMap::default();
        assert_eq!(Pass::Bold.apply("**x**", &headings), "<strong>x</strong>");
        assert_eq!(Pass::Italic.apply("*x*", &headings), "<em>x</em>");
        assert_eq!(Pass::LineBreak.apply("a\nb\n", &headings), "a<br>b<br>");
        assert_eq!(Pass::Heading.apply("x\n## y", &headings), "x\n<h2>y</h2>");
        // The bullet pass on its own has no italic pass in front of it.
        assert_eq!(
            Pass::UnorderedList.apply("* a *b*", &headings),
            r#"<div class="bullet-item"><span class="bullet">•</span> a *b*</div>"#
        );
    }

    #[test]
    fn test_trace_ends_with_formatted_output() {
        let formatter = TextFormatter::default();
        let input = "## Steps\n1. **mix**\n- stir";
        let steps = formatter.trace(input);
        assert_eq!(steps.len(), Pass::PIPELINE.len());
        let order: Vec<Pass> = steps.iter().map(|(pass, _)| *pass).collect();
        assert_eq!(order, Pass::PIPELINE.to_vec());
        assert_eq!(steps[0].1, "## Steps\n1. <strong>mix</strong>\n- stir");
        assert_eq!(steps.last().map(|(_, s)| s.clone()), Some(formatter.format(input)));
    }

    #[test]
    fn test_trace_of_empty_input_is_empty() {
        assert!(TextFormatter::default().trace("").is_empty());
    }
}
