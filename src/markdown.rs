//! Markdown to plain text conversion for model output.
//!
//! The conversion is an ordered list of named [`Step`]s. Order matters: links
//! are handled after images so `![alt](src)` is not mistaken for a link, and
//! ```` ```json ```` fences are unwrapped before other code blocks are dropped.
//! [`to_plain_text`] runs the whole pipeline until the text stops changing,
//! which makes the conversion idempotent.

use lazy_static::lazy_static;
use regex::Regex;

/// A single named rewrite of the text.
pub struct Step {
    pub name: &'static str,
    apply: fn(&str) -> String,
}

impl Step {
    pub fn apply(&self, input: &str) -> String {
        (self.apply)(input)
    }
}

lazy_static! {
    static ref JSON_FENCE: Regex = Regex::new(r"```json\s*([\s\S]*?)\s*```").unwrap();
    static ref IMAGE: Regex = Regex::new(r"!\[.*?\]\(.*?\)").unwrap();
    static ref LINK: Regex = Regex::new(r"\[(.*?)\]\(.*?\)").unwrap();
    static ref INLINE_CODE: Regex = Regex::new(r"`(.*?)`").unwrap();
    static ref STRIKETHROUGH: Regex = Regex::new(r"~~(.*?)~~").unwrap();
    static ref STRONG_STAR: Regex = Regex::new(r"\*\*(.*?)\*\*").unwrap();
    static ref STRONG_UNDERSCORE: Regex = Regex::new(r"__(.*?)__").unwrap();
    static ref EMPHASIS_STAR: Regex = Regex::new(r"\*(.*?)\*").unwrap();
    static ref EMPHASIS_UNDERSCORE: Regex = Regex::new(r"_(.*?)_").unwrap();
    // Line markers match horizontal whitespace only, so a marker never swallows
    // the previous line. Repeated markers on one line go in a single match.
    static ref BLOCKQUOTE: Regex = Regex::new(r"(?m)^(?:[ \t]*>[ \t]+)+").unwrap();
    static ref HEADER: Regex = Regex::new(r"(?m)^(?:[ \t]*#{1,6}[ \t]+)+").unwrap();
    static ref CODE_BLOCK: Regex = Regex::new(r"```[\s\S]*?```").unwrap();
    static ref UNORDERED_LIST: Regex = Regex::new(r"(?m)^(?:[ \t]*[-+*][ \t]+)+").unwrap();
    static ref ORDERED_LIST: Regex = Regex::new(r"(?m)^(?:[ \t]*\d+\.[ \t]+)+").unwrap();
    static ref HORIZONTAL_RULE: Regex = Regex::new(r"(?m)^-{3,}$").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

pub fn unwrap_json_fences(input: &str) -> String {
    JSON_FENCE.replace_all(input, "$1").into_owned()
}

pub fn strip_images(input: &str) -> String {
    IMAGE.replace_all(input, "").into_owned()
}

pub fn strip_links(input: &str) -> String {
    LINK.replace_all(input, "$1").into_owned()
}

// Inline code, strikethrough, bold then italic
pub fn strip_inline_markup(input: &str) -> String {
    [
        &*INLINE_CODE,
        &*STRIKETHROUGH,
        &*STRONG_STAR,
        &*STRONG_UNDERSCORE,
        &*EMPHASIS_STAR,
        &*EMPHASIS_UNDERSCORE,
    ]
    .iter()
    .fold(input.to_string(), |text, re| {
        re.replace_all(&text, "$1").into_owned()
    })
}

pub fn strip_blockquotes(input: &str) -> String {
    BLOCKQUOTE.replace_all(input, "").into_owned()
}

pub fn strip_headers(input: &str) -> String {
    HEADER.replace_all(input, "").into_owned()
}

pub fn strip_code_blocks(input: &str) -> String {
    CODE_BLOCK.replace_all(input, "").into_owned()
}

pub fn strip_unordered_lists(input: &str) -> String {
    UNORDERED_LIST.replace_all(input, "").into_owned()
}

pub fn strip_ordered_lists(input: &str) -> String {
    ORDERED_LIST.replace_all(input, "").into_owned()
}

pub fn strip_horizontal_rules(input: &str) -> String {
    HORIZONTAL_RULE.replace_all(input, "").into_owned()
}

pub fn collapse_blank_lines(input: &str) -> String {
    BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

pub fn unescape_dollars(input: &str) -> String {
    input.replace("\\$", "$")
}

pub fn strip_asterisks(input: &str) -> String {
    input.replace('*', "")
}

pub fn trim(input: &str) -> String {
    input.trim().to_string()
}

pub const PIPELINE: &[Step] = &[
    Step { name: "unwrap_json_fences", apply: unwrap_json_fences },
    Step { name: "strip_images", apply: strip_images },
    Step { name: "strip_links", apply: strip_links },
    Step { name: "strip_inline_markup", apply: strip_inline_markup },
    Step { name: "strip_blockquotes", apply: strip_blockquotes },
    Step { name: "strip_headers", apply: strip_headers },
    Step { name: "strip_code_blocks", apply: strip_code_blocks },
    Step { name: "strip_unordered_lists", apply: strip_unordered_lists },
    Step { name: "strip_ordered_lists", apply: strip_ordered_lists },
    Step { name: "strip_horizontal_rules", apply: strip_horizontal_rules },
    Step { name: "collapse_blank_lines", apply: collapse_blank_lines },
    Step { name: "unescape_dollars", apply: unescape_dollars },
    Step { name: "strip_asterisks", apply: strip_asterisks },
    Step { name: "trim", apply: trim },
];

fn run_pipeline(input: &str) -> String {
    PIPELINE
        .iter()
        .fold(input.to_string(), |text, step| step.apply(&text))
}

// A pass that changes the text always makes it shorter, so the loop ends.
// Repeats are only needed when markers of different kinds are interleaved.
pub fn to_plain_text(markdown: &str) -> String {
    let mut current = run_pipeline(markdown);
    loop {
        let next = run_pipeline(&current);
        if next.len() >= current.len() {
            return current;
        }
        current = next;
    }
}
