//! Conversion between plain multi-line text and the small HTML subset TestLink
//! stores in its rich text fields (`<p>`, `<ol>`, `<li>`).

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use quick_xml::escape::partial_escape;

/// List marker of the Japanese TestLink spreadsheets (katakana middle dot).
pub const DEFAULT_BULLET: &str = "・";

const EMPTY_PARAGRAPH: &str = "<p></p>";

/// Encodes plain text into TestLink markup and decodes it back.
///
/// A line starting with the bullet marker is a list item; every other
/// non-blank line is a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichTextCodec {
    bullet: String,
}

impl Default for RichTextCodec {
    fn default() -> Self {
        RichTextCodec {
            bullet: DEFAULT_BULLET.to_string(),
        }
    }
}

impl RichTextCodec {
    /// Creates a codec using `bullet` as the list item marker. An empty marker
    /// disables list detection.
    pub fn new(bullet: &str) -> Self {
        RichTextCodec {
            bullet: bullet.to_string(),
        }
    }

    pub fn bullet(&self) -> &str {
        &self.bullet
    }

    /// Converts plain text into markup.
    ///
    /// Blank lines are dropped but still end a run of list items. Returns
    /// `<p></p>` when nothing is left.
    ///
    /// # Arguments
    /// * `plain` - Cell text, one paragraph or list item per line.
    pub fn encode(&self, plain: &str) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut in_list = false;

        for line in plain.lines() {
            let line = line.trim();
            match self.strip_bullet(line) {
                Some(item) => {
                    if !in_list {
                        parts.push("<ol>".to_string());
                        in_list = true;
                    }
                    parts.push(format!("<li><p>{}</p></li>", partial_escape(item.trim())));
                }
                None => {
                    if in_list {
                        parts.push("</ol>".to_string());
                        in_list = false;
                    }
                    if !line.is_empty() {
                        parts.push(format!("<p>{}</p>", partial_escape(line)));
                    }
                }
            }
        }
        if in_list {
            parts.push("</ol>".to_string());
        }

        if parts.is_empty() {
            return EMPTY_PARAGRAPH.to_string();
        }
        parts.join("\n")
    }

    /// Converts markup back into plain text.
    ///
    /// CDATA markers are removed first. Paragraphs and `<br>` become line
    /// breaks, list items become bullet lines, any other tag is dropped
    /// leaving its text, and entities are resolved. Whitespace runs collapse
    /// to one space and blank lines are removed.
    pub fn decode(&self, markup: &str) -> String {
        let stripped = markup.replace("<![CDATA[", "").replace("]]>", "");
        if stripped.trim().is_empty() {
            return String::new();
        }

        let dom = parse_document(RcDom::default(), Default::default()).one(stripped.as_str());

        let mut text = String::new();
        self.collect_text(&dom.document, &mut text);
        normalize_lines(&text)
    }

    fn strip_bullet<'a>(&self, line: &'a str) -> Option<&'a str> {
        if self.bullet.is_empty() {
            return None;
        }
        line.strip_prefix(self.bullet.as_str())
    }

    /// Walks the DOM below `handle`, appending text and line breaks to `out`.
    fn collect_text(&self, handle: &Handle, out: &mut String) {
        for child in handle.children.borrow().iter() {
            match &child.data {
                NodeData::Text { contents } => out.push_str(&contents.borrow()),
                NodeData::Element { name, .. } => match &*name.local {
                    "br" => out.push('\n'),
                    "li" => {
                        let mut item = String::new();
                        self.collect_text(child, &mut item);
                        out.push('\n');
                        out.push_str(&self.bullet);
                        out.push_str(&normalize_lines(&item));
                        out.push('\n');
                    }
                    "p" | "ol" | "ul" | "div" => {
                        out.push('\n');
                        self.collect_text(child, out);
                        out.push('\n');
                    }
                    _ => self.collect_text(child, out),
                },
                _ => {}
            }
        }
    }
}

/// Collapses whitespace inside each line, trims it, and drops blank lines.
fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    // What decode(encode(x)) must give back for markup-free input.
    fn normalize_plain(codec: &RichTextCodec, plain: &str) -> String {
        plain
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| match l.strip_prefix(codec.bullet()) {
                Some(item) => format!("{}{}", codec.bullet(), item.trim()),
                None => l.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_encode_empty() {
        let codec = RichTextCodec::default();
        assert_eq!(codec.encode(""), "<p></p>");
        assert_eq!(codec.encode("\n  \n"), "<p></p>");
    }

    #[test]
    fn test_encode_paragraphs() {
        let codec = RichTextCodec::default();
        assert_eq!(codec.encode("Enter valid credentials"), "<p>Enter valid credentials</p>");
        assert_eq!(
            codec.encode("  first  \n\nsecond\r\n"),
            "<p>first</p>\n<p>second</p>"
        );
    }

    #[test]
    fn test_encode_list_runs() {
        let codec = RichTextCodec::default();
        let plain = "Steps:\n・open\n・ click login\nthen\n・check";
        assert_eq!(
            codec.encode(plain),
            "<p>Steps:</p>\n<ol>\n<li><p>open</p></li>\n<li><p>click login</p></li>\n</ol>\n<p>then</p>\n<ol>\n<li><p>check</p></li>\n</ol>"
        );
    }

    #[test]
    fn test_encode_blank_line_splits_list() {
        let codec = RichTextCodec::default();
        assert_eq!(
            codec.encode("・a\n\n・b"),
            "<ol>\n<li><p>a</p></li>\n</ol>\n<ol>\n<li><p>b</p></li>\n</ol>"
        );
    }

    #[test]
    fn test_encode_escapes() {
        let codec = RichTextCodec::default();
        assert_eq!(
            codec.encode("a < b & c > d"),
            "<p>a &lt; b &amp; c &gt; d</p>"
        );
        assert_eq!(codec.encode("・<tag>"), "<ol>\n<li><p>&lt;tag&gt;</p></li>\n</ol>");
    }

    #[test]
    fn test_encode_custom_bullet() {
        let codec = RichTextCodec::new("- ");
        assert_eq!(codec.encode("- one"), "<ol>\n<li><p>one</p></li>\n</ol>");
        let no_lists = RichTextCodec::new("");
        assert_eq!(no_lists.encode("・one"), "<p>・one</p>");
    }

    #[test]
    fn test_decode_empty() {
        let codec = RichTextCodec::default();
        assert_eq!(codec.decode(""), "");
        assert_eq!(codec.decode("<p></p>"), "");
        assert_eq!(codec.decode("<![CDATA[]]>"), "");
    }

    #[test]
    fn test_decode_paragraphs_and_breaks() {
        let codec = RichTextCodec::default();
        assert_eq!(codec.decode("<p>  one  </p>\n<p>two</p>"), "one\ntwo");
        assert_eq!(codec.decode("<p>one<br>two<br/>three</p>"), "one\ntwo\nthree");
        assert_eq!(codec.decode("plain text"), "plain text");
    }

    #[test]
    fn test_decode_lists() {
        let codec = RichTextCodec::default();
        assert_eq!(
            codec.decode("<ol><li><p>a</p></li><li>b</li></ol><ul><li>c</li></ul>"),
            "・a\n・b\n・c"
        );
        assert_eq!(
            codec.decode("<ol><li><p>first</p><p>more</p></li></ol>"),
            "・first\nmore"
        );
    }

    #[test]
    fn test_decode_strips_unknown_tags_and_cdata() {
        let codec = RichTextCodec::default();
        assert_eq!(
            codec.decode("<![CDATA[<p><strong>Bold</strong> and <em>em</em></p>]]>"),
            "Bold and em"
        );
        assert_eq!(codec.decode("<div><span>x</span></div>"), "x");
    }

    #[test]
    fn test_decode_entities_and_whitespace() {
        let codec = RichTextCodec::default();
        assert_eq!(
            codec.decode("<p>a&nbsp;&nbsp;b &lt;c&gt; &amp; &quot;d&quot; &#39;e&#39;</p>"),
            "a b <c> & \"d\" 'e'"
        );
        assert_eq!(codec.decode("<p>x \t  y</p>\n\n\n<p>z</p>"), "x y\nz");
    }

    #[test]
    fn test_encode_decode_identity() {
        let codec = RichTextCodec::default();
        let samples = [
            "",
            "single line",
            "line one\nline two",
            "  padded  \n\n\n  lines  ",
            "intro\n・first\n・ second\n\n・third\noutro",
            "・only\n・items",
            "a & b",
            "日本語のテキスト\n・項目１\n・項目２",
        ];
        for plain in samples {
            assert_eq!(
                codec.decode(&codec.encode(plain)),
                normalize_plain(&codec, plain),
                "sample: {:?}",
                plain
            );
        }
    }
}
