use quick_xml::escape::{escape, partial_escape};

/// How the text of an element is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapPolicy {
    /// Always inside a CDATA section, even when empty.
    AlwaysCdata,
    /// Inside a CDATA section when non-empty.
    CdataIfPresent,
    /// Escaped inline.
    Escaped,
}

impl WrapPolicy {
    /// The policy TestLink's importer expects for `tag`.
    pub fn for_tag(tag: &str) -> Self {
        match tag {
            "summary" | "preconditions" | "actions" | "expectedresults" | "details" => {
                WrapPolicy::AlwaysCdata
            }
            "node_order" | "externalid" | "version" | "step_number" | "execution_type"
            | "importance" | "status" | "is_open" | "active" | "name" | "value" => {
                WrapPolicy::CdataIfPresent
            }
            _ => WrapPolicy::Escaped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Children(Vec<Element>),
}

/// A node of the markup tree handed to the serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    /// Attributes in output order.
    pub attrs: Vec<(String, String)>,
    pub content: Content,
}

impl Element {
    pub fn text(tag: &str, text: &str) -> Self {
        Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            content: Content::Text(text.to_string()),
        }
    }

    pub fn parent(tag: &str, children: Vec<Element>) -> Self {
        Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            content: Content::Children(children),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Renders the element and its descendants, one tab of indentation per
    /// level starting at `depth`. Every line ends with `\n`.
    pub fn render(&self, depth: usize, out: &mut String) {
        let indent = "\t".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        out.push('>');

        match &self.content {
            Content::Children(children) if !children.is_empty() => {
                out.push('\n');
                for child in children {
                    child.render(depth + 1, out);
                }
                out.push_str(&indent);
            }
            Content::Children(_) => {}
            Content::Text(text) => match WrapPolicy::for_tag(&self.tag) {
                WrapPolicy::AlwaysCdata => push_cdata(text, out),
                WrapPolicy::CdataIfPresent if !text.is_empty() => push_cdata(text, out),
                _ if text.trim().is_empty() => {}
                _ => out.push_str(&partial_escape(text.as_str())),
            },
        }

        out.push_str("</");
        out.push_str(&self.tag);
        out.push_str(">\n");
    }
}

/// Writes `text` as a CDATA section, splitting any `]]>` across two sections.
fn push_cdata(text: &str, out: &mut String) {
    out.push_str("<![CDATA[");
    out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]>");
}
