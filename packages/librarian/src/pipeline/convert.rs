//! Fragment converter - message markup to structured blocks.
//!
//! Pure and deterministic: takes the inner HTML of one message and returns
//! its content as an ordered list of [`StructuredBlock`]s. Only the direct
//! children of the content container are visited; anything nested inside a
//! paragraph or list item is flattened to its text.
//!
//! Unrecognized markup is skipped, never an error.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::types::document::StructuredBlock;

/// Converts message fragments into structured blocks.
///
/// The container selectors pick the element whose children are converted;
/// the first selector matching inside the fragment wins, and the fragment
/// root is used when none match.
#[derive(Debug, Clone, Default)]
pub struct FragmentConverter {
    container_selectors: Vec<String>,
}

impl FragmentConverter {
    /// Converter that walks the fragment root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter that looks for a content container first.
    pub fn with_containers(selectors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            container_selectors: selectors.into_iter().map(Into::into).collect(),
        }
    }

    /// Convert an HTML fragment. Source child order is preserved and blocks
    /// without visible text are dropped.
    pub fn convert(&self, html: &str) -> Vec<StructuredBlock> {
        let fragment = Html::parse_fragment(html);
        let root = fragment.root_element();
        let container = self.find_container(root).unwrap_or(root);

        container
            .children()
            .filter_map(|node| {
                if let Some(text) = node.value().as_text() {
                    let text = text.trim();
                    return (!text.is_empty()).then(|| StructuredBlock::raw(text));
                }
                ElementRef::wrap(node).and_then(convert_element)
            })
            .filter(|block| !block.is_empty())
            .collect()
    }

    fn find_container<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        for raw in &self.container_selectors {
            let selector = match Selector::parse(raw) {
                Ok(s) => s,
                Err(_) => {
                    debug!(selector = %raw, "Skipping unparsable container selector");
                    continue;
                }
            };
            if let Some(found) = root.select(&selector).next() {
                return Some(found);
            }
        }
        None
    }
}

/// Convert a fragment by walking its root.
pub fn convert(html: &str) -> Vec<StructuredBlock> {
    FragmentConverter::new().convert(html)
}

/// Flattened, whitespace-collapsed text of a fragment with scripts and
/// styles removed.
pub fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    for node in fragment.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style"))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn convert_element(element: ElementRef<'_>) -> Option<StructuredBlock> {
    let name = element.value().name();
    match name {
        "p" => Some(StructuredBlock::paragraph(element_text(element).trim())),
        "ol" | "ul" => {
            let items: Vec<String> = element
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name() == "li")
                .map(|li| element_text(li).trim().to_string())
                .collect();
            Some(StructuredBlock::list(name == "ol", items))
        }
        "pre" => Some(code_block(element)),
        "h1" | "h2" | "h3" | "h4" => {
            let level = name[1..].parse::<u8>().ok()?;
            Some(StructuredBlock::heading(level, element_text(element).trim()))
        }
        _ => None,
    }
}

fn code_block(pre: ElementRef<'_>) -> StructuredBlock {
    let nested = || pre.descendants().skip(1).filter_map(ElementRef::wrap);

    let language = nested().find_map(|el| {
        el.value()
            .classes()
            .find_map(|class| class.strip_prefix("language-"))
            .map(str::to_string)
    });

    let text = nested()
        .find(|el| el.value().name() == "code")
        .map(element_text)
        .unwrap_or_default();

    StructuredBlock::code(
        language.filter(|l| !l.is_empty()),
        text.trim_end_matches('\n'),
    )
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_code_block_language_and_text() {
        let blocks =
            convert(r#"<pre><div class="language-python"></div><code>print(1)</code></pre>"#);
        assert_eq!(
            blocks,
            vec![StructuredBlock::code(Some("python".into()), "print(1)")]
        );
    }

    #[test]
    fn test_code_block_nested_in_language_wrapper() {
        let blocks = convert(
            r#"<pre><div class="flex language-rust"><span>rust</span><code>fn main() {}</code></div></pre>"#,
        );
        assert_eq!(
            blocks,
            vec![StructuredBlock::code(Some("rust".into()), "fn main() {}")]
        );
    }

    #[test]
    fn test_code_block_without_language_or_code() {
        assert_eq!(
            convert("<pre><code>ls -la</code></pre>"),
            vec![StructuredBlock::code(None, "ls -la")]
        );
        // no <code>: empty text, so the block is dropped
        assert!(convert("<pre>bare</pre>").is_empty());
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(
            convert("<ol><li>a</li><li>b</li></ol>"),
            vec![StructuredBlock::list(true, ["a", "b"])]
        );
    }

    #[test]
    fn test_list_items_flatten_nested_markup() {
        let blocks = convert("<ul><li><strong>bold</strong> tail</li><li><p>inner</p></li></ul>");
        assert_eq!(
            blocks,
            vec![StructuredBlock::list(false, ["bold tail", "inner"])]
        );
    }

    #[test]
    fn test_list_keeps_one_item_per_li() {
        assert_eq!(
            convert("<ul><li>a</li><li> </li><li>b</li></ul>"),
            vec![StructuredBlock::list(false, ["a", "", "b"])]
        );
        // a list of only blank items is still empty
        assert!(convert("<ol><li></li><li>  </li></ol>").is_empty());
    }

    #[test]
    fn test_headings_and_paragraphs_in_order() {
        let blocks = convert("<h2>Title</h2><p>First <em>line</em></p>loose text<h4>Small</h4>");
        assert_eq!(
            blocks,
            vec![
                StructuredBlock::heading(2, "Title"),
                StructuredBlock::paragraph("First line"),
                StructuredBlock::raw("loose text"),
                StructuredBlock::heading(4, "Small"),
            ]
        );
    }

    #[test]
    fn test_unknown_and_empty_children_are_skipped() {
        let blocks = convert("<div>ignored</div><h5>too deep</h5><p>   </p><table></table><p>kept</p>");
        assert_eq!(blocks, vec![StructuredBlock::paragraph("kept")]);
    }

    #[test]
    fn test_container_selector_picks_content_root() {
        let converter = FragmentConverter::with_containers(["div.markdown", "div.whitespace-pre-wrap"]);
        let html = r#"<div class="avatar">GPT</div><div class="markdown prose"><p>Hello</p><ul><li>x</li></ul></div>"#;
        assert_eq!(
            converter.convert(html),
            vec![
                StructuredBlock::paragraph("Hello"),
                StructuredBlock::list(false, ["x"]),
            ]
        );
    }

    #[test]
    fn test_container_falls_through_to_second_candidate() {
        let converter = FragmentConverter::with_containers(["div.markdown", "div.whitespace-pre-wrap"]);
        let html = r#"<div><div class="whitespace-pre-wrap">what is a monad?</div></div>"#;
        assert_eq!(
            converter.convert(html),
            vec![StructuredBlock::raw("what is a monad?")]
        );
    }

    #[test]
    fn test_one_level_only() {
        // children of an unrecognized wrapper are not visited
        assert!(convert("<section><p>hidden</p></section>").is_empty());
    }

    #[test]
    fn test_fragment_text_drops_scripts() {
        let text = fragment_text("<div>Hello <script>var x;</script>\n  <b>world</b><style>p{}</style></div>");
        assert_eq!(text, "Hello world");
    }

    fn tag_for(kind: u8) -> (&'static str, &'static str) {
        match kind {
            0 => ("<p>", "</p>"),
            1 => ("<h1>", "</h1>"),
            2 => ("<h3>", "</h3>"),
            3 => ("<ul><li>", "</li></ul>"),
            4 => ("<ol><li>", "</li></ol>"),
            _ => ("<pre><code>", "</code></pre>"),
        }
    }

    proptest! {
        #[test]
        fn prop_convert_preserves_child_order(
            parts in prop::collection::vec((0u8..6, "[a-z]{1,8}( [a-z]{1,8}){0,3}"), 0..12)
        ) {
            let html: String = parts
                .iter()
                .map(|(kind, text)| {
                    let (open, close) = tag_for(*kind);
                    format!("{open}{text}{close}")
                })
                .collect();

            let blocks = convert(&html);
            prop_assert_eq!(blocks.len(), parts.len());
            for (block, (_, text)) in blocks.iter().zip(parts.iter()) {
                prop_assert_eq!(&block.text(), text);
                prop_assert!(!block.text().trim().is_empty());
            }
        }
    }
}
