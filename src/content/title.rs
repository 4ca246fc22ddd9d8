use crate::util::strip_control_chars;
use scraper::{Html, Node};

/// Parses a fetched body as an HTML document.
///
/// The parser is lenient: malformed markup never fails, it only records
/// parse errors, which are logged at debug level. Invalid UTF-8 sequences are
/// replaced rather than rejected.
pub fn parse_html(body: &[u8]) -> Html {
    let document = Html::parse_document(&String::from_utf8_lossy(body));
    if !document.errors.is_empty() {
        tracing::debug!(
            errors = document.errors.len(),
            "HTML parsed with recoverable errors"
        );
    }
    document
}

/// Finds the first `<title>` element in document order and returns its text.
///
/// Only the title's first child is considered, and only if it is a text
/// node; the result is whitespace-trimmed. Returns an empty string when there
/// is no title element or when the first one has no text child.
///
/// The walk is an iterative pre-order traversal of the parse tree, so deeply
/// nested documents cannot exhaust the stack.
pub fn extract_title(document: &Html) -> String {
    for node in document.tree.root().descendants() {
        let Node::Element(element) = node.value() else {
            continue;
        };
        if element.name() != "title" {
            continue;
        }

        return match node.first_child().and_then(|child| child.value().as_text()) {
            Some(text) => strip_control_chars(text.trim()).into_owned(),
            None => {
                tracing::debug!("Title element has no text child");
                String::new()
            }
        };
    }
    String::new()
}

/// Convenience wrapper: parse `body` and extract its title.
///
/// CPU-bound on large pages; async callers run it on the blocking pool. The
/// parsed document (not `Send`) never leaves this call.
pub fn title_from_html(body: &[u8]) -> String {
    extract_title(&parse_html(body))
}
