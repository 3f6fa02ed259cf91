//! Convert the HTML the Kaiten API serves (card descriptions, comment
//! bodies) into Markdown, preserving headings, lists, emphasis, and links.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;

/// Convert an HTML fragment to Markdown. Empty or whitespace-only input
/// yields an empty string.
pub fn html_to_markdown(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    for child in fragment.root_element().children() {
        render_block(child, &mut out);
    }
    out.trim().to_string()
}

fn render_block(node: NodeRef<Node>, out: &mut String) {
    match node.value() {
        Node::Text(_) => {
            let text = render_inline(node);
            if !text.trim().is_empty() {
                push_inline(out, &text);
            }
        }
        Node::Element(el) => match el.name() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = (el.name().as_bytes()[1] - b'0') as usize;
                start_block(out);
                out.push_str(&"#".repeat(level));
                out.push(' ');
                out.push_str(render_inline_children(node).trim());
            }
            "p" => {
                let text = render_inline_children(node);
                let text = text.trim();
                if !text.is_empty() {
                    start_block(out);
                    out.push_str(text);
                }
            }
            "ul" => render_list(node, out, 0, false),
            "ol" => render_list(node, out, 0, true),
            "blockquote" => {
                let mut inner = String::new();
                for child in node.children() {
                    render_block(child, &mut inner);
                }
                start_block(out);
                let quoted: Vec<String> = inner
                    .trim()
                    .lines()
                    .map(|line| format!("> {line}").trim_end().to_string())
                    .collect();
                out.push_str(&quoted.join("\n"));
            }
            "pre" => {
                start_block(out);
                out.push_str("```\n");
                out.push_str(raw_text(node).trim_end());
                out.push_str("\n```");
            }
            "hr" => {
                start_block(out);
                out.push_str("---");
            }
            "br" => out.push('\n'),
            "div" | "section" | "article" | "body" => {
                for child in node.children() {
                    render_block(child, out);
                }
            }
            // Inline elements at the top level of a fragment.
            _ => {
                let text = render_inline(node);
                if !text.trim().is_empty() {
                    push_inline(out, &text);
                }
            }
        },
        _ => {}
    }
}

fn render_list(node: NodeRef<Node>, out: &mut String, depth: usize, ordered: bool) {
    if depth == 0 {
        start_block(out);
    }
    let mut index = 1usize;
    for child in node.children() {
        let Node::Element(el) = child.value() else {
            continue;
        };
        if el.name() != "li" {
            continue;
        }
        let indent = "  ".repeat(depth);
        let marker = if ordered {
            format!("{index}. ")
        } else {
            "- ".to_string()
        };
        let mut text = String::new();
        let mut nested: Vec<(NodeRef<Node>, bool)> = Vec::new();
        for part in child.children() {
            match part.value() {
                Node::Element(pe) if pe.name() == "ul" => nested.push((part, false)),
                Node::Element(pe) if pe.name() == "ol" => nested.push((part, true)),
                _ => text.push_str(&render_inline(part)),
            }
        }
        push_line(out, &format!("{indent}{marker}{}", text.trim()));
        for (list, ord) in nested {
            render_list(list, out, depth + 1, ord);
        }
        index += 1;
    }
}

fn render_inline(node: NodeRef<Node>) -> String {
    match node.value() {
        Node::Text(text) => collapse_whitespace(&text),
        Node::Element(el) => match el.name() {
            "strong" | "b" => wrap(render_inline_children(node), "**"),
            "em" | "i" => wrap(render_inline_children(node), "*"),
            "del" | "s" | "strike" => wrap(render_inline_children(node), "~~"),
            "code" => format!("`{}`", raw_text(node)),
            "br" => "\n".to_string(),
            "a" => {
                let href = el.attr("href").unwrap_or("");
                let label = render_inline_children(node);
                let label = label.trim();
                if label.is_empty() {
                    format!("[{href}]({href})")
                } else {
                    format!("[{label}]({href})")
                }
            }
            "img" => {
                let src = el.attr("src").unwrap_or("");
                let alt = el.attr("alt").unwrap_or("");
                format!("![{alt}]({src})")
            }
            _ => render_inline_children(node),
        },
        _ => String::new(),
    }
}

fn render_inline_children(node: NodeRef<Node>) -> String {
    node.children().map(render_inline).collect()
}

/// Descendant text with no whitespace collapsing, for code spans and blocks.
fn raw_text(node: NodeRef<Node>) -> String {
    let mut out = String::new();
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text),
            Node::Element(_) => out.push_str(&raw_text(child)),
            _ => {}
        }
    }
    out
}

fn wrap(inner: String, marker: &str) -> String {
    let inner = inner.trim();
    if inner.is_empty() {
        String::new()
    } else {
        format!("{marker}{inner}{marker}")
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out
}

/// Separate the upcoming block from what came before with one blank line.
fn start_block(out: &mut String) {
    if out.is_empty() {
        return;
    }
    while out.ends_with([' ', '\n']) {
        out.pop();
    }
    out.push_str("\n\n");
}

fn push_line(out: &mut String, line: &str) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(line);
    out.push('\n');
}

fn push_inline(out: &mut String, text: &str) {
    if out.is_empty() || out.ends_with('\n') {
        out.push_str(text.trim_start());
    } else {
        out.push_str(text);
    }
}
