//! Render a fetched card (plus comments and children) as a single Markdown
//! document. Pure string building: missing optional fields skip their line
//! or section instead of failing.

use crate::model::{Card, ChecklistItem, Comment};
use crate::util::html::html_to_markdown;

/// Section order is fixed: title, metadata, description, checklists,
/// comments, files, children. Only the description is emitted when empty.
pub fn render_card(card: &Card, comments: &[Comment], children: &[Card]) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", card.title));
    render_metadata(card, &mut out);

    out.push_str("\n## Description\n\n");
    out.push_str(&html_to_markdown(card.description.as_deref().unwrap_or("")));
    out.push('\n');

    render_checklists(card, &mut out);
    render_comments(comments, &mut out);
    render_files(card, &mut out);
    render_children(children, &mut out);

    out
}

fn render_metadata(card: &Card, out: &mut String) {
    out.push_str(&format!("- **ID**: {}\n", card.id));

    if let Some(owner) = card.owner.as_ref().and_then(|o| o.display()) {
        out.push_str(&format!("- **Owner**: {owner}\n"));
    }

    if let (Some(board), Some(column), Some(lane)) = (&card.board, &card.column, &card.lane) {
        let mut path: Vec<&str> = board
            .spaces
            .iter()
            .flatten()
            .filter(|s| s.primary_path)
            .map(|s| s.title.as_str())
            .collect();
        path.push(&board.title);
        path.push(&column.title);
        out.push_str(&format!(
            "- **Location**: {} ({})\n",
            path.join(" / "),
            lane.title
        ));
    }

    if let Some(card_type) = &card.card_type {
        let label = match &card_type.letter {
            Some(letter) => format!("[{letter}] {}", card_type.name),
            None => card_type.name.clone(),
        };
        out.push_str(&format!("- **Type**: {label}\n"));
    }

    if let Some(status) = &card.status {
        out.push_str(&format!("- **Status**: {}\n", status.name));
    }

    if let Some(estimate) = card.estimate {
        out.push_str(&format!("- **Estimate**: {estimate}\n"));
    }

    if card.children_count > 0 {
        out.push_str(&format!(
            "- **Children**: {}/{} completed\n",
            card.children_done, card.children_count
        ));
    }

    let members: Vec<String> = card
        .members_for_display()
        .iter()
        .filter_map(|m| {
            m.user.display().map(|name| {
                if m.is_responsible() {
                    format!("{name} (responsible)")
                } else {
                    name
                }
            })
        })
        .collect();
    if !members.is_empty() {
        out.push_str(&format!("- **Members**: {}\n", members.join(", ")));
    }
}

fn render_checklists(card: &Card, out: &mut String) {
    let grouped = card.checklists.as_deref().unwrap_or(&[]);
    let flat = card.checklist_items.as_deref().unwrap_or(&[]);
    if grouped.is_empty() && flat.is_empty() {
        return;
    }

    out.push_str("\n## Checklists\n");
    for checklist in grouped {
        out.push_str(&format!(
            "\n### {}\n\n",
            checklist.name.as_deref().unwrap_or("Checklist")
        ));
        for item in &checklist.items {
            out.push_str(&render_checklist_item(item));
        }
    }
    // The flat shape only renders when no grouped checklists exist.
    if grouped.is_empty() {
        out.push_str("\n### Checklist\n\n");
        for item in flat {
            out.push_str(&render_checklist_item(item));
        }
    }
}

fn render_checklist_item(item: &ChecklistItem) -> String {
    let mark = if item.is_done() { "x" } else { " " };
    let mut line = format!("- [{mark}] {}", item.label());
    if let Some(due) = &item.due_date {
        line.push_str(&format!(" (due: {due})"));
    }
    if let Some(user) = &item.user {
        if let Some(username) = &user.username {
            line.push_str(&format!(" [@{username}]"));
        } else if let Some(full_name) = &user.full_name {
            line.push_str(&format!(" [{full_name}]"));
        }
    }
    line.push('\n');
    line
}

fn render_comments(comments: &[Comment], out: &mut String) {
    if comments.is_empty() {
        return;
    }
    let mut sorted: Vec<&Comment> = comments.iter().collect();
    // Newest first; sort_by is stable so equal timestamps keep input order.
    sorted.sort_by(|a, b| b.created.cmp(&a.created));

    out.push_str("\n## Comments\n");
    for comment in sorted {
        out.push_str(&format!(
            "\n### By {} at {}\n\n",
            comment.author_name(),
            comment.created.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&html_to_markdown(&comment.text));
        out.push('\n');
    }
}

fn render_files(card: &Card, out: &mut String) {
    let files = match &card.files {
        Some(files) if !files.is_empty() => files,
        _ => return,
    };

    out.push_str("\n## Files\n");
    for file in files {
        let name = file.display_name();
        out.push_str(&format!("\n### {name}\n\n"));
        if file.is_image() {
            out.push_str(&format!("![{name}](./files/{name})\n\n"));
        } else {
            out.push_str(&format!("[{name}](./files/{name})\n\n"));
        }
        out.push_str(&format!("- **Source**: {}\n", file.url));
        out.push_str(&format!("- **Size**: {} bytes\n", file.size));
        if let Some(created) = &file.created {
            out.push_str(&format!("- **Created**: {}\n", created.format("%Y-%m-%d")));
        }
    }
}

fn render_children(children: &[Card], out: &mut String) {
    if children.is_empty() {
        return;
    }
    out.push_str("\n## Children Cards\n\n");
    for child in children {
        let mut line = format!("- [{}](./children/{}/card.md)", child.title, child.id);
        if let Some(status) = &child.status {
            line.push_str(&format!(" - {}", status.name));
        }
        if let Some(letter) = child.card_type.as_ref().and_then(|t| t.letter.as_ref()) {
            line.push_str(&format!(" [{letter}]"));
        }
        if child.children_count > 0 {
            line.push_str(&format!(
                " ({}/{} subtasks)",
                child.children_done, child.children_count
            ));
        }
        line.push('\n');
        out.push_str(&line);
    }
}
