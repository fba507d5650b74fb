//! Just enough markdown for chat replies: headings, bullet lists, fenced
//! code, `inline code`, **bold** and *italic*.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const CODE_STYLE: Style = Style::new().fg(Color::Green);

/// Render a whole reply into styled lines.
pub fn render(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_fence = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();

        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }

        if in_fence {
            lines.push(Line::from(Span::styled(format!("  {raw}"), CODE_STYLE)));
            continue;
        }

        lines.push(render_block_line(raw));
    }

    lines
}

fn render_block_line(raw: &str) -> Line<'static> {
    let indent = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim_start();

    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
        let heading = trimmed[hashes..].trim();
        return Line::from(Span::styled(
            heading.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    if let Some(item) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| trimmed.strip_prefix("+ "))
    {
        let mut spans = vec![Span::raw(format!("{}• ", " ".repeat(indent)))];
        spans.extend(parse_markdown_line(item).spans);
        return Line::from(spans);
    }

    parse_markdown_line(raw)
}

/// Parse a line of text and convert `code`, **bold** and *italic* markdown to styled spans
pub fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        match c {
            '`' => {
                let mut code = String::new();
                let mut found_close = false;
                for c in chars.by_ref() {
                    if c == '`' {
                        found_close = true;
                        break;
                    }
                    code.push(c);
                }

                if found_close {
                    if !current_text.is_empty() {
                        spans.push(Span::raw(std::mem::take(&mut current_text)));
                    }
                    spans.push(Span::styled(code, CODE_STYLE));
                } else {
                    current_text.push('`');
                    current_text.push_str(&code);
                }
            }
            '*' | '_' if chars.peek() == Some(&c) => {
                // Consume the second marker
                chars.next();

                let mut bold_text = String::new();
                let mut found_close = false;
                while let Some(inner) = chars.next() {
                    if inner == c && chars.peek() == Some(&c) {
                        chars.next();
                        found_close = true;
                        break;
                    }
                    bold_text.push(inner);
                }

                if found_close && !bold_text.is_empty() {
                    if !current_text.is_empty() {
                        spans.push(Span::raw(std::mem::take(&mut current_text)));
                    }
                    spans.push(Span::styled(
                        bold_text,
                        Style::default().add_modifier(Modifier::BOLD),
                    ));
                } else {
                    // No closing marker, treat as literal
                    current_text.push(c);
                    current_text.push(c);
                    current_text.push_str(&bold_text);
                }
            }
            '*' if chars.peek().is_some_and(|next| !next.is_whitespace()) => {
                // Single marker: italic only if it closes on this line
                let rest: String = chars.clone().collect();
                match rest.find(c) {
                    Some(end) if end > 0 => {
                        let italic: String = rest[..end].to_string();
                        for _ in 0..italic.chars().count() + 1 {
                            chars.next();
                        }
                        if !current_text.is_empty() {
                            spans.push(Span::raw(std::mem::take(&mut current_text)));
                        }
                        spans.push(Span::styled(
                            italic,
                            Style::default().add_modifier(Modifier::ITALIC),
                        ));
                    }
                    _ => current_text.push(c),
                }
            }
            _ => current_text.push(c),
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn bold_becomes_a_bold_span() {
        let line = parse_markdown_line("Use **Citra** hops");
        assert_eq!(text_of(&line), "Use Citra hops");
        assert_eq!(line.spans[1].content, "Citra");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn unclosed_bold_is_literal() {
        let line = parse_markdown_line("2 ** 3");
        assert_eq!(text_of(&line), "2 ** 3");
    }

    #[test]
    fn italic_and_code() {
        let line = parse_markdown_line("Pitch *Saccharomyces* at `18C`");
        assert_eq!(text_of(&line), "Pitch Saccharomyces at 18C");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::ITALIC));
        assert_eq!(line.spans[3].style, CODE_STYLE);
    }

    #[test]
    fn lone_asterisk_stays() {
        let line = parse_markdown_line("5 * 4 gallons");
        assert_eq!(text_of(&line), "5 * 4 gallons");
    }

    #[test]
    fn headings_and_bullets() {
        let lines = render("## Mash\n- 65C for *60* min\n  * sparge");
        assert_eq!(text_of(&lines[0]), "Mash");
        assert_eq!(text_of(&lines[1]), "• 65C for 60 min");
        assert_eq!(text_of(&lines[2]), "  • sparge");
    }

    #[test]
    fn fenced_code_is_kept_verbatim() {
        let lines = render("Recipe:\n```\nOG **1.060**\n```\nDone");
        assert_eq!(lines.len(), 3);
        assert_eq!(text_of(&lines[1]), "  OG **1.060**");
        assert_eq!(text_of(&lines[2]), "Done");
    }
}
