use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap},
};
use rag_on_tap_core::ChatRole;

use crate::app::{App, BackendStatus};
use crate::markdown;

const AMBER: Color = Color::Yellow;
const SIDEBAR_WIDTH: u16 = 28;
const MIN_WIDTH_FOR_SIDEBAR: u16 = 80;
const MAX_INPUT_LINES: u16 = 5;

const PLACEHOLDER: &str = "Ask about IPAs, stouts, brewing tips...";
const DISCLAIMER: &str = "RAG-on-Tap AI can make mistakes. Check important recipe details.";
const RECENT_QUERIES: [&str; 3] = [
    "Hoppy IPAs with Citra",
    "Stout brewing techniques",
    "Belgian Yeast profiles",
];

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Sidebar only when there is room for it
    let main_area = if area.width >= MIN_WIDTH_FOR_SIDEBAR {
        let [sidebar_area, main_area] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
                .areas(area);
        render_sidebar(frame, sidebar_area);
        main_area
    } else {
        area
    };

    let input_lines = (app.input.split('\n').count() as u16).clamp(1, MAX_INPUT_LINES);

    // Main column: header, transcript, input, disclaimer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_lines + 2),
        Constraint::Length(1),
    ])
    .areas(main_area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(frame, footer_area);

    if app.welcome.is_open() {
        render_welcome(frame, area);
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [top_area, bottom_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(inner);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("🍺", Style::default().bg(AMBER).fg(Color::Black)),
            Span::styled(" Beer RAG on steroids !", Style::default().bold()),
        ]),
        Line::default(),
        Line::from(Span::styled(
            " ↻ New Session ",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        )),
        Line::default(),
        Line::from(Span::styled(
            " RECENT QUERIES",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        )),
    ];
    lines.extend(RECENT_QUERIES.iter().map(|query| {
        Line::from(Span::styled(format!("  {query}"), Style::default().fg(Color::Gray)))
    }));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), top_area);

    let footer = Paragraph::new(vec![
        Line::from(" ⓘ About HyPE RAG"),
        Line::from(" ⌂ View Source"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(footer, bottom_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = match app.backend_status {
        BackendStatus::Checking => Span::styled("○ connecting", Style::default().fg(Color::Gray)),
        BackendStatus::Online => Span::styled("● online", Style::default().fg(Color::Green)),
        BackendStatus::Offline => Span::styled("● offline", Style::default().fg(Color::Red)),
    };

    let title = Line::from(vec![
        Span::styled(" Beer RAG ", Style::default().fg(AMBER).bold()),
        Span::raw(" "),
        Span::styled(
            format!(" {} ", app.model_label),
            Style::default().fg(AMBER).bg(Color::Black),
        ),
        Span::raw("  "),
        status,
        Span::styled(
            format!("  session {}", app.conversation.session_id().short()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("  v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default().padding(Padding::horizontal(1));
    let inner = block.inner(area);
    app.chat_area = Some(area);

    let chat = Paragraph::new(Text::from(transcript_lines(app))).wrap(Wrap { trim: false });

    // Keep the newest turn in view unless the user scrolled away. Rows are
    // counted with the same word wrapper the paragraph renders with.
    let total_rows = u16::try_from(chat.line_count(inner.width)).unwrap_or(u16::MAX);
    app.max_chat_scroll = total_rows.saturating_sub(inner.height);
    app.chat_scroll = if app.follow_bottom {
        app.max_chat_scroll
    } else {
        app.chat_scroll.min(app.max_chat_scroll)
    };

    let chat = chat.block(block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let pending = app.conversation.pending_index();
    let mut lines: Vec<Line<'static>> = Vec::new();

    for (i, msg) in app.conversation.turns().iter().enumerate() {
        match msg.role {
            ChatRole::User => {
                lines.push(
                    Line::from(Span::styled(
                        "You",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ))
                    .right_aligned(),
                );
                for line in msg.content.split('\n') {
                    lines.push(
                        Line::from(Span::styled(line.to_string(), Style::default().fg(AMBER)))
                            .right_aligned(),
                    );
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(vec![
                    Span::raw("🍺 "),
                    Span::styled(
                        "RAG-on-Tap",
                        Style::default().fg(AMBER).add_modifier(Modifier::BOLD),
                    ),
                ]));
                if pending == Some(i) && msg.content.is_empty() {
                    lines.push(typing_indicator(app.animation_frame));
                } else {
                    lines.extend(markdown::render(&msg.content));
                }
            }
        }
        lines.push(Line::default());
    }

    lines
}

/// Three dots with the active one highlighted, cycling on each tick.
fn typing_indicator(frame: u8) -> Line<'static> {
    let dots: Vec<Span<'static>> = (0..3)
        .map(|k| {
            let color = if k == frame { AMBER } else { Color::DarkGray };
            Span::styled("● ", Style::default().fg(color))
        })
        .collect();
    Line::from(dots)
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.is_streaming() { Color::DarkGray } else { AMBER };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);
    let send_style = if app.can_send() {
        Style::default().bg(AMBER).fg(Color::Black).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let hints = if app.is_streaming() {
        Line::from(vec![
            Span::styled(" Ctrl+X ", key_style),
            Span::styled(" stop ", label_style),
        ])
    } else {
        Line::from(vec![
            Span::styled(" Alt+Enter ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" Enter send ", send_style),
        ])
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ")
        .title_bottom(hints.right_aligned());
    let inner = block.inner(area);

    if app.input.is_empty() {
        let placeholder = Paragraph::new(PLACEHOLDER)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
    } else {
        let (row, col) = app.cursor_row_col();

        // Scroll so the cursor stays visible in both directions
        let visible_rows = inner.height.max(1) as usize;
        let row_offset = row.saturating_sub(visible_rows - 1);
        let inner_width = inner.width as usize;
        let col_offset = if inner_width == 0 {
            0
        } else if col >= inner_width {
            col - inner_width + 1
        } else {
            0
        };

        let input = Paragraph::new(app.input.as_str())
            .style(Style::default().fg(Color::White))
            .block(block)
            .scroll((row_offset as u16, col_offset as u16));
        frame.render_widget(input, area);
    }

    if !app.welcome.is_open() {
        let (row, col) = app.cursor_row_col();
        let visible_rows = inner.height.max(1) as usize;
        let inner_width = (inner.width as usize).max(1);
        let cursor_y = row.min(visible_rows - 1) as u16;
        let cursor_x = col.min(inner_width - 1) as u16;
        frame.set_cursor_position((inner.x + cursor_x, inner.y + cursor_y));
    }
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(DISCLAIMER).centered())
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, area);
}

fn render_welcome(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(area, 64, 20);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(AMBER))
        .title(Span::styled(
            " Welcome to RAG-on-Tap! 🍻 ",
            Style::default().fg(AMBER).add_modifier(Modifier::BOLD),
        ))
        .padding(Padding::new(2, 2, 1, 1));

    let text = vec![
        Line::from(
            "Beer RAG is your intelligent brewing companion. It uses \
             Retrieval-Augmented Generation to help you discover beer recipes, \
             master brewing styles, and understand ingredients with precision.",
        ),
        Line::default(),
        Line::from(
            "Whether you're a novice homebrewer or a seasoned pro, our AI is here \
             to tap into a deep well of brewing knowledge for you.",
        ),
        Line::default(),
        Line::from(Span::styled(
            "Note: To respect your privacy, no chat data is persisted in our \
             systems for more than 7 days.",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
        Line::default(),
        Line::from(Span::styled(
            "  Start Brewing  ",
            Style::default().bg(AMBER).fg(Color::Black).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::from(Span::styled("Enter to continue", Style::default().fg(Color::DarkGray)))
            .centered(),
    ];

    let welcome = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(welcome, popup_area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4)).max(1);
    let height = height.min(area.height.saturating_sub(2)).max(1);
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{drain, test_app};
    use rag_on_tap_core::WelcomeState;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut screen = String::new();
        for row in buffer.content.chunks(buffer.area.width as usize) {
            for cell in row {
                screen.push_str(cell.symbol());
            }
            screen.push('\n');
        }
        screen
    }

    #[test]
    fn renders_greeting_sidebar_and_disclaimer() {
        let (mut app, _rx) = test_app(vec![]);
        let screen = draw(&mut app, 120, 30);

        assert!(screen.contains("Cheers! I am RAG-on-Tap."));
        assert!(screen.contains("Beer RAG on steroids !"));
        assert!(screen.contains("Stout brewing techniques"));
        assert!(screen.contains("Gemini 2.5 Flash Lite"));
        assert!(screen.contains("Check important recipe details."));
        assert!(screen.contains(PLACEHOLDER));
    }

    #[test]
    fn narrow_terminal_hides_sidebar() {
        let (mut app, _rx) = test_app(vec![]);
        let screen = draw(&mut app, 60, 30);
        assert!(!screen.contains("RECENT QUERIES"));
        assert!(screen.contains("Cheers!"));
    }

    #[test]
    fn welcome_modal_shows_until_dismissed() {
        let (mut app, _rx) = test_app(vec![]);
        app.welcome = WelcomeState::Unseen;
        assert!(draw(&mut app, 120, 30).contains("Start Brewing"));

        app.dismiss_welcome();
        assert!(!draw(&mut app, 120, 30).contains("Start Brewing"));
    }

    #[tokio::test]
    async fn long_transcript_follows_bottom() {
        let (mut app, mut rx) = test_app(vec!["Pale malt, Cascade, US-05.\n\nMash at 66C."]);
        for n in 0..6 {
            app.input = format!("Recipe number {n}?");
            assert!(app.submit());
            drain(&mut app, &mut rx).await;
        }

        let screen = draw(&mut app, 100, 20);
        assert!(app.max_chat_scroll > 0);
        assert_eq!(app.chat_scroll, app.max_chat_scroll);
        assert!(screen.contains("Recipe number 5?"));
    }

    #[tokio::test]
    async fn pending_reply_shows_typing_indicator() {
        let (mut app, _rx) = test_app(vec!["later"]);
        app.input = "Is it ready?".to_string();
        assert!(app.submit());

        let screen = draw(&mut app, 120, 30);
        assert!(screen.contains("●"));
        assert!(screen.contains("stop"));
    }

    #[tokio::test]
    async fn follows_bottom_of_word_wrapped_reply() {
        let words = "abcdefghijklmnop ".repeat(40);
        let reply: &'static str = format!("{words} FINALWORD").leak();
        let (mut app, mut rx) = test_app(vec![reply]);
        app.input = "Describe a long lagering schedule".to_string();
        assert!(app.submit());
        drain(&mut app, &mut rx).await;

        let screen = draw(&mut app, 60, 20);
        assert!(app.follow_bottom);
        assert_eq!(app.chat_scroll, app.max_chat_scroll);
        assert!(screen.contains("FINALWORD"));
    }
}
