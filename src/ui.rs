use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use unicode_width::UnicodeWidthChar;
use crate::app::App;
use crate::locale::Locale;
use crate::message::{Message, Role};

/// The input box grows with the draft up to this many text rows.
const MAX_INPUT_ROWS: usize = 5;

/// Turn `**bold**` runs into bold spans. An unmatched `**` stays literal.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    let balanced = parts.len() % 2 == 1;
    let last = parts.len() - 1;

    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let inside = i % 2 == 1;
        if inside && !balanced && i == last {
            spans.push(Span::raw(format!("**{}", part)));
        } else if inside && part.is_empty() {
            spans.push(Span::raw("****"));
        } else if inside {
            spans.push(Span::styled(
                part.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else if !part.is_empty() {
            spans.push(Span::raw(part.to_string()));
        }
    }

    Line::from(spans)
}

/// Hard-wrap a styled line to `width` display columns, keeping span styles.
/// Wide (CJK) characters count as two columns and are never split.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line];
    }

    let mut rows: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;

    for span in line.spans {
        let style = span.style;
        let mut chunk = String::new();
        for c in span.content.chars() {
            let w = c.width().unwrap_or(0);
            if current_width + w > width && current_width > 0 {
                if !chunk.is_empty() {
                    current.push(Span::styled(std::mem::take(&mut chunk), style));
                }
                rows.push(Line::from(std::mem::take(&mut current)));
                current_width = 0;
            }
            chunk.push(c);
            current_width += w;
        }
        if !chunk.is_empty() {
            current.push(Span::styled(chunk, style));
        }
    }

    rows.push(Line::from(current));
    rows
}

fn wrapped_rows(text: &str, width: usize) -> Vec<Line<'static>> {
    text.split('\n')
        .flat_map(|segment| wrap_line(Line::raw(segment.to_string()), width))
        .collect()
}

/// Row and column of the draft cursor inside an input box `width` columns wide.
fn cursor_position(draft: &str, cursor: usize, width: usize) -> (usize, usize) {
    let prefix: String = draft.chars().take(cursor).collect();
    let rows = wrapped_rows(&prefix, width);
    let mut row = rows.len().saturating_sub(1);
    let mut col = rows.last().map(|l| l.width()).unwrap_or(0);
    if width > 0 && col >= width {
        row += 1;
        col = 0;
    }
    (row, col)
}

fn input_rows(app: &App, width: usize) -> usize {
    let draft_rows = wrapped_rows(app.draft(), width).len();
    let (cursor_row, _) = cursor_position(app.draft(), app.cursor(), width);
    draft_rows.max(cursor_row + 1).clamp(1, MAX_INPUT_ROWS)
}

fn role_label(role: Role, locale: Locale) -> Line<'static> {
    let strings = locale.strings();
    match role {
        Role::User => Line::from(Span::styled(
            strings.you,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Role::Assistant => Line::from(Span::styled(
            strings.assistant,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

/// Unwrapped lines for one message: role label, content, sources, blank line.
fn message_lines(msg: &Message, locale: Locale) -> Vec<Line<'static>> {
    let strings = locale.strings();
    let mut lines = vec![role_label(msg.role, locale)];

    let content = msg.content.replace('\t', "    ");
    for line in content.split('\n') {
        match msg.role {
            Role::User => lines.push(Line::raw(line.to_string())),
            Role::Assistant => lines.push(parse_markdown_line(line)),
        }
    }

    if !msg.sources.is_empty() {
        let labels: Vec<String> = msg.sources.iter().map(|c| c.label(locale)).collect();
        lines.push(Line::from(vec![
            Span::styled(strings.sources_heading, Style::default().fg(Color::DarkGray)),
            Span::styled(
                labels.join(strings.source_separator),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    lines.push(Line::default());
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let input_width = area.width.saturating_sub(2) as usize;
    let input_height = input_rows(app, input_width) as u16 + 2;

    // Main layout: header, transcript, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let strings = app.locale.strings();

    let title = Line::from(vec![
        Span::styled(format!(" {} ", strings.title), Style::default().fg(Color::Cyan).bold()),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let strings = app.locale.strings();

    // Store area for mouse hit-testing
    app.chat_area = Some(area);

    let title = match app.client().endpoint() {
        Ok(url) => Span::styled(format!(" {} ", url), Style::default().fg(Color::DarkGray)),
        Err(_) => Span::styled(
            format!(" {} ", strings.endpoint_unset),
            Style::default().fg(Color::Red),
        ),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);
    let inner = block.inner(area);

    if app.messages().is_empty() && !app.is_sending() {
        app.sync_scroll(0, inner.height);
        frame.render_widget(block, area);

        let [_, welcome_area, _] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .areas(inner);
        let welcome = Paragraph::new(Text::from(vec![
            Line::from(Span::styled(strings.welcome_heading, Style::default().bold())),
            Line::default(),
            Line::from(Span::styled(strings.welcome_hint, Style::default().fg(Color::DarkGray))),
        ]))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(welcome, welcome_area);
        return;
    }

    let mut lines: Vec<Line<'static>> = app
        .messages()
        .iter()
        .flat_map(|msg| message_lines(msg, app.locale))
        .collect();

    if app.is_sending() {
        lines.push(role_label(Role::Assistant, app.locale));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("{}{}", strings.thinking, dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // One column is kept free for the scrollbar
    let wrap_width = inner.width.saturating_sub(1) as usize;
    let lines: Vec<Line<'static>> = lines
        .into_iter()
        .flat_map(|line| wrap_line(line, wrap_width))
        .collect();
    let total_lines = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    app.sync_scroll(total_lines, inner.height);

    let chat = Paragraph::new(lines)
        .block(block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if total_lines > inner.height {
        let mut scrollbar_state = ScrollbarState::new(app.max_scroll() as usize)
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            inner,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let strings = app.locale.strings();

    let border_color = if app.is_sending() { Color::DarkGray } else { Color::Yellow };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", strings.input_title));
    let inner = input_block.inner(area);
    let width = inner.width as usize;

    let (cursor_row, cursor_col) = cursor_position(app.draft(), app.cursor(), width);
    // Keep the cursor row visible when the draft is taller than the box
    let row_offset = cursor_row.saturating_sub((inner.height as usize).saturating_sub(1));

    let input = if app.draft().is_empty() {
        Paragraph::new(Span::styled(
            strings.input_placeholder,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        // Use cyan text to match the user label
        Paragraph::new(wrapped_rows(app.draft(), width))
            .style(Style::default().fg(Color::Cyan))
            .scroll((row_offset as u16, 0))
    };
    frame.render_widget(input.block(input_block), area);

    if inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position((
            inner.x + cursor_col as u16,
            inner.y + (cursor_row - row_offset) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let strings = app.locale.strings();

    let (mode_text, mode_style) = if app.is_sending() {
        (" … ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" RAG ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    // The send control reads as disabled while a request is out or the draft is blank
    let (send_key_style, send_label_style) = if app.can_send() {
        (key_style, label_style)
    } else {
        (disabled_style, disabled_style)
    };

    let hints = vec![
        Span::styled(" Enter ", send_key_style),
        Span::styled(format!(" {} ", strings.send), send_label_style),
        Span::styled(" Shift+Enter ", key_style),
        Span::styled(format!(" {} ", strings.newline), label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(format!(" {} ", strings.scroll), label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(format!(" {} ", strings.quit), label_style),
    ];

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RagClient;
    use crate::message::Citation;
    use ratatui::{backend::TestBackend, Terminal};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_parse_markdown_line() {
        let line = parse_markdown_line("see **Article 5** for details");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "Article 5");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line_text(&line), "see Article 5 for details");
    }

    #[test]
    fn test_parse_markdown_unclosed_bold_is_literal() {
        let line = parse_markdown_line("a **b");
        assert_eq!(line_text(&line), "a **b");
        assert!(line.spans.iter().all(|s| s.style == Style::default()));
    }

    #[test]
    fn test_wrap_line_ascii() {
        let rows = wrap_line(Line::raw("abcdefghij"), 4);
        let texts: Vec<String> = rows.iter().map(line_text).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_line_wide_chars() {
        let rows = wrap_line(Line::raw("ab中文字"), 5);
        let texts: Vec<String> = rows.iter().map(line_text).collect();
        assert_eq!(texts, vec!["ab中", "文字"]);
    }

    #[test]
    fn test_wrap_line_keeps_styles() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let line = Line::from(vec![Span::raw("ab"), Span::styled("cdef", bold)]);
        let rows = wrap_line(line, 3);

        assert_eq!(rows.len(), 2);
        assert_eq!(line_text(&rows[0]), "abc");
        assert_eq!(rows[0].spans[1].style, bold);
        assert_eq!(rows[1].spans[0].content, "def");
        assert_eq!(rows[1].spans[0].style, bold);
    }

    #[test]
    fn test_wrap_empty_line_is_one_row() {
        assert_eq!(wrap_line(Line::default(), 10).len(), 1);
    }

    #[test]
    fn test_cursor_position() {
        assert_eq!(cursor_position("", 0, 10), (0, 0));
        assert_eq!(cursor_position("hello", 5, 10), (0, 5));
        assert_eq!(cursor_position("one\ntwo", 5, 10), (1, 1));
        // Filling a row exactly puts the cursor at the start of the next one
        assert_eq!(cursor_position("abcd", 4, 4), (1, 0));
        assert_eq!(cursor_position("你好", 2, 10), (0, 4));
    }

    #[test]
    fn test_message_lines_with_sources() {
        let msg = Message::assistant(
            "first\n**second**",
            vec![
                Citation::Label("doc-1".to_string()),
                Citation::Label("doc-2".to_string()),
            ],
        );
        let texts: Vec<String> = message_lines(&msg, Locale::En).iter().map(line_text).collect();
        assert_eq!(
            texts,
            vec!["Assistant:", "first", "second", "Sources: doc-1, doc-2", ""]
        );
    }

    #[test]
    fn test_message_lines_without_sources() {
        let msg = Message::user("just a question");
        let texts: Vec<String> = message_lines(&msg, Locale::En).iter().map(line_text).collect();
        assert_eq!(texts, vec!["You:", "just a question", ""]);
    }

    #[test]
    fn test_render_welcome_screen() {
        let mut app = App::new(RagClient::new(Some("http://localhost:8000")), Locale::En);
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("Welcome to RAG Q&A"));
        assert!(screen.contains("http://localhost:8000/chat"));
        assert!(screen.contains("Type your question..."));
    }

    #[test]
    fn test_render_transcript() {
        let mut app = App::new(RagClient::new(None), Locale::En);
        app.update_draft("where is the config?");
        app.submit();

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("API URL not set"));
        assert!(screen.contains("You:"));
        assert!(screen.contains("where is the config?"));
        assert!(screen.contains("Assistant:"));
        assert!(screen.contains("Error: API URL is not set"));
        assert!(!screen.contains("Welcome to RAG Q&A"));
    }

    #[test]
    fn test_render_follows_latest_message() {
        let mut app = App::new(RagClient::new(None), Locale::En);
        for i in 0..10 {
            app.update_draft(format!("question number {}", i));
            app.submit();
        }

        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        assert!(app.chat_scroll > 0);
        assert_eq!(app.chat_scroll, app.max_scroll());
        let screen = screen_text(&terminal);
        assert!(screen.contains("question number 9"));
        assert!(!screen.contains("question number 0"));
    }

    #[test]
    fn test_input_grows_with_draft() {
        let app_with = |draft: &str| {
            let mut app = App::new(RagClient::new(None), Locale::En);
            app.update_draft(draft);
            app
        };
        assert_eq!(input_rows(&app_with(""), 20), 1);
        assert_eq!(input_rows(&app_with("a\nb\nc"), 20), 3);
        assert_eq!(input_rows(&app_with("1\n2\n3\n4\n5\n6\n7"), 20), MAX_INPUT_ROWS);
    }
}
