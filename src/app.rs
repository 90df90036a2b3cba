use tokio::task::JoinHandle;

use crate::client::{ChatReply, RagClient};
use crate::error::ChatError;
use crate::locale::Locale;
use crate::message::Message;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

type ReplyTask = JoinHandle<Result<ChatReply, ChatError>>;

/// Session state for the chat view. Owned by the event loop and passed by
/// `&mut` into the handler and the renderer.
pub struct App {
    pub should_quit: bool,
    pub locale: Locale,

    // Transcript (append-only)
    messages: Vec<Message>,

    // Draft input
    draft: String,
    cursor: usize, // cursor position in draft, in chars

    // The one outstanding backend call, if any
    pending: Option<ReplyTask>,
    client: RagClient,

    // Chat scroll state, sizes are refreshed on every render
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_total_lines: u16,
    pub follow_latest: bool,
    pub chat_area: Option<ratatui::layout::Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(client: RagClient, locale: Locale) -> Self {
        Self {
            should_quit: false,
            locale,
            messages: Vec::new(),
            draft: String::new(),
            cursor: 0,
            pending: None,
            client,
            chat_scroll: 0,
            chat_height: 0,
            chat_total_lines: 0,
            follow_latest: true,
            chat_area: None,
            animation_frame: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn client(&self) -> &RagClient {
        &self.client
    }

    pub fn is_sending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the send control is enabled.
    pub fn can_send(&self) -> bool {
        !self.is_sending() && !self.draft.trim().is_empty()
    }

    fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.follow_latest = true;
    }

    // Submitting

    /// Sends the trimmed draft to the backend. A no-op while a request is in
    /// flight or when the draft is blank.
    pub fn submit(&mut self) {
        if !self.can_send() {
            return;
        }

        let question = self.draft.trim().to_string();
        self.draft.clear();
        self.cursor = 0;
        self.push_message(Message::user(question.clone()));

        if let Err(e) = self.client.endpoint() {
            self.finish_request(Err(e));
            return;
        }

        log::info!("sending question ({} chars)", question.chars().count());
        let client = self.client.clone();
        self.pending = Some(tokio::spawn(async move { client.chat(&question).await }));
    }

    /// Waits for the outstanding request and appends its reply. Returns at once
    /// when nothing is in flight. Cancel safe: dropping the future before the
    /// request finishes leaves it pending.
    pub async fn await_reply(&mut self) {
        let Some(task) = self.pending.as_mut() else {
            return;
        };

        let result = task.await.unwrap_or_else(|e| Err(ChatError::from(e)));
        self.pending = None;
        self.finish_request(result);
    }

    fn finish_request(&mut self, result: Result<ChatReply, ChatError>) {
        let message = match result {
            Ok(reply) => {
                let content = reply
                    .answer()
                    .unwrap_or(self.locale.strings().no_answer)
                    .to_string();
                log::info!("answer received ({} chars)", content.chars().count());
                Message::assistant(content, reply.into_sources())
            }
            Err(e) => {
                log::error!("chat request failed: {}", e);
                Message::assistant(e.user_message(self.locale), Vec::new())
            }
        };
        self.push_message(message);
    }

    // Draft editing

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.cursor = self.draft.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert_str(byte_pos, &text);
        self.cursor += text.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.draft.chars().count();
    }

    // Chat scrolling

    pub fn max_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_latest = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_latest = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    /// Records the rendered size of the transcript and pins the view to the
    /// newest entry unless the user has scrolled away from it.
    pub fn sync_scroll(&mut self, total_lines: u16, visible_height: u16) {
        self.chat_total_lines = total_lines;
        self.chat_height = visible_height;
        if self.follow_latest {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use mockito::Matcher;

    fn offline_app() -> App {
        App::new(RagClient::new(None), Locale::En)
    }

    async fn app_with_reply(status: usize, body: &str) -> (App, mockito::ServerGuard) {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;
        let app = App::new(RagClient::new(Some(&server.url())), Locale::En);
        (app, server)
    }

    fn labels(message: &Message) -> Vec<String> {
        message.sources.iter().map(|c| c.label(Locale::En)).collect()
    }

    #[test]
    fn test_blank_draft_is_noop() {
        let mut app = offline_app();
        for draft in ["", "   ", "\n\t \n"] {
            app.update_draft(draft);
            assert!(!app.can_send());
            app.submit();
            assert!(app.messages().is_empty());
            assert!(!app.is_sending());
            assert_eq!(app.draft(), draft);
        }
    }

    #[test]
    fn test_missing_endpoint_reports_config_error() {
        let mut app = offline_app();
        app.update_draft("  hello  ");
        app.submit();

        let messages = app.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::user("hello"));
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, Locale::En.strings().missing_endpoint);
        assert!(messages[1].sources.is_empty());
        assert!(!app.is_sending());
        assert_eq!(app.draft(), "");
        assert_eq!(app.cursor(), 0);
    }

    #[tokio::test]
    async fn test_submit_appends_answer_and_sources() {
        let (mut app, _server) =
            app_with_reply(200, r#"{"answer": "42", "sources": ["doc-1", "doc-2"]}"#).await;

        app.update_draft(" what is the answer? ");
        app.submit();
        assert!(app.is_sending());
        assert!(!app.can_send());
        assert_eq!(app.messages().len(), 1);
        assert_eq!(app.messages()[0].content, "what is the answer?");

        app.await_reply().await;

        assert!(!app.is_sending());
        let messages = app.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "42");
        assert_eq!(labels(&messages[1]), vec!["doc-1", "doc-2"]);
    }

    #[tokio::test]
    async fn test_submit_while_sending_is_noop() {
        let (mut app, _server) = app_with_reply(200, r#"{"answer": "first"}"#).await;

        app.update_draft("first");
        app.submit();
        app.update_draft("second");
        assert!(!app.can_send());
        app.submit();

        assert_eq!(app.messages().len(), 1);
        assert_eq!(app.draft(), "second");

        app.await_reply().await;
        assert_eq!(app.messages().len(), 2);
        assert_eq!(app.messages()[1].content, "first");
        assert!(app.can_send());
    }

    #[tokio::test]
    async fn test_missing_answer_uses_placeholder() {
        let (mut app, _server) = app_with_reply(200, r#"{"sources": []}"#).await;

        app.update_draft("anything");
        app.submit();
        app.await_reply().await;

        let reply = &app.messages()[1];
        assert_eq!(reply.content, Locale::En.strings().no_answer);
        assert!(!reply.content.is_empty());
        assert!(reply.sources.is_empty());
    }

    #[tokio::test]
    async fn test_structured_sources() {
        let (mut app, _server) = app_with_reply(
            200,
            r#"{"answer": "see refs", "sources": [
                {"metadata": {"no": 3}, "content": "ignored"},
                {"content": "a rather long excerpt of the source"},
                {}
            ]}"#,
        )
        .await;

        app.update_draft("refs?");
        app.submit();
        app.await_reply().await;

        assert_eq!(
            labels(&app.messages()[1]),
            vec!["3", "a rather long excerp", "unknown source"]
        );
    }

    #[tokio::test]
    async fn test_error_status_then_retry_by_hand() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/chat")
            .match_body(Matcher::Json(serde_json::json!({"message": "first try"})))
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let succeeding = server
            .mock("POST", "/chat")
            .match_body(Matcher::Json(serde_json::json!({"message": "second try"})))
            .with_status(200)
            .with_body(r#"{"answer": "ok"}"#)
            .expect(1)
            .create_async()
            .await;
        let mut app = App::new(RagClient::new(Some(&server.url())), Locale::En);

        app.update_draft("first try");
        app.submit();
        app.await_reply().await;

        assert_eq!(app.messages().len(), 2);
        assert_eq!(app.messages()[1].content, Locale::En.strings().request_failed);
        assert!(!app.is_sending());

        app.update_draft("second try");
        app.submit();
        app.await_reply().await;

        failing.assert_async().await;
        succeeding.assert_async().await;

        let contents: Vec<&str> = app.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "first try",
                Locale::En.strings().request_failed,
                "second try",
                "ok"
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_failure() {
        let (mut app, _server) = app_with_reply(200, "{\"answer\": ").await;

        app.update_draft("q");
        app.submit();
        app.await_reply().await;

        assert_eq!(app.messages()[1].content, Locale::En.strings().request_failed);
    }

    #[tokio::test]
    async fn test_await_reply_without_request() {
        let mut app = offline_app();
        app.await_reply().await;
        assert!(app.messages().is_empty());
    }

    #[test]
    fn test_draft_editing_is_char_based() {
        let mut app = offline_app();
        app.update_draft("你好");
        assert_eq!(app.cursor(), 2);

        app.cursor_left();
        app.insert_char('們');
        assert_eq!(app.draft(), "你們好");

        app.cursor_home();
        app.delete();
        assert_eq!(app.draft(), "們好");

        app.cursor_end();
        app.backspace();
        assert_eq!(app.draft(), "們");

        app.cursor_right();
        assert_eq!(app.cursor(), 1);
        app.insert_str("a\r\nb");
        assert_eq!(app.draft(), "們a\nb");
        assert_eq!(app.cursor(), 4);
    }

    #[test]
    fn test_scroll_follows_latest_until_user_scrolls() {
        let mut app = offline_app();
        app.sync_scroll(50, 10);
        assert_eq!(app.chat_scroll, 40);

        app.scroll_up(5);
        assert!(!app.follow_latest);
        app.sync_scroll(60, 10);
        assert_eq!(app.chat_scroll, 35);

        app.scroll_down(100);
        assert!(app.follow_latest);
        assert_eq!(app.chat_scroll, 50);

        app.scroll_up(5);
        app.update_draft("x");
        app.submit();
        assert!(app.follow_latest);
    }

    #[test]
    fn test_tick_only_animates_while_sending() {
        let mut app = offline_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }
}
