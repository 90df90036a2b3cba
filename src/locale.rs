//! User-facing strings.
//!
//! Traditional Chinese is the default; English is selectable through
//! `RAG_CHAT_LANG=en` or the `locale` key of the config file.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    ZhTw,
    En,
}

/// Every piece of text the UI shows to the user.
#[derive(Debug)]
pub struct Strings {
    pub title: &'static str,
    pub welcome_heading: &'static str,
    pub welcome_hint: &'static str,
    pub input_placeholder: &'static str,
    pub input_title: &'static str,
    pub endpoint_unset: &'static str,
    pub you: &'static str,
    pub assistant: &'static str,
    pub thinking: &'static str,
    pub sources_heading: &'static str,
    pub source_separator: &'static str,
    pub unknown_source: &'static str,
    pub no_answer: &'static str,
    pub missing_endpoint: &'static str,
    pub request_failed: &'static str,
    pub send: &'static str,
    pub newline: &'static str,
    pub scroll: &'static str,
    pub quit: &'static str,
}

const ZH_TW: Strings = Strings {
    title: "RAG 問答系統",
    welcome_heading: "歡迎使用 RAG 問答系統",
    welcome_hint: "請輸入您的問題，我會為您搜尋相關資訊並回答。",
    input_placeholder: "輸入您的問題...",
    input_title: "提問",
    endpoint_unset: "未設定 API URL",
    you: "您：",
    assistant: "助理：",
    thinking: "思考中",
    sources_heading: "參考來源：",
    source_separator: "、",
    unknown_source: "未知來源",
    no_answer: "無法取得回應",
    missing_endpoint: "錯誤：API URL 未設定，請在 .env.local 中設定 RAG_API_URL",
    request_failed: "抱歉，發生錯誤。請確認後端 API 是否正常運行。",
    send: "傳送",
    newline: "換行",
    scroll: "捲動",
    quit: "離開",
};

const EN: Strings = Strings {
    title: "RAG Q&A",
    welcome_heading: "Welcome to RAG Q&A",
    welcome_hint: "Type a question and I will search the knowledge base to answer it.",
    input_placeholder: "Type your question...",
    input_title: "Ask",
    endpoint_unset: "API URL not set",
    you: "You:",
    assistant: "Assistant:",
    thinking: "Thinking",
    sources_heading: "Sources: ",
    source_separator: ", ",
    unknown_source: "unknown source",
    no_answer: "No answer was returned",
    missing_endpoint: "Error: API URL is not set. Set RAG_API_URL in .env.local",
    request_failed: "Sorry, something went wrong. Please check that the backend API is running.",
    send: "send",
    newline: "newline",
    scroll: "scroll",
    quit: "quit",
};

impl Locale {
    pub fn strings(&self) -> &'static Strings {
        match self {
            Locale::ZhTw => &ZH_TW,
            Locale::En => &EN,
        }
    }

    /// Accepts tags like `zh-TW`, `zh_tw`, `en`, `en-US`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase().replace('_', "-");
        if tag == "zh" || tag.starts_with("zh-") {
            Some(Locale::ZhTw)
        } else if tag == "en" || tag.starts_with("en-") {
            Some(Locale::En)
        } else {
            None
        }
    }
}
