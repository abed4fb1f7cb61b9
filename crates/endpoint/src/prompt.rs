//! Sakura prompt format and request batching.

use serde::{Deserialize, Serialize};

/// Model name sent in every request. OpenAI-compatible servers hosting a
/// single model ignore it.
pub const MODEL_NAME: &str = "sakura";

pub const SYSTEM_PROMPT: &str = "你是一个轻小说翻译模型，可以流畅通顺地以日本轻小说的风格将日文翻译成简体中文，\
并联系上下文正确使用人称代词，不擅自添加原文中没有的代词。";

const USER_PROMPT_PREFIX: &str = "将下面的日文文本翻译成中文：";

/// Maximum number of lines sent in one request.
pub const MAX_BATCH_LINES: usize = 30;

/// Maximum number of characters sent in one request. A single longer line
/// still goes out alone.
pub const MAX_BATCH_CHARS: usize = 1500;

const MIN_MAX_TOKENS: usize = 256;
const MAX_MAX_TOKENS: usize = 4096;

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: &'static str,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: usize,
    pub frequency_penalty: f32,
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Build a chat completion request translating `lines` as one block.
pub fn chat_request(lines: &[String]) -> ChatRequest {
    let text = lines.join("\n");
    let chars = text.chars().count();
    ChatRequest {
        model: MODEL_NAME,
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: format!("{USER_PROMPT_PREFIX}{text}"),
            },
        ],
        temperature: 0.1,
        top_p: 0.3,
        max_tokens: (chars * 2).clamp(MIN_MAX_TOKENS, MAX_MAX_TOKENS),
        frequency_penalty: 0.0,
        stream: false,
    }
}

/// Split `lines` into consecutive batches bounded by [`MAX_BATCH_LINES`]
/// and [`MAX_BATCH_CHARS`].
pub fn batches(lines: &[String]) -> Vec<&[String]> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = 0;

    for (i, line) in lines.iter().enumerate() {
        let len = line.chars().count();
        let count = i - start;
        if count > 0 && (count >= MAX_BATCH_LINES || chars + len > MAX_BATCH_CHARS) {
            out.push(&lines[start..i]);
            start = i;
            chars = 0;
        }
        chars += len;
    }
    if start < lines.len() {
        out.push(&lines[start..]);
    }
    out
}

/// Split a model reply back into lines, dropping one trailing newline.
pub fn split_reply(content: &str) -> Vec<String> {
    content
        .trim_end_matches('\n')
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}
