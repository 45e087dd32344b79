//! Fast-path replies for commands and bare greetings.
//!
//! These answers are fixed text, so they skip retrieval and the
//! language model entirely. Matching is on the normalized message:
//! trimmed, lowercased, and with a `@botname` command suffix removed.

const START_REPLY: &str = "Hello! I'm Heron. Ask me anything and I'll do my best to help. \
Send /help to see what I can do.";

const HELP_REPLY: &str = "Just send me a message and I'll answer. I remember useful facts \
you tell me and use them in later conversations.\n\n\
/start - introduction\n\
/help - this message\n\
/privacy - how your data is handled\n\
/reset - start a fresh conversation";

const PRIVACY_REPLY: &str = "I keep a log of our messages and a small set of facts you share, \
so I can give better answers later. Nothing is shared with third parties beyond the \
language-model provider that generates replies. Send /reset to start fresh.";

const RESET_REPLY: &str = "Okay, fresh start. What would you like to talk about?";

const GREETING_REPLY: &str = "Hi there! What can I help you with?";

/// Return the canned reply for `text`, if it matches a fast-path
/// command or greeting.
pub fn fast_reply(text: &str) -> Option<&'static str> {
    let normalized = normalize(text);
    match normalized.as_str() {
        "/start" => Some(START_REPLY),
        "/help" => Some(HELP_REPLY),
        "/privacy" => Some(PRIVACY_REPLY),
        "/reset" => Some(RESET_REPLY),
        "hi" | "hello" | "hey" => Some(GREETING_REPLY),
        _ => None,
    }
}

/// Lowercase, trim, and strip the `@botname` suffix group chats append
/// to commands.
fn normalize(text: &str) -> String {
    let trimmed = text.trim().to_lowercase();
    if trimmed.starts_with('/') {
        match trimmed.split_once('@') {
            Some((command, _)) => command.to_string(),
            None => trimmed,
        }
    } else {
        trimmed
    }
}
