//! Prompt assembly — persona, optional memory block, then the user
//! message.
//!
//! Assembly is deterministic: identical inputs always produce the same
//! prompt. The memory block has a fixed character budget; items that
//! would overflow it are dropped whole, never truncated mid-item,
//! starting from the lowest-ranked tail.

use heron_core::memory::MemoryItem;
use heron_core::prompt::{Prompt, PromptMessage};

const MEMORY_HEADER: &str = "Relevant things you remember about this user:";
const MEMORY_FOOTER: &str = "Use these memories only when they are relevant to the question.";

/// Builds the ordered prompt for one inbound message.
pub struct PromptAssembler {
    persona: String,
    context_max_chars: usize,
}

impl PromptAssembler {
    pub fn new(persona: impl Into<String>, context_max_chars: usize) -> Self {
        Self {
            persona: persona.into(),
            context_max_chars,
        }
    }

    /// Assemble `[persona, memory?, user]`. The memory message is
    /// omitted entirely when no item fits the budget.
    pub fn assemble(&self, memories: &[MemoryItem], user_text: &str) -> Prompt {
        let mut prompt = vec![PromptMessage::system(self.persona.clone())];
        if let Some(block) = self.memory_block(memories) {
            prompt.push(PromptMessage::system(block));
        }
        prompt.push(PromptMessage::user(user_text));
        prompt
    }

    /// Render the numbered memory block, respecting the character
    /// budget. The budget covers the whole rendered block, header and
    /// footer included; items arrive ranked best-first and the tail is
    /// dropped.
    fn memory_block(&self, memories: &[MemoryItem]) -> Option<String> {
        if memories.is_empty() {
            return None;
        }

        let overhead = MEMORY_HEADER.len() + 1 + MEMORY_FOOTER.len();
        let budget = self.context_max_chars.saturating_sub(overhead);

        let mut entries = String::new();
        let mut kept = 0usize;
        for item in memories {
            let line = format!("[{}] {}\n", kept + 1, item.content.trim());
            if entries.len() + line.len() > budget {
                break;
            }
            entries.push_str(&line);
            kept += 1;
        }
        if kept == 0 {
            return None;
        }
        Some(format!("{MEMORY_HEADER}\n{entries}{MEMORY_FOOTER}"))
    }
}
