//! Incremental terminal rendering of the assistant reply.

use solace_types::{Role, SessionState};

/// Turns successive state snapshots into the text to append to the terminal.
///
/// One printer renders one turn.
///
/// Only the trailing assistant entry is rendered, and nothing is rendered
/// while the state carries an error: failures are reported separately.
#[derive(Debug, Default)]
pub struct ReplyPrinter {
    printed: String,
}

impl ReplyPrinter {
    /// Text to print for `state`, if anything new appeared.
    ///
    /// When the committed reply differs from what was streamed so far, the
    /// full reply is printed on a fresh line.
    pub fn observe(&mut self, state: &SessionState) -> Option<String> {
        if state.error.is_some() {
            return None;
        }
        let reply = state
            .messages
            .last()
            .filter(|m| m.role == Role::Assistant)?;
        if reply.content == self.printed {
            return None;
        }

        let chunk = match reply.content.strip_prefix(self.printed.as_str()) {
            Some(suffix) => suffix.to_string(),
            None => format!("\n{}", reply.content),
        };
        self.printed = reply.content.clone();
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solace_types::{MessageId, TranscriptMessage};

    fn state_with_reply(content: &str) -> SessionState {
        let mut reply =
            TranscriptMessage::assistant_placeholder(MessageId::new("a"), Default::default());
        reply.content = content.to_string();
        SessionState {
            messages: vec![
                TranscriptMessage::user(MessageId::new("u"), "hi", Default::default()),
                reply,
            ],
            ..SessionState::default()
        }
    }

    #[test]
    fn prints_only_new_text() {
        let mut printer = ReplyPrinter::default();
        assert_eq!(printer.observe(&state_with_reply("")), None);
        assert_eq!(printer.observe(&state_with_reply("Hel")).as_deref(), Some("Hel"));
        assert_eq!(printer.observe(&state_with_reply("Hello")).as_deref(), Some("lo"));
        assert_eq!(printer.observe(&state_with_reply("Hello")), None);
    }

    #[test]
    fn rewritten_reply_is_printed_in_full() {
        let mut printer = ReplyPrinter::default();
        printer.observe(&state_with_reply("Hel"));
        assert_eq!(
            printer.observe(&state_with_reply("Howdy")).as_deref(),
            Some("\nHowdy")
        );
    }

    #[test]
    fn errors_are_not_rendered() {
        let mut printer = ReplyPrinter::default();
        let mut state = state_with_reply("server error: boom");
        state.error = Some("server error: boom".into());
        assert_eq!(printer.observe(&state), None);
    }

    #[test]
    fn user_message_alone_prints_nothing() {
        let mut printer = ReplyPrinter::default();
        let mut state = state_with_reply("");
        state.messages.pop();
        assert_eq!(printer.observe(&state), None);
    }
}
