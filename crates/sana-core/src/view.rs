//! View state and presentation seam.
//!
//! [`ViewState`] is the controller-owned replacement for ambient view
//! globals: the active chat id, the cached user, and the chat list. The
//! [`ChatView`] trait is the rendering collaborator; the shipped client
//! implements it against the terminal, tests against a recording fake.

use crate::chat::{ChatId, ChatSummary, DisplayMessage};
use crate::user::UserRecord;

/// Ephemeral view state, exclusively owned by the controller.
///
/// Mutated only by controller operations; reset to empty on logout.
#[derive(Debug, Default)]
pub struct ViewState {
    /// The active chat, or `None` in draft state (no chat created yet).
    pub current_chat_id: Option<ChatId>,
    /// The signed-in user.
    pub current_user: Option<UserRecord>,
    /// Cached chat list, insertion order as returned by the API.
    pub chat_history: Vec<ChatSummary>,
    /// Sequence counter for chat loads. Each `load_chat` call takes the next
    /// value; responses carrying an older value are stale and discarded, so
    /// the latest user intent always wins.
    load_seq: u64,
}

impl ViewState {
    /// Issues the next load sequence token.
    pub fn next_load_seq(&mut self) -> u64 {
        self.load_seq += 1;
        self.load_seq
    }

    /// True when `seq` is the most recently issued load token.
    pub fn is_latest_load(&self, seq: u64) -> bool {
        self.load_seq == seq
    }

    /// Resets everything to the signed-out state.
    pub fn reset(&mut self) {
        self.current_chat_id = None;
        self.current_user = None;
        self.chat_history.clear();
    }
}

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Success,
    Error,
}

/// The rendering collaborator driven by the controller.
///
/// Implementations must tolerate being called in any order; the controller
/// guarantees only that `set_send_enabled(true)` follows every
/// `set_send_enabled(false)` regardless of outcome.
pub trait ChatView: Send + Sync {
    /// Replaces the rendered message list.
    fn show_messages(&self, messages: &[DisplayMessage]);

    /// Appends a single message to the rendered list.
    fn append_message(&self, message: &DisplayMessage);

    /// Re-renders the chat list, marking the active item.
    fn show_chat_list(&self, chats: &[ChatSummary], active: Option<ChatId>);

    /// Updates the displayed chat title.
    fn set_chat_title(&self, title: &str);

    /// Renders the signed-in user's identity.
    fn set_user_identity(&self, name: &str, initials: &str);

    /// Enables or disables the send affordance.
    fn set_send_enabled(&self, enabled: bool);

    /// Shows or hides the typing indicator.
    fn set_typing(&self, typing: bool);

    /// Surfaces a transient notification.
    fn notify(&self, level: Notice, message: &str);

    /// Scrolls the message list to the bottom.
    fn scroll_to_bottom(&self);
}
