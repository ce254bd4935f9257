//! Session & chat view controller.
//!
//! `ChatController` mediates between the stored session, the remote
//! chat/prediction API, and the rendered view. It owns all ephemeral view
//! state; rendering goes through the [`ChatView`] seam so the controller can
//! be exercised without a terminal.

use sana_core::api::HealthApi;
use sana_core::chat::{
    chat_title_from, ChatId, DisplayMessage, MessageRole, NewMessage, GREETING,
};
use sana_core::error::{Result, SanaError};
use sana_core::session::{Session, SessionStore, SessionValidity};
use sana_core::user::{validate_password_change, ChatStats, ProfileUpdate, UserRecord};
use sana_core::view::{ChatView, Notice, ViewState};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of inspecting the stored session at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Session valid; identity rendered and history loaded.
    Ready,
    /// No usable session; the caller must run the sign-in flow. A corrupt
    /// session (token without user) has already been cleared at this point.
    SignedOut,
}

/// The stage of the send pipeline that was executing when a failure occurred.
///
/// Stages run in declaration order. A failure leaves every earlier stage
/// applied: e.g. a `PersistAssistant` failure means the chat exists
/// server-side and the user message was persisted, but the assistant reply
/// was not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStage {
    /// Creating the chat for a draft conversation.
    CreateChat,
    /// Submitting the symptom text for prediction.
    Predict,
    /// Persisting the user's message.
    PersistUser,
    /// Persisting the serialized prediction as the assistant's message.
    PersistAssistant,
}

/// Result of a `send_message` call.
#[derive(Debug)]
pub enum SendOutcome {
    /// Input was blank; nothing was rendered and no request was made.
    Ignored,
    /// All stages completed.
    Completed { chat_id: ChatId },
    /// A stage failed; earlier stages remain applied (fail-forward, no
    /// compensation). The optimistic user message stays rendered.
    PartiallyApplied { stage: SendStage, error: SanaError },
}

/// Profile data assembled for display: the record plus usage counters.
///
/// Counters are a secondary read and may be absent when their fetch fails.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub user: UserRecord,
    pub stats: Option<ChatStats>,
}

/// Mediates between the persisted session, the remote API, and the view.
pub struct ChatController {
    api: Arc<dyn HealthApi>,
    store: Arc<dyn SessionStore>,
    view: Arc<dyn ChatView>,
    state: RwLock<ViewState>,
}

impl ChatController {
    /// Creates a controller over the given collaborators.
    pub fn new(
        api: Arc<dyn HealthApi>,
        store: Arc<dyn SessionStore>,
        view: Arc<dyn ChatView>,
    ) -> Self {
        Self {
            api,
            store,
            view,
            state: RwLock::new(ViewState::default()),
        }
    }

    /// Reads the stored session and brings the view up, failing closed.
    ///
    /// - no token: [`Startup::SignedOut`], no further work
    /// - token without a usable user record: session cleared, `SignedOut`
    /// - otherwise: identity rendered, chat history fetched (soft-fail),
    ///   greeting shown for the draft chat
    pub async fn initialize(&self) -> Result<Startup> {
        let session = match self.store.load() {
            Ok(session) => session,
            Err(e) => {
                // Unreadable session file: treat like a token without a user.
                tracing::warn!("stored session unreadable, clearing: {}", e);
                self.store.clear()?;
                return Ok(Startup::SignedOut);
            }
        };

        match session.validity() {
            SessionValidity::SignedOut => Ok(Startup::SignedOut),
            SessionValidity::Corrupt => {
                tracing::warn!("stored session has token but no user record, clearing");
                self.store.clear()?;
                Ok(Startup::SignedOut)
            }
            SessionValidity::SignedIn(user) => {
                self.enter_signed_in(user).await;
                Ok(Startup::Ready)
            }
        }
    }

    /// Exchanges credentials for a session, persists it, and brings the view
    /// up. Failures are surfaced as a notification and returned.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let signed_in = match self.api.sign_in(email, password).await {
            Ok(signed_in) => signed_in,
            Err(e) => {
                self.view.notify(Notice::Error, &e.user_message());
                return Err(e);
            }
        };

        self.store
            .save(&Session::signed_in(signed_in.token, signed_in.user.clone()))?;
        self.enter_signed_in(signed_in.user).await;
        self.view.notify(Notice::Success, "Signed in");
        Ok(())
    }

    async fn enter_signed_in(&self, user: UserRecord) {
        self.view
            .set_user_identity(&user.full_name, &user.initials());
        self.state.write().await.current_user = Some(user);
        self.load_chat_history().await;
        self.start_new_chat().await;
    }

    /// Resets to the draft state: no active chat, canned greeting, default
    /// title. No network call.
    pub async fn start_new_chat(&self) {
        self.state.write().await.current_chat_id = None;
        self.view.show_messages(&[DisplayMessage::assistant(GREETING)]);
        self.view.set_chat_title("New chat");
    }

    /// Fetches the chat list and re-renders it.
    ///
    /// Soft-fail: history is secondary to the active chat, so a failure is
    /// logged and the prior list is left in place.
    pub async fn load_chat_history(&self) {
        match self.api.list_chats().await {
            Ok(chats) => {
                let mut state = self.state.write().await;
                state.chat_history = chats;
                self.view
                    .show_chat_list(&state.chat_history, state.current_chat_id);
            }
            Err(e) => {
                tracing::warn!("failed to load chat history: {}", e);
            }
        }
    }

    /// Loads a chat and renders its messages.
    ///
    /// Each call takes a fresh sequence token; a response that is no longer
    /// the latest is discarded so the most recent selection always wins. When
    /// the latest load fails, the active chat id rolls back to its previous
    /// value and a notification is surfaced.
    pub async fn load_chat(&self, id: ChatId) -> Result<()> {
        let (seq, previous) = {
            let mut state = self.state.write().await;
            let previous = state.current_chat_id;
            state.current_chat_id = Some(id);
            (state.next_load_seq(), previous)
        };

        match self.api.get_chat(id).await {
            Ok(detail) => {
                let state = self.state.read().await;
                if !state.is_latest_load(seq) {
                    tracing::debug!(chat_id = id, "discarding stale chat load");
                    return Ok(());
                }

                let messages: Vec<DisplayMessage> = if detail.messages.is_empty() {
                    vec![DisplayMessage::assistant(GREETING)]
                } else {
                    detail.messages.iter().map(DisplayMessage::from_stored).collect()
                };
                self.view.show_messages(&messages);
                self.view.set_chat_title(detail.chat.display_title());
                self.view
                    .show_chat_list(&state.chat_history, state.current_chat_id);
                self.view.scroll_to_bottom();
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                if state.is_latest_load(seq) {
                    state.current_chat_id = previous;
                    self.view.notify(Notice::Error, "Failed to load chat");
                    tracing::warn!(chat_id = id, "failed to load chat: {}", e);
                }
                Err(e)
            }
        }
    }

    /// Sends a symptom description through the prediction pipeline.
    ///
    /// Blank input is ignored outright. Otherwise the send affordance is
    /// disabled, the user message rendered optimistically, and the staged
    /// pipeline runs; see [`SendStage`] for what a partial failure leaves
    /// behind. The affordance is re-enabled on every exit path and the
    /// optimistic message is never rolled back.
    pub async fn send_message(&self, input: &str) -> SendOutcome {
        let message = input.trim();
        if message.is_empty() {
            return SendOutcome::Ignored;
        }

        self.view.set_send_enabled(false);
        self.view.append_message(&DisplayMessage::user(message));
        self.view.set_typing(true);
        self.view.scroll_to_bottom();

        let result = self.run_send_pipeline(message).await;
        self.view.set_typing(false);

        let outcome = match result {
            Ok(chat_id) => {
                self.view.scroll_to_bottom();
                SendOutcome::Completed { chat_id }
            }
            Err((stage, error)) => {
                self.view.append_message(&DisplayMessage::assistant(format!(
                    "I apologize, but I encountered an error: {}. Please try again.",
                    error.user_message()
                )));
                self.view.notify(Notice::Error, &error.user_message());
                tracing::warn!(?stage, "send pipeline failed: {}", error);
                SendOutcome::PartiallyApplied { stage, error }
            }
        };

        self.view.set_send_enabled(true);
        outcome
    }

    async fn run_send_pipeline(&self, message: &str) -> std::result::Result<ChatId, (SendStage, SanaError)> {
        // Stage: CreateChat (draft chats only). The chat id is adopted before
        // anything else so a later failure leaves a retryable chat behind.
        let current = self.state.read().await.current_chat_id;
        let chat_id = match current {
            Some(id) => id,
            None => {
                let chat = self
                    .api
                    .create_chat(&chat_title_from(message))
                    .await
                    .map_err(|e| (SendStage::CreateChat, e))?;
                self.state.write().await.current_chat_id = Some(chat.id);
                self.view.set_chat_title(chat.display_title());
                self.load_chat_history().await;
                chat.id
            }
        };

        // Stage: Predict.
        let mut prediction = self
            .api
            .predict(message)
            .await
            .map_err(|e| (SendStage::Predict, e))?;

        // The predict endpoint carries no precautions; look them up for the
        // predicted label. Secondary read, soft-fail.
        if prediction.precautions.is_none() {
            match self.api.disease_details(&prediction.predicted_disease).await {
                Ok(details) => prediction.precautions = Some(details.precautions),
                Err(e) => {
                    tracing::warn!(
                        disease = %prediction.predicted_disease,
                        "disease details lookup failed: {}",
                        e
                    );
                }
            }
        }

        self.view
            .append_message(&DisplayMessage::Prediction(prediction.clone()));

        // Stage: PersistUser. Persistence happens only after prediction
        // succeeded; a failure from here on leaves the exchange visible in
        // the rendered state but absent from server-side history.
        self.api
            .append_message(chat_id, &NewMessage::new(MessageRole::User, message))
            .await
            .map_err(|e| (SendStage::PersistUser, e))?;

        // Stage: PersistAssistant, with the prediction serialized to a string.
        let serialized = serde_json::to_string(&prediction)
            .map_err(|e| (SendStage::PersistAssistant, e.into()))?;
        self.api
            .append_message(chat_id, &NewMessage::new(MessageRole::Assistant, serialized))
            .await
            .map_err(|e| (SendStage::PersistAssistant, e))?;

        Ok(chat_id)
    }

    /// Deletes a chat server-side and drops it from the rendered history.
    ///
    /// Deleting the active chat falls back to the draft state.
    pub async fn delete_chat(&self, id: ChatId) -> Result<()> {
        if let Err(e) = self.api.delete_chat(id).await {
            self.view.notify(Notice::Error, &e.user_message());
            return Err(e);
        }

        let was_active = {
            let mut state = self.state.write().await;
            state.chat_history.retain(|chat| chat.id != id);
            let was_active = state.current_chat_id == Some(id);
            self.view
                .show_chat_list(&state.chat_history, state.current_chat_id);
            was_active
        };
        if was_active {
            self.start_new_chat().await;
        }
        self.view.notify(Notice::Success, "Chat deleted");
        Ok(())
    }

    /// Fetches the profile for display, with usage counters as a soft-fail
    /// secondary read.
    pub async fn show_profile(&self) -> Result<ProfileView> {
        let user = match self.api.profile().await {
            Ok(user) => user,
            Err(e) => {
                self.view.notify(Notice::Error, "Failed to load profile");
                return Err(e);
            }
        };

        let stats = match self.api.chat_stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!("failed to load chat stats: {}", e);
                None
            }
        };

        Ok(ProfileView { user, stats })
    }

    /// Submits a profile update, merging the server's record into the cached
    /// user and re-persisting the session on success.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        if update.is_empty() {
            self.view.notify(Notice::Info, "Nothing to update");
            return Ok(());
        }

        let updated = match self.api.update_profile(update).await {
            Ok(updated) => updated,
            Err(e) => {
                self.view.notify(Notice::Error, &e.user_message());
                return Err(e);
            }
        };

        {
            let mut state = self.state.write().await;
            match state.current_user.as_mut() {
                Some(user) => user.merge(updated.clone()),
                None => state.current_user = Some(updated.clone()),
            }
        }

        let mut session = self.store.load()?;
        session.user = Some(updated.clone());
        self.store.save(&session)?;

        self.view
            .set_user_identity(&updated.full_name, &updated.initials());
        self.view
            .notify(Notice::Success, "Profile updated successfully");
        Ok(())
    }

    /// Changes the password after local validation.
    ///
    /// Mismatched or too-short passwords are rejected before any network
    /// call; all failures surface as notifications only.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        if let Err(e) = validate_password_change(new_password, confirm_password) {
            self.view.notify(Notice::Error, &e.user_message());
            return Err(e);
        }

        match self.api.change_password(current_password, new_password).await {
            Ok(()) => {
                self.view
                    .notify(Notice::Success, "Password changed successfully");
                Ok(())
            }
            Err(e) => {
                self.view.notify(Notice::Error, &e.user_message());
                Err(e)
            }
        }
    }

    /// Clears the persisted session and resets view state. Unconditional,
    /// no network call, no confirmation step.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear()?;
        self.state.write().await.reset();
        Ok(())
    }

    /// The active chat id, absent in the draft state.
    pub async fn current_chat_id(&self) -> Option<ChatId> {
        self.state.read().await.current_chat_id
    }

    /// The cached signed-in user.
    pub async fn current_user(&self) -> Option<UserRecord> {
        self.state.read().await.current_user.clone()
    }

    /// Snapshot of the cached chat list.
    pub async fn chat_history(&self) -> Vec<sana_core::chat::ChatSummary> {
        self.state.read().await.chat_history.clone()
    }
}
