use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use crate::models::credentials::UserCredentials;
use crate::models::request::{default_capacity, default_duration_hours, default_start_time};
use crate::models::schedule::FilterSelection;
use crate::services::jobs::{Dispatcher, JobStatus, ScrapeJob};
use crate::services::scraper::ScrapePolicy;
use crate::services::store::CredentialStore;

/// Transport message-size limit; longer output is split into chunks.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Fixed backoff between job status polls.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Split long output into transport-sized chunks, on character boundaries.
pub fn split_message(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_MESSAGE_LEN)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Outbound side of the chat surface. The concrete bot transport lives
/// outside this crate; tests use a recording implementation.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, chat_id: i64, text: String);
}

/// Where a chat is in the credential-setup conversation.
#[derive(Debug, Clone, PartialEq)]
enum ChatState {
    Idle,
    AwaitingEmail,
    AwaitingPassword { email: String },
}

/// Transport-agnostic chat command handler.
///
/// Owns the per-chat conversation state and turns commands, menu callbacks
/// and free text into messages on the transport. All business logic stays in
/// the dispatcher and store; this layer only sequences prompts and renders
/// results.
pub struct ChatHandler {
    store: Arc<dyn CredentialStore>,
    dispatcher: Option<Arc<Dispatcher>>,
    transport: Arc<dyn ChatTransport>,
    email_domain: String,
    states: Mutex<HashMap<i64, ChatState>>,
}

impl ChatHandler {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        dispatcher: Option<Arc<Dispatcher>>,
        transport: Arc<dyn ChatTransport>,
        email_domain: &str,
    ) -> Self {
        Self {
            store,
            dispatcher,
            transport,
            email_domain: email_domain.to_string(),
            states: Mutex::new(HashMap::new()),
        }
    }

    fn state_of(&self, chat_id: i64) -> ChatState {
        self.states
            .lock()
            .unwrap()
            .get(&chat_id)
            .cloned()
            .unwrap_or(ChatState::Idle)
    }

    fn set_state(&self, chat_id: i64, state: ChatState) {
        self.states.lock().unwrap().insert(chat_id, state);
    }

    async fn send(&self, chat_id: i64, text: impl Into<String>) {
        self.transport.send(chat_id, text.into()).await;
    }

    /// Send a possibly oversized block, chunked to the transport limit.
    async fn send_large(&self, chat_id: i64, text: &str) {
        for part in split_message(text) {
            self.transport.send(chat_id, part).await;
        }
    }

    /// Slash commands: `/start` shows the menu, `/cancel` aborts a setup
    /// flow in progress.
    pub async fn handle_command(&self, chat_id: i64, command: &str) {
        match command {
            "/start" => {
                self.send(
                    chat_id,
                    "Welcome to the room availability bot.\nChoose an action:\n\
                     - Scrape Now (scrape_now)\n- Settings (settings)",
                )
                .await;
            }
            "/cancel" => {
                self.set_state(chat_id, ChatState::Idle);
                self.send(chat_id, "Operation cancelled.").await;
            }
            other => {
                warn!("Unknown chat command from {}: {}", chat_id, other);
                self.send(chat_id, "Unknown command. Try /start.").await;
            }
        }
    }

    /// Menu actions.
    pub async fn handle_callback(&self, chat_id: i64, action: &str) {
        match action {
            "scrape_now" => self.run_scrape_flow(chat_id).await,
            "settings" => {
                self.send(
                    chat_id,
                    "Settings:\n- Set credentials (set_creds)\n- Back (main_menu)",
                )
                .await;
            }
            "set_creds" => {
                self.set_state(chat_id, ChatState::AwaitingEmail);
                self.send(chat_id, "Please enter your institutional email:")
                    .await;
            }
            "main_menu" => self.handle_command(chat_id, "/start").await,
            other => {
                warn!("Unknown chat action from {}: {}", chat_id, other);
            }
        }
    }

    /// Free text drives the two-step credential setup.
    pub async fn handle_text(&self, chat_id: i64, text: &str) {
        match self.state_of(chat_id) {
            ChatState::AwaitingEmail => {
                self.set_state(
                    chat_id,
                    ChatState::AwaitingPassword {
                        email: text.trim().to_string(),
                    },
                );
                self.send(chat_id, "Please enter your password:").await;
            }
            ChatState::AwaitingPassword { email } => {
                self.set_state(chat_id, ChatState::Idle);
                let credentials = UserCredentials::new(email, text);
                if !credentials.is_valid_format(&self.email_domain) {
                    self.send(
                        chat_id,
                        format!(
                            "Invalid credentials: email must contain {} and the password \
                             must be at least 8 characters. Start over from settings.",
                            self.email_domain
                        ),
                    )
                    .await;
                    return;
                }
                match self.store.store(&chat_id.to_string(), &credentials) {
                    Ok(()) => self.send(chat_id, "Credentials updated successfully!").await,
                    Err(e) => {
                        warn!("Failed to store credentials for {}: {}", chat_id, e);
                        self.send(chat_id, "Could not save credentials, try again later.")
                            .await;
                    }
                }
            }
            ChatState::Idle => {
                self.send(chat_id, "Try /start for the menu.").await;
            }
        }
    }

    /// The "scrape now" action: requires stored credentials, then enqueues
    /// a job and polls it at a fixed backoff, streaming status updates.
    async fn run_scrape_flow(&self, chat_id: i64) {
        let credentials = match self.store.load(&chat_id.to_string()) {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                self.send(chat_id, "No credentials set! Configure in settings first.")
                    .await;
                return;
            }
            Err(e) => {
                warn!("Credential lookup failed for {}: {}", chat_id, e);
                self.send(chat_id, "Credential store unavailable, try again later.")
                    .await;
                return;
            }
        };

        let Some(dispatcher) = &self.dispatcher else {
            self.send(chat_id, "Scraping backend is not configured.").await;
            return;
        };

        let id = dispatcher.dispatch(ScrapeJob {
            selection: default_chat_selection(),
            credentials,
            policy: ScrapePolicy::default(),
        });
        info!("Chat {} started scrape job {}", chat_id, id);
        self.send(chat_id, "Scraping started...").await;

        loop {
            let Some(state) = dispatcher.status(&id) else {
                self.send(chat_id, "Job disappeared from the queue.").await;
                return;
            };
            if state.status.is_terminal() {
                match state.status {
                    JobStatus::Success => {
                        let rendered = match &state.result {
                            Some(result) => serde_json::to_string_pretty(result)
                                .unwrap_or_else(|e| format!("result rendering failed: {}", e)),
                            None => "result missing".to_string(),
                        };
                        self.send_large(
                            chat_id,
                            &format!("Scraping complete!\nResults:\n{}", rendered),
                        )
                        .await;
                    }
                    _ => {
                        let message =
                            state.error.unwrap_or_else(|| "unknown error".to_string());
                        self.send_large(chat_id, &format!("Error: {}", message)).await;
                    }
                }
                return;
            }
            self.send(chat_id, format!("Status: {}", state.status.as_str()))
                .await;
            tokio::time::sleep(STATUS_POLL_INTERVAL).await;
        }
    }
}

/// Filters used by the one-tap chat scrape: library study rooms for today,
/// with the standard window defaults.
pub fn default_chat_selection() -> FilterSelection {
    FilterSelection {
        buildings: vec!["Li Ka Shing Library".to_string()],
        floors: vec!["Level 1".to_string()],
        facility_types: Vec::new(),
        equipment: Vec::new(),
        date: Utc::now().date_naive(),
        start_time: default_start_time(),
        duration_hours: default_duration_hours(),
        capacity: default_capacity(),
    }
}
