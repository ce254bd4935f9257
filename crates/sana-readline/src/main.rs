use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Editor;
use rustyline::{Context, Helper};
use tracing_subscriber::EnvFilter;

use sana_application::{ChatController, Startup};
use sana_core::chat::{ChatId, ChatSummary, DisplayMessage, MessageRole};
use sana_core::prediction::format_prediction;
use sana_core::user::ProfileUpdate;
use sana_core::view::{ChatView, Notice};
use sana_infrastructure::{ClientConfig, FileSessionStore};
use sana_interaction::ApiClient;

const COMMANDS: &[&str] = &[
    "/new", "/chats", "/open", "/delete", "/profile", "/update", "/password", "/logout", "/help",
];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Renders the chat to the terminal.
///
/// The REPL is synchronous from the user's point of view (the prompt does not
/// return while a send is in flight), so the send affordance and scrolling
/// are no-ops here.
struct TerminalView;

impl ChatView for TerminalView {
    fn show_messages(&self, messages: &[DisplayMessage]) {
        println!();
        for message in messages {
            self.append_message(message);
        }
    }

    fn append_message(&self, message: &DisplayMessage) {
        match message {
            DisplayMessage::Text {
                role: MessageRole::User,
                content,
            } => {
                println!("{}", format!("> {}", content).green());
            }
            DisplayMessage::Text {
                role: MessageRole::Assistant,
                content,
            } => {
                for line in content.lines() {
                    println!("{}", line.bright_blue());
                }
                println!();
            }
            DisplayMessage::Prediction(prediction) => {
                let display = format_prediction(prediction);
                for line in display.to_text().lines() {
                    println!("{}", line.bright_blue());
                }
                println!();
            }
        }
    }

    fn show_chat_list(&self, _chats: &[ChatSummary], _active: Option<ChatId>) {
        // The list is printed on demand by /chats, not on every refresh.
    }

    fn set_chat_title(&self, title: &str) {
        println!("{}", format!("=== {} ===", title).bright_magenta().bold());
    }

    fn set_user_identity(&self, name: &str, initials: &str) {
        println!(
            "{}",
            format!("Signed in as {} [{}]", name, initials).bright_black()
        );
    }

    fn set_send_enabled(&self, _enabled: bool) {}

    fn set_typing(&self, typing: bool) {
        if typing {
            println!("{}", "Analyzing symptoms...".bright_black());
        }
    }

    fn notify(&self, level: Notice, message: &str) {
        match level {
            Notice::Info => println!("{}", message.bright_black()),
            Notice::Success => println!("{}", message.bright_green()),
            Notice::Error => eprintln!("{}", format!("Error: {}", message).red()),
        }
    }

    fn scroll_to_bottom(&self) {}
}

type Repl = Editor<CliHelper, rustyline::history::DefaultHistory>;

/// Prompts for credentials until a sign-in succeeds.
///
/// Returns `false` when the user aborts with CTRL-C or CTRL-D.
async fn sign_in_loop(rl: &mut Repl, controller: &ChatController) -> Result<bool> {
    println!("{}", "Please sign in.".bright_yellow());
    loop {
        let email = match rl.readline("email: ") {
            Ok(line) => line.trim().to_string(),
            Err(_) => return Ok(false),
        };
        if email.is_empty() {
            continue;
        }
        let password = match rl.readline("password: ") {
            Ok(line) => line,
            Err(_) => return Ok(false),
        };

        // Failures are already surfaced as a notification; just re-prompt.
        match controller.sign_in(&email, &password).await {
            Ok(()) => return Ok(true),
            Err(e) => tracing::debug!("sign-in attempt failed: {}", e),
        }
    }
}

/// Prints the numbered chat list used by /open and /delete.
async fn print_chat_list(controller: &ChatController) {
    let chats = controller.chat_history().await;
    if chats.is_empty() {
        println!("{}", "No chats yet.".bright_black());
        return;
    }
    let active = controller.current_chat_id().await;
    for (index, chat) in chats.iter().enumerate() {
        let marker = if active == Some(chat.id) { "*" } else { " " };
        println!(
            "{} {:>2}. {}",
            marker.bright_green(),
            index + 1,
            chat.display_title()
        );
    }
}

/// Resolves a 1-based index from /chats into a chat id.
async fn resolve_chat_index(controller: &ChatController, arg: &str) -> Option<ChatId> {
    let index: usize = match arg.trim().parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("{}", "Expected a chat number (see /chats).".red());
            return None;
        }
    };
    let chats = controller.chat_history().await;
    match index.checked_sub(1).and_then(|i| chats.get(i)) {
        Some(chat) => Some(chat.id),
        None => {
            eprintln!("{}", "No chat with that number.".red());
            None
        }
    }
}

fn prompt_optional(rl: &mut Repl, prompt: &str) -> Option<String> {
    match rl.readline(prompt) {
        Ok(line) => {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}

/// Collects a partial profile update, blank answers keeping current values.
fn prompt_profile_update(rl: &mut Repl) -> ProfileUpdate {
    println!("{}", "Leave a field blank to keep its current value.".bright_black());
    ProfileUpdate {
        full_name: prompt_optional(rl, "full name: "),
        dob: prompt_optional(rl, "date of birth (YYYY-MM-DD): "),
        gender: prompt_optional(rl, "gender: "),
        nationality: prompt_optional(rl, "nationality: "),
    }
}

async fn run_password_change(rl: &mut Repl, controller: &ChatController) {
    let current = match rl.readline("current password: ") {
        Ok(line) => line,
        Err(_) => return,
    };
    let new = match rl.readline("new password: ") {
        Ok(line) => line,
        Err(_) => return,
    };
    let confirm = match rl.readline("confirm new password: ") {
        Ok(line) => line,
        Err(_) => return,
    };
    // Outcome is surfaced through notifications.
    let _ = controller.change_password(&current, &new, &confirm).await;
}

fn print_help() {
    println!("{}", "Commands:".bright_yellow());
    println!("  /new            start a new chat");
    println!("  /chats          list your chats");
    println!("  /open <n>       open chat n from the list");
    println!("  /delete <n>     delete chat n from the list");
    println!("  /profile        show your profile and usage");
    println!("  /update         update profile fields");
    println!("  /password       change your password");
    println!("  /logout         sign out");
    println!("  quit            exit");
    println!();
    println!(
        "{}",
        "Anything else is sent as a symptom description.".bright_black()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // ===== Backend Initialization =====
    let config = ClientConfig::load()?;
    tracing::debug!(base_url = %config.base_url(), timeout_secs = config.timeout_secs, "client configuration loaded");
    let store = Arc::new(FileSessionStore::new()?);
    let api = Arc::new(ApiClient::from_config(&config, store.clone()));
    let view = Arc::new(TerminalView);
    let controller = ChatController::new(api, store, view);

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== Sana Health Assistant ===".bright_magenta().bold());
    println!(
        "{}",
        "Describe your symptoms, or type '/help' for commands and 'quit' to exit.".bright_black()
    );
    println!();

    if controller.initialize().await? == Startup::SignedOut {
        if !sign_in_loop(&mut rl, &controller).await? {
            return Ok(());
        }
    }

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if let Some(command) = trimmed.strip_prefix('/') {
                    let (name, arg) = match command.split_once(' ') {
                        Some((name, arg)) => (name, arg.trim()),
                        None => (command, ""),
                    };
                    match name {
                        "new" => controller.start_new_chat().await,
                        "chats" => {
                            controller.load_chat_history().await;
                            print_chat_list(&controller).await;
                        }
                        "open" => {
                            if let Some(id) = resolve_chat_index(&controller, arg).await {
                                // Failure already notified; nothing else to do.
                                let _ = controller.load_chat(id).await;
                            }
                        }
                        "delete" => {
                            if let Some(id) = resolve_chat_index(&controller, arg).await {
                                let _ = controller.delete_chat(id).await;
                            }
                        }
                        "profile" => {
                            if let Ok(profile) = controller.show_profile().await {
                                let user = &profile.user;
                                println!("{}", format!("{} <{}>", user.full_name, user.email).bright_blue());
                                println!("  dob:         {}", user.dob);
                                println!("  gender:      {}", user.gender);
                                println!("  nationality: {}", user.nationality);
                                if let Some(stats) = profile.stats {
                                    println!(
                                        "  usage:       {} chats, {} messages",
                                        stats.total_chats, stats.total_messages
                                    );
                                }
                            }
                        }
                        "update" => {
                            let update = prompt_profile_update(&mut rl);
                            let _ = controller.update_profile(&update).await;
                        }
                        "password" => run_password_change(&mut rl, &controller).await,
                        "logout" => {
                            controller.logout().await?;
                            println!("{}", "Signed out.".bright_green());
                            if !sign_in_loop(&mut rl, &controller).await? {
                                break;
                            }
                        }
                        "help" => print_help(),
                        _ => println!("{}", "Unknown command, try /help".bright_black()),
                    }
                    continue;
                }

                // Outcomes, including partial failures, are rendered by the
                // view as the pipeline runs.
                let _ = controller.send_message(trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
