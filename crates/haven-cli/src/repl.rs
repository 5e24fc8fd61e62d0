//! Interactive prompt loop.

use std::io::Write;

use haven_ai::{
    ChatError, Conversation, ConversationEvent, MessageStatus, Role, SessionDirectory, SessionRef,
    SendOutcome,
};
use haven_common::HavenError;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::{self, error::RecvError};

const HELP: &str = "\
Commands:
  /new            start a new conversation
  /sessions       list stored conversations
  /load <id|n>    open a stored conversation
  /delete <id|n>  delete a stored conversation
  /history        print the current transcript
  /clear-error    dismiss the current error
  /help           show this help
  /quit           exit
Anything else is sent to the assistant. Ctrl-C cancels a reply in progress.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    New,
    Sessions,
    Load(String),
    Delete(String),
    History,
    ClearError,
    Help,
    Quit,
    Empty,
    Usage(&'static str),
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Say(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match (name, arg.is_empty()) {
            ("new", _) => Command::New,
            ("sessions", _) => Command::Sessions,
            ("load", false) => Command::Load(arg.to_string()),
            ("load", true) => Command::Usage("/load <id|n>"),
            ("delete", false) => Command::Delete(arg.to_string()),
            ("delete", true) => Command::Usage("/delete <id|n>"),
            ("history", _) => Command::History,
            ("clear-error", _) => Command::ClearError,
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            _ => Command::Unknown(name.to_string()),
        }
    }
}

pub struct Repl {
    conversation: Conversation,
    directory: SessionDirectory,
    events: broadcast::Receiver<ConversationEvent>,
    input: Lines<BufReader<Stdin>>,
}

impl Repl {
    pub fn new(conversation: Conversation, directory: SessionDirectory) -> Self {
        let events = conversation.subscribe();
        Self {
            conversation,
            directory,
            events,
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub async fn run(mut self) -> Result<(), HavenError> {
        println!("Haven. Type /help for commands.");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = self.input.next_line().await? else {
                break;
            };

            match Command::parse(&line) {
                Command::Empty => {}
                Command::Say(prompt) => self.say(&prompt).await,
                Command::New => {
                    self.conversation.new_session();
                    self.drain_events();
                    println!("Started a new conversation.");
                }
                Command::Sessions => self.list_sessions().await,
                Command::Load(arg) => self.load(&arg).await,
                Command::Delete(arg) => self.delete(&arg).await?,
                Command::History => self.print_history(),
                Command::ClearError => {
                    self.conversation.clear_error();
                    self.drain_events();
                }
                Command::Help => println!("{HELP}"),
                Command::Quit => break,
                Command::Usage(usage) => println!("usage: {usage}"),
                Command::Unknown(name) => println!("unknown command /{name}; try /help"),
            }
        }
        Ok(())
    }

    /// Send a prompt, rendering the reply as it streams in.
    async fn say(&mut self, prompt: &str) {
        let result = {
            let send = self.conversation.send(prompt);
            tokio::pin!(send);

            loop {
                tokio::select! {
                    result = &mut send => break result,
                    event = self.events.recv() => render_event(event),
                    _ = tokio::signal::ctrl_c() => {
                        self.conversation.cancel();
                    }
                }
            }
        };
        self.drain_events();

        match result {
            Ok(SendOutcome::Completed { .. }) | Ok(SendOutcome::Ignored) => {}
            Err(ChatError::Cancelled) => println!("\n(cancelled)"),
            Err(e) => println!("\nerror: {e}"),
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => render_event(Ok(event)),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "event feed lagged");
                }
                Err(_) => break,
            }
        }
    }

    async fn list_sessions(&mut self) {
        let client = self.conversation.client();
        let credentials = self.conversation.credentials();
        match self.directory.refresh(client, credentials).await {
            Ok(entries) if entries.is_empty() => println!("No stored conversations."),
            Ok(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    let when = entry
                        .updated_at
                        .or(entry.created_at)
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!("{:>3}. {}  [{}] {}", i + 1, entry.title, entry.session_ref, when);
                    if !entry.preview.is_empty() {
                        println!("     {}", entry.preview);
                    }
                }
            }
            Err(e) => println!("error: {e}"),
        }
    }

    /// Resolve `/load 2` against the last listing; anything else is taken
    /// as a session reference.
    fn resolve(&self, arg: &str) -> SessionRef {
        arg.parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.directory.entries().get(i))
            .map(|entry| entry.session_ref.clone())
            .unwrap_or_else(|| SessionRef::from(arg))
    }

    async fn load(&mut self, arg: &str) {
        let session_ref = self.resolve(arg);
        match self.conversation.load_session(&session_ref).await {
            Ok(()) => {
                self.drain_events();
                self.print_history();
            }
            Err(e) => println!("error: {e}"),
        }
    }

    async fn delete(&mut self, arg: &str) -> Result<(), HavenError> {
        let session_ref = self.resolve(arg);
        print!("Delete conversation {session_ref}? [y/N] ");
        std::io::stdout().flush()?;

        let answer = self.input.next_line().await?.unwrap_or_default();
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Kept.");
            return Ok(());
        }

        let client = self.conversation.client();
        let credentials = self.conversation.credentials();
        match self.directory.delete(client, credentials, &session_ref).await {
            Ok(()) => println!("Deleted."),
            Err(e) => println!("error: {e}"),
        }
        Ok(())
    }

    fn print_history(&self) {
        let snapshot = self.conversation.snapshot();
        if snapshot.messages.is_empty() {
            println!("(empty conversation)");
        }
        for message in &snapshot.messages {
            let who = match message.role {
                Role::User => "you",
                Role::Assistant => "haven",
            };
            let marker = match message.status {
                MessageStatus::Failed => " (failed)",
                MessageStatus::Pending | MessageStatus::Streaming => " (...)",
                MessageStatus::Complete => "",
            };
            println!("[{who}]{marker} {}", message.content);
            for item in &message.media {
                println!("    media: {} {}", item.title, item.url);
            }
        }
        if let Some(session_ref) = &snapshot.session_ref {
            println!("(session {session_ref})");
        }
        if let Some(error) = &snapshot.error {
            println!("error: {error}");
        }
    }
}

fn render_event(event: Result<ConversationEvent, RecvError>) {
    match event {
        Ok(ConversationEvent::MessageAppended {
            role: Role::Assistant,
            ..
        }) => print!("haven: "),
        Ok(ConversationEvent::Delta { text, .. }) => print!("{text}"),
        Ok(ConversationEvent::MessageCompleted { .. }) => println!(),
        Ok(ConversationEvent::MessageFailed { .. }) => println!(" (failed)"),
        Ok(ConversationEvent::SessionAdopted(session_ref)) => {
            tracing::debug!(%session_ref, "session adopted");
        }
        Ok(_) => {}
        Err(RecvError::Lagged(n)) => tracing::debug!(skipped = n, "event feed lagged"),
        Err(RecvError::Closed) => {}
    }
    let _ = std::io::stdout().flush();
}
