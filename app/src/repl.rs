use crate::render::{banner, render_message};
use anyhow::Result;
use dwgpt_core::export::export_as_delimited_text;
use dwgpt_core::protocol::Record;
use dwgpt_core::state::{ChatMessage, ChatSession, SendError};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Send(String),
    /// Export the n-th most recent record set, 1 being the latest.
    Export(usize),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    let message = || ReplCommand::Send(line.trim_end_matches(['\r', '\n']).to_string());
    let Some(command) = trimmed.strip_prefix('/') else {
        return message();
    };
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "quit" | "exit" => ReplCommand::Quit,
        "help" => ReplCommand::Help,
        "export" => match parts.next().map(str::parse::<usize>) {
            None => ReplCommand::Export(1),
            Some(Ok(n)) if n > 0 => ReplCommand::Export(n),
            Some(_) => ReplCommand::Unknown(trimmed.to_string()),
        },
        // Anything that is not a command word goes to the assistant as typed.
        _ => message(),
    }
}

pub enum ReplOutcome {
    Continue(String),
    Quit,
}

pub struct ChatRepl {
    session: ChatSession,
    export_dir: PathBuf,
}

impl ChatRepl {
    pub fn new(session: ChatSession, export_dir: PathBuf) -> Self {
        Self {
            session,
            export_dir,
        }
    }

    pub async fn run(&self) -> Result<()> {
        print!("{}", banner());
        for message in self.session.messages() {
            println!("{}", render_message(&message));
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let command = parse_command(&line);
            if matches!(command, ReplCommand::Send(_)) {
                println!("Thinking...");
            }
            match self.handle(command).await {
                ReplOutcome::Continue(output) if output.is_empty() => {}
                ReplOutcome::Continue(output) => println!("{output}"),
                ReplOutcome::Quit => break,
            }
        }
        Ok(())
    }

    pub async fn handle(&self, command: ReplCommand) -> ReplOutcome {
        match command {
            ReplCommand::Send(text) => ReplOutcome::Continue(self.submit_message(text).await),
            ReplCommand::Export(n) => ReplOutcome::Continue(self.export(n)),
            ReplCommand::Help => ReplOutcome::Continue(banner()),
            ReplCommand::Quit => ReplOutcome::Quit,
            ReplCommand::Empty => ReplOutcome::Continue(String::new()),
            ReplCommand::Unknown(input) => {
                ReplOutcome::Continue(format!("Invalid command `{input}`. Type /help."))
            }
        }
    }

    async fn submit_message(&self, text: String) -> String {
        match self.session.send(text).await {
            Ok(reply) => render_message(&reply),
            Err(SendError::EmptyMessage) => String::new(),
            Err(SendError::Busy) => "Still thinking about the previous message.".to_string(),
        }
    }

    fn export(&self, n: usize) -> String {
        let messages = self.session.messages();
        let Some(records) = nth_record_set(&messages, n) else {
            return "No record set to export.".to_string();
        };
        let Some(export) = export_as_delimited_text(records) else {
            return "No record set to export.".to_string();
        };
        match export.write_to(&self.export_dir) {
            Ok(path) => format!("Saved {} record(s) to {}", records.len(), path.display()),
            Err(err) => {
                error!("error" = %err, "Failed to export records");
                format!("Export failed: {err:#}")
            }
        }
    }
}

fn nth_record_set(messages: &[ChatMessage], n: usize) -> Option<&[Record]> {
    messages
        .iter()
        .rev()
        .filter_map(ChatMessage::records)
        .nth(n.checked_sub(1)?)
}
