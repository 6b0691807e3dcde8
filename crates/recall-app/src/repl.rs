//! Interactive terminal loop over a [`ChatSession`].

use recall_chat::{AiResponse, ChatError, ChatSession, SendOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Send(&'a str),
    Clear,
    Forget,
    Memory,
    Quit,
    Help,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "/clear" => Command::Clear,
            "/forget" => Command::Forget,
            "/memory" => Command::Memory,
            "/quit" | "/exit" => Command::Quit,
            "/help" => Command::Help,
            _ if trimmed.starts_with('/') => Command::Unknown(trimmed),
            _ => Command::Send(line),
        }
    }
}

const HELP: &str = "Commands: /clear (clear messages), /forget (wipe memory), /memory (show memory), /quit";

fn render_reply(reply: &AiResponse) -> String {
    let mut out = format!(
        "{}\n  [{} | {} | {} | confidence {:.2}]\n",
        reply.response, reply.intent, reply.sentiment, reply.conversation_state, reply.confidence
    );
    for item in &reply.related_content {
        out.push_str(&format!("  related: {} ({})\n", item.title, item.id));
    }
    for insight in &reply.actionable_insights {
        out.push_str(&format!("  tip: {}\n", insight));
    }
    for question in &reply.follow_up_questions {
        out.push_str(&format!("  follow-up: {}\n", question));
    }
    for suggestion in &reply.suggestions {
        out.push_str(&format!("  try: {}\n", suggestion));
    }
    out
}

fn render_outcome(session: &ChatSession, outcome: SendOutcome) -> Result<Option<String>, ChatError> {
    let text = match outcome {
        SendOutcome::Replied(reply) => render_reply(&reply),
        SendOutcome::Failed(_) => match session.messages()?.last() {
            Some(message) => format!("{}\n", message.content),
            None => String::new(),
        },
        SendOutcome::Ignored(_) => return Ok(None),
    };
    Ok(Some(text))
}

/// Read lines from `input` until EOF or `/quit`, writing replies to `output`.
pub async fn run<R, W>(
    session: &ChatSession,
    input: R,
    mut output: W,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    output.write_all(format!("{}\n> ", HELP).as_bytes()).await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let text = match Command::parse(&line) {
            Command::Send(message) => {
                let outcome = session.send_message(message).await?;
                render_outcome(session, outcome)?.unwrap_or_default()
            }
            Command::Clear => {
                session.clear_messages()?;
                "Messages cleared.\n".to_string()
            }
            Command::Forget => {
                session.clear_memory()?;
                "Memory wiped.\n".to_string()
            }
            Command::Memory => format!("{}\n", serde_json::to_string_pretty(&session.memory()?)?),
            Command::Help => format!("{}\n", HELP),
            Command::Quit => break,
            Command::Unknown(cmd) => format!("Unknown command: {}\n{}\n", cmd, HELP),
        };
        output.write_all(text.as_bytes()).await?;
        output.write_all(b"> ").await?;
        output.flush().await?;
    }
    Ok(())
}
