//! Interactive chat loop.

use std::future::Future;
use std::io::{self, BufRead, Write};
use tracing::{error, info};

use crate::agent::ChatAgent;
use crate::{Error, Result};

pub const PROMPT: &str = "kubeboy> ";
const EXIT_COMMANDS: [&str; 3] = ["quit", "exit", "bye"];

const HELP_TEXT: &str = "
KubeBoy - your Kubernetes assistant

Commands:
  help         Show this help message
  quit / exit  Leave KubeBoy

Example questions:
  Show me all pods
  What deployments are running in the default namespace?
  Give me a cluster summary
  Show me recent events
  Are there any failed pods?
  What nodes do I have and what's their status?
  List all namespaces
  Show me services in the kube-system namespace

All operations are read-only. KubeBoy never changes your cluster.
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    Empty,
    Ask(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let lower = line.to_lowercase();
        if line.is_empty() {
            Command::Empty
        } else if EXIT_COMMANDS.contains(&lower.as_str()) {
            Command::Exit
        } else if lower == "help" {
            Command::Help
        } else {
            Command::Ask(line.to_string())
        }
    }
}

/// Run the read-eval-print loop until an exit command or end of input.
///
/// Agent failures are reported and the loop carries on; only I/O errors on
/// the terminal itself end it early.
pub async fn run<R, W>(agent: &dyn ChatAgent, mut input: R, mut output: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "KubeBoy - your Kubernetes assistant ({} mode)", agent.behavior_type())?;
    writeln!(output, "Type 'help' for suggestions, 'quit' or 'exit' to leave.\n")?;

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output, "\nGoodbye!")?;
            break;
        }

        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Exit => {
                writeln!(output, "Goodbye!")?;
                break;
            }
            Command::Help => writeln!(output, "{}", HELP_TEXT)?,
            Command::Ask(message) => {
                writeln!(output, "\nProcessing...")?;
                match agent.respond(&message).await {
                    Ok(reply) => writeln!(output, "\n{}\n", reply)?,
                    Err(e) => {
                        error!("{} agent failed: {}", agent.behavior_type(), e);
                        writeln!(output, "\n{}\n", failure_message(&e))?;
                    }
                }
            }
        }
    }

    info!("Chat session ended");
    Ok(())
}

/// Wait for `interrupt` (Ctrl-C in the binary) and say goodbye.
///
/// The caller exits the process once this returns `Ok`.
pub async fn goodbye_on_interrupt<F, W>(interrupt: F, mut output: W) -> Result<()>
where
    F: Future<Output = io::Result<()>>,
    W: Write,
{
    interrupt.await?;
    writeln!(output, "\nGoodbye!")?;
    output.flush()?;
    info!("Chat session interrupted");
    Ok(())
}

fn failure_message(err: &Error) -> String {
    match err {
        Error::UpstreamModel(_) => {
            "Sorry, I could not process that request. Please try again.".to_string()
        }
        other => format!("Sorry, I encountered an error: {}", other),
    }
}
