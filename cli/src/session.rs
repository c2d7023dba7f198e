//! Model selection and the interactive chat loop.

use std::io::{self, BufRead, Write};

use termsage_core::{Messages, Ollama, Options};

/// Outcome of one selection attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Selection {
    Chosen(String),
    Invalid,
}

/// A number picks from `models` (1-based); anything else is taken as a name.
pub fn parse_selection(models: &[String], input: &str) -> Selection {
    let input = input.trim();
    if input.is_empty() {
        return Selection::Invalid;
    }
    match input.parse::<i64>() {
        Ok(n) if n >= 1 && (n as usize) <= models.len() => {
            Selection::Chosen(models[n as usize - 1].clone())
        }
        Ok(_) => Selection::Invalid,
        Err(_) => Selection::Chosen(input.to_string()),
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// List `models` and prompt until a valid choice is made. `None` on EOF.
pub fn choose_model<R: BufRead, W: Write>(
    models: &[String],
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<String>> {
    writeln!(output, "\nAvailable models:")?;
    for (i, model) in models.iter().enumerate() {
        writeln!(output, "  {}. {model}", i + 1)?;
    }

    loop {
        write!(
            output,
            "\nSelect model by number (1-{}) or enter model name: ",
            models.len()
        )?;
        output.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match parse_selection(models, &line) {
            Selection::Chosen(model) => return Ok(Some(model)),
            Selection::Invalid => writeln!(output, "Invalid selection. Please try again.")?,
        }
    }
}

/// Read user turns until `exit`, `quit`, or EOF, printing each reply.
///
/// Server errors are reported and the loop continues; the failed turn stays
/// in the history so the next attempt carries it.
pub fn chat_loop<R: BufRead, W: Write>(
    ollama: &Ollama,
    model: &str,
    system: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<Messages> {
    let mut history = Messages::new();
    if !system.is_empty() {
        history.add_system(system);
    }

    writeln!(output, "\nChat started with {model}. Type 'exit' to quit.\n")?;
    loop {
        write!(output, "You: ")?;
        output.flush()?;
        let Some(message) = read_line(input)? else {
            break;
        };
        if message == "exit" || message == "quit" {
            break;
        }

        history.add_user(&message);
        writeln!(output, "Waiting for response...")?;
        match ollama.chat(model, &history, Options::new()) {
            Ok(reply) => {
                let text = reply.as_simple_string().to_string();
                writeln!(output, "\nAssistant: {text}\n")?;
                history.add_assistant(&text);
            }
            Err(e) => {
                tracing::debug!(error = ?e, "chat request failed");
                eprintln!("Error: {e}");
            }
        }
    }

    writeln!(output, "Chat ended.")?;
    Ok(history)
}
