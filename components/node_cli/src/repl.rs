//! REPL (Read-Eval-Print Loop) implementation
//!
//! The REPL evaluates on the calling thread against one long-lived
//! [`JsContext`], draining the event loop after every input so timers and
//! `fs` callbacks run between prompts.

use crate::error::{CliError, CliResult};
use builtins::inspect::inspect;
use node_process::JsContext;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Run the interactive REPL
///
/// # Returns
/// The exit status: the `process.exit` code, or 0 when the user quits
pub fn run_repl(context: &mut JsContext) -> CliResult<i32> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::Repl(format!("Failed to initialize editor: {}", e)))?;

    println!("Corten Node Runtime v{}", env!("CARGO_PKG_VERSION"));
    println!("Type JavaScript code or '.exit' to quit.");
    println!();

    let mut line_buffer = String::new();
    let mut in_multiline = false;

    loop {
        let prompt = if in_multiline { "... " } else { "> " };

        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if !in_multiline && (trimmed == "exit" || trimmed == ".exit" || trimmed == "quit") {
                    break;
                }

                if !in_multiline && trimmed.starts_with('.') {
                    handle_repl_command(trimmed, context);
                    continue;
                }

                if in_multiline {
                    line_buffer.push('\n');
                }
                line_buffer.push_str(&line);

                if !is_input_complete(&line_buffer) {
                    in_multiline = true;
                    continue;
                }
                in_multiline = false;
                let _ = editor.add_history_entry(&line_buffer);

                if let Some(code) = evaluate(context, &line_buffer) {
                    return Ok(code);
                }
                line_buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                if in_multiline {
                    println!("^C");
                    line_buffer.clear();
                    in_multiline = false;
                } else {
                    println!("Press Ctrl-D or type '.exit' to quit");
                }
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                return Err(CliError::Repl(format!("Readline error: {}", err)));
            }
        }
    }

    Ok(0)
}

/// Evaluates one input and runs the callbacks it scheduled.
///
/// Returns the exit code once script has called `process.exit`.
fn evaluate(context: &mut JsContext, input: &str) -> Option<i32> {
    match context.evaluate_script_named(input, "[repl]") {
        Ok(value) => println!("{}", inspect(context.interpreter(), value.value())),
        Err(error) if error.is_termination() => {}
        Err(error) => eprintln!("Uncaught {}", error.stack_trace()),
    }
    if context.exit_requested().is_none() {
        if let Err(error) = context.drain_event_loop() {
            if !error.is_termination() {
                eprintln!("Uncaught {}", error.stack_trace());
            }
        }
    }
    context.exit_requested()
}

/// Handle special REPL commands
fn handle_repl_command(command: &str, context: &JsContext) {
    match command {
        ".help" => {
            println!("REPL Commands:");
            println!("  .help     - Show this help message");
            println!("  .clear    - Clear the screen");
            println!("  .home     - Show the sandbox directory");
            println!("  .exit     - Exit the REPL");
        }
        ".clear" => {
            print!("\x1B[2J\x1B[1;1H");
        }
        ".home" => {
            println!("{}", context.sandbox().home().display());
        }
        _ => {
            println!("Unknown command: {}", command);
            println!("Type .help for available commands");
        }
    }
}

/// Check if the input appears to be complete
///
/// Balanced braces, brackets and parentheses outside string literals.
fn is_input_complete(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut string_char = ' ';
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if c == '\\' && in_string {
            escape_next = true;
            continue;
        }

        if !in_string {
            match c {
                '"' | '\'' | '`' => {
                    in_string = true;
                    string_char = c;
                }
                '{' | '[' | '(' => depth += 1,
                '}' | ']' | ')' => depth -= 1,
                _ => {}
            }
        } else if c == string_char {
            in_string = false;
        }
    }

    depth <= 0 && !in_string
}

#[cfg(test)]
mod tests {
    use super::*;
    use builtins::CaptureSink;
    use node_process::HostEnvironment;
    use std::sync::Arc;

    #[test]
    fn test_is_input_complete_simple() {
        assert!(is_input_complete("let x = 42;"));
        assert!(is_input_complete("console.log('hello');"));
    }

    #[test]
    fn test_is_input_complete_incomplete_brace() {
        assert!(!is_input_complete("function test() {"));
        assert!(!is_input_complete("fs.readdir('.', (err, files) => {"));
    }

    #[test]
    fn test_is_input_complete_with_strings() {
        assert!(is_input_complete(r#"let s = "hello {"; "#));
        assert!(!is_input_complete(r#"let s = "unclosed"#));
    }

    #[test]
    fn test_evaluate_drains_callbacks() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(CaptureSink::new());
        let mut context = JsContext::new(&HostEnvironment::new(dir.path()), "repl", sink.clone()).unwrap();

        assert_eq!(evaluate(&mut context, "setTimeout(() => console.log('tick'), 1)"), None);
        assert_eq!(sink.lines(), vec!["tick"]);
        assert_eq!(evaluate(&mut context, "setImmediate(() => process.exit(3))"), Some(3));
    }
}
