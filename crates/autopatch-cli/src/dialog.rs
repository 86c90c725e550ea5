//! [`Prompt`] backed by the `dialog(1)` program.
//!
//! dialog draws on the terminal through stdout and reports the answer on
//! stderr; the exit status says which button closed the box.

use std::io::Write;
use std::process::{Command, Stdio};

use autopatch_flow::{Choice, Prompt, PromptError, Reply};

const EXIT_OK: i32 = 0;
const EXIT_CANCEL: i32 = 1;
const EXIT_EXTRA: i32 = 3;
const EXIT_ESC: i32 = 255;

/// Button that closed a dialog box and the text it reported.
#[derive(Debug, PartialEq, Eq)]
struct Answer {
    button: Reply,
    text: String,
}

fn button(code: Option<i32>) -> Result<Reply, PromptError> {
    match code {
        Some(EXIT_OK) => Ok(Reply::Ok),
        Some(EXIT_EXTRA) => Ok(Reply::Extra),
        Some(EXIT_CANCEL) | Some(EXIT_ESC) => Ok(Reply::Cancel),
        other => Err(PromptError::Unexpected(format!("dialog exited with {other:?}"))),
    }
}

fn choice_args(choices: &[Choice], with_state: bool) -> Vec<String> {
    let mut args = Vec::with_capacity(choices.len() * 3);
    for c in choices {
        args.push(c.tag.clone());
        args.push(c.label.clone());
        if with_state {
            args.push(if c.selected { "on" } else { "off" }.to_string());
        }
    }
    args
}

pub struct DialogPrompt {
    program: String,
}

impl Default for DialogPrompt {
    fn default() -> Self {
        Self {
            program: "dialog".into(),
        }
    }
}

impl DialogPrompt {
    fn show(&self, args: &[String]) -> Result<Answer, PromptError> {
        tracing::debug!(?args, "dialog");
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PromptError::Unavailable(self.program.clone())
                } else {
                    PromptError::Io(e)
                }
            })?;
        clear_screen();
        Ok(Answer {
            button: button(output.status.code())?,
            text: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn boxed(kind: &str, text: &str) -> Vec<String> {
        vec![kind.to_string(), text.to_string(), "0".into(), "0".into()]
    }
}

fn clear_screen() {
    print!("\x1b[2J\x1b[H");
    let _ = std::io::stdout().flush();
}

impl Prompt for DialogPrompt {
    fn menu(&self, text: &str, choices: &[Choice]) -> Result<Option<String>, PromptError> {
        let mut args = Self::boxed("--menu", text);
        args.push("0".into());
        args.extend(choice_args(choices, false));
        let answer = self.show(&args)?;
        Ok((answer.button == Reply::Ok).then_some(answer.text))
    }

    fn checklist(&self, text: &str, choices: &[Choice]) -> Result<Option<Vec<String>>, PromptError> {
        let mut args = vec!["--separate-output".to_string()];
        args.extend(Self::boxed("--checklist", text));
        args.push("0".into());
        args.extend(choice_args(choices, true));
        let answer = self.show(&args)?;
        if answer.button != Reply::Ok {
            return Ok(None);
        }
        Ok(Some(
            answer
                .text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        ))
    }

    fn input(&self, text: &str, initial: &str) -> Result<Option<String>, PromptError> {
        let mut args = Self::boxed("--inputbox", text);
        args.push(initial.to_string());
        let answer = self.show(&args)?;
        Ok((answer.button == Reply::Ok).then_some(answer.text))
    }

    fn yesno(&self, text: &str) -> Result<bool, PromptError> {
        Ok(self.show(&Self::boxed("--yesno", text))?.button == Reply::Ok)
    }

    fn scrollbox(&self, text: &str, extra: Option<&str>) -> Result<Reply, PromptError> {
        // Text boxes read from a file; long lint output does not fit in argv.
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        let mut args = Vec::new();
        if let Some(label) = extra {
            args.extend(["--extra-button".to_string(), "--extra-label".into(), label.into()]);
        }
        args.extend(Self::boxed("--textbox", &file.path().to_string_lossy()));
        Ok(self.show(&args)?.button)
    }

    fn message(&self, text: &str) -> Result<(), PromptError> {
        self.show(&Self::boxed("--msgbox", text)).map(|_| ())
    }

    fn notice(&self, text: &str) {
        println!("{text}");
    }
}
