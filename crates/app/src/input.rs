use std::fmt;

use practice_core::model::{InteractionAnswer, InteractionKind, Question, UserAnswer};

/// One line of learner input, interpreted against the current question.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Answer(UserAnswer),
    /// Zero-based hint index.
    Hint(usize),
    Solution,
    Next,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Empty,
    NotAChoice { raw: String, choices: usize },
    NotANumber { raw: String },
    InvalidHint { raw: String },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty => write!(f, "type an answer, or `help` for commands"),
            InputError::NotAChoice { raw, choices } => {
                write!(f, "`{raw}` is not a choice between 1 and {choices}")
            }
            InputError::NotANumber { raw } => write!(f, "`{raw}` is not a number"),
            InputError::InvalidHint { raw } => {
                write!(f, "`{raw}` is not a hint number (hints start at 1)")
            }
        }
    }
}

impl std::error::Error for InputError {}

pub fn parse_action(line: &str, question: &Question) -> Result<Action, InputError> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    match words.next() {
        None => return Err(InputError::Empty),
        Some(":next" | "next") => return Ok(Action::Next),
        Some(":solution" | "solution") => return Ok(Action::Solution),
        Some(":help" | "help") => return Ok(Action::Help),
        Some(":quit" | "quit" | "exit") => return Ok(Action::Quit),
        Some(":hint" | "hint") => {
            let raw = words.next().unwrap_or("1");
            let index = raw
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .ok_or_else(|| InputError::InvalidHint { raw: raw.to_string() })?;
            return Ok(Action::Hint(index));
        }
        Some(_) => {}
    }

    let answer = match &question.interaction().kind {
        InteractionKind::MultipleChoiceInput { choices } => {
            let index = line
                .parse::<u32>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .filter(|n| usize::try_from(*n).is_ok_and(|n| n < choices.len()))
                .ok_or_else(|| InputError::NotAChoice {
                    raw: line.to_string(),
                    choices: choices.len(),
                })?;
            InteractionAnswer::NonNegativeInt(index)
        }
        InteractionKind::NumericInput => {
            let value = line.parse::<f64>().map_err(|_| InputError::NotANumber {
                raw: line.to_string(),
            })?;
            InteractionAnswer::Real(value)
        }
        InteractionKind::TextInput | InteractionKind::Continue => {
            InteractionAnswer::NormalizedString(line.to_string())
        }
    };

    let mut user_answer = UserAnswer::new(answer);
    user_answer.plain_answer = line.to_string();
    Ok(Action::Answer(user_answer))
}
