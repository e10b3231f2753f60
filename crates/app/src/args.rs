use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use studymate_core::model::{Difficulty, DocumentName, Priority};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDifficulty { raw: String },
    InvalidTime { flag: &'static str, raw: String },
    InvalidPriority { raw: String },
    TopicWithoutFile,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDifficulty { raw } => {
                let known: Vec<String> = Difficulty::ALL
                    .iter()
                    .map(|difficulty| difficulty.as_str().to_ascii_lowercase())
                    .collect();
                write!(f, "invalid --difficulty value: {raw} (one of {})", known.join(", "))
            }
            ArgsError::InvalidTime { flag, raw } => {
                write!(f, "invalid {flag} value: {raw} (expected RFC 3339)")
            }
            ArgsError::InvalidPriority { raw } => write!(f, "invalid --priority value: {raw}"),
            ArgsError::TopicWithoutFile => write!(f, "--topic needs --file"),
        }
    }
}

impl std::error::Error for ArgsError {}

/// Options for the interactive quiz.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QuizArgs {
    pub file: Option<DocumentName>,
    pub topic: Option<String>,
    pub count: Option<String>,
    pub difficulty: Option<Difficulty>,
}

/// Raw fields of a new calendar event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventArgs {
    pub title: String,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Files,
    Upload { path: PathBuf },
    Delete { file: DocumentName },
    Quiz(QuizArgs),
    Results,
    Highlights,
    Tutor { file: DocumentName },
    Coach,
    Podcast,
    Events { all: bool },
    AddEvent(EventArgs),
    Usage,
    Help,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_positional(
    args: &mut impl Iterator<Item = String>,
    what: &'static str,
) -> Result<String, ArgsError> {
    match args.next() {
        Some(value) if !value.starts_with("--") => Ok(value),
        Some(other) => Err(ArgsError::UnknownArg(other)),
        None => Err(ArgsError::MissingArgument { what }),
    }
}

fn no_more(args: &mut impl Iterator<Item = String>) -> Result<(), ArgsError> {
    match args.next() {
        Some(arg) if arg == "--help" || arg == "-h" => Ok(()),
        Some(arg) => Err(ArgsError::UnknownArg(arg)),
        None => Ok(()),
    }
}

fn parse_time(flag: &'static str, raw: String) -> Result<DateTime<Utc>, ArgsError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| ArgsError::InvalidTime { flag, raw })
}

impl Command {
    /// Parse everything after the program name.
    pub fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let Some(name) = args.next() else {
            return Ok(Command::Help);
        };
        let args = &mut args;
        let command = match name.as_str() {
            "--help" | "-h" | "help" => Command::Help,
            "files" => Command::Files,
            "upload" => Command::Upload {
                path: PathBuf::from(require_positional(args, "<path>")?),
            },
            "delete" => Command::Delete {
                file: DocumentName::new(require_positional(args, "<file>")?),
            },
            "quiz" => return Self::parse_quiz(args).map(Command::Quiz),
            "results" => Command::Results,
            "highlights" => Command::Highlights,
            "tutor" => return Self::parse_tutor(args),
            "coach" => Command::Coach,
            "podcast" => Command::Podcast,
            "events" => return Self::parse_events(args),
            "add-event" => return Self::parse_event(args).map(Command::AddEvent),
            "usage" => Command::Usage,
            other => return Err(ArgsError::UnknownCommand(other.to_string())),
        };
        no_more(args)?;
        Ok(command)
    }

    fn parse_quiz(args: &mut impl Iterator<Item = String>) -> Result<QuizArgs, ArgsError> {
        let mut quiz = QuizArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" => quiz.file = Some(DocumentName::new(require_value(args, "--file")?)),
                "--topic" => quiz.topic = Some(require_value(args, "--topic")?),
                "--count" => quiz.count = Some(require_value(args, "--count")?),
                "--difficulty" => {
                    let raw = require_value(args, "--difficulty")?;
                    let parsed = raw
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: raw.clone() })?;
                    quiz.difficulty = Some(parsed);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        if quiz.topic.is_some() && quiz.file.is_none() {
            return Err(ArgsError::TopicWithoutFile);
        }
        Ok(quiz)
    }

    fn parse_events(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut all = false;
        for arg in args.by_ref() {
            match arg.as_str() {
                "--all" => all = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Command::Events { all })
    }

    fn parse_tutor(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut file = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" => file = Some(DocumentName::new(require_value(args, "--file")?)),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        let file = file.ok_or(ArgsError::MissingValue { flag: "--file" })?;
        Ok(Command::Tutor { file })
    }

    fn parse_event(args: &mut impl Iterator<Item = String>) -> Result<EventArgs, ArgsError> {
        let mut event = EventArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--title" => event.title = require_value(args, "--title")?,
                "--description" => event.description = Some(require_value(args, "--description")?),
                "--start" => event.start = Some(parse_time("--start", require_value(args, "--start")?)?),
                "--end" => event.end = Some(parse_time("--end", require_value(args, "--end")?)?),
                "--category" => event.category = Some(require_value(args, "--category")?),
                "--priority" => {
                    let raw = require_value(args, "--priority")?;
                    event.priority = raw
                        .trim()
                        .parse::<u8>()
                        .ok()
                        .and_then(|value| Priority::from_u8(value).ok())
                        .ok_or(ArgsError::InvalidPriority { raw })?;
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(event)
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  studymate files");
    eprintln!("  studymate upload <path>");
    eprintln!("  studymate delete <file>");
    eprintln!("  studymate quiz [--file <file>] [--topic <topic>] [--count <n>] [--difficulty <d>]");
    eprintln!("  studymate results");
    eprintln!("  studymate highlights");
    eprintln!("  studymate tutor --file <file>");
    eprintln!("  studymate coach");
    eprintln!("  studymate podcast");
    eprintln!("  studymate events [--all]");
    eprintln!("  studymate add-event --title <t> --start <rfc3339> --end <rfc3339>");
    eprintln!("                      [--description <d>] [--category <c>] [--priority 1-3]");
    eprintln!("  studymate usage");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDYMATE_API_URL, STUDYMATE_WS_URL, STUDYMATE_HTTP_TIMEOUT_SECS");
    eprintln!("  STUDYMATE_USER_ID, STUDYMATE_TOKEN (required)");
    eprintln!("  STUDYMATE_SILENCE_MS, STUDYMATE_HIGHLIGHT_DAYS, RUST_LOG");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, ArgsError> {
        Command::parse(args.iter().map(|arg| (*arg).to_string()))
    }

    #[test]
    fn no_arguments_prints_help() {
        assert_eq!(parse(&[]).unwrap(), Command::Help);
    }

    #[test]
    fn quiz_flags_are_collected() {
        let command = parse(&[
            "quiz",
            "--file",
            "user_1_bio.pdf",
            "--topic",
            "Cells",
            "--count",
            "20",
            "--difficulty",
            "hard",
        ])
        .unwrap();

        assert_eq!(
            command,
            Command::Quiz(QuizArgs {
                file: Some(DocumentName::new("user_1_bio.pdf")),
                topic: Some("Cells".into()),
                count: Some("20".into()),
                difficulty: Some(Difficulty::Hard),
            })
        );
    }

    #[test]
    fn events_default_to_upcoming() {
        assert_eq!(parse(&["events"]).unwrap(), Command::Events { all: false });
        assert_eq!(parse(&["events", "--all"]).unwrap(), Command::Events { all: true });
    }

    #[test]
    fn add_event_parses_times_and_priority() {
        let Command::AddEvent(event) = parse(&[
            "add-event",
            "--title",
            "Revise",
            "--start",
            "2024-05-01T09:00:00+02:00",
            "--end",
            "2024-05-01T10:00:00+02:00",
            "--priority",
            "3",
        ])
        .unwrap() else {
            panic!("expected add-event");
        };

        assert_eq!(event.priority, Priority::High);
        assert_eq!(event.start.unwrap().to_rfc3339(), "2024-05-01T07:00:00+00:00");
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(matches!(
            parse(&["upload"]),
            Err(ArgsError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse(&["tutor"]),
            Err(ArgsError::MissingValue { flag: "--file" })
        ));
        assert!(matches!(
            parse(&["add-event", "--priority", "7"]),
            Err(ArgsError::InvalidPriority { .. })
        ));
        assert!(matches!(parse(&["files", "extra"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(parse(&["launch"]), Err(ArgsError::UnknownCommand(_))));
        assert!(matches!(
            parse(&["quiz", "--topic", "Cells"]),
            Err(ArgsError::TopicWithoutFile)
        ));
        assert!(
            ArgsError::InvalidDifficulty { raw: "extreme".into() }
                .to_string()
                .ends_with("(one of easy, medium, hard)")
        );
    }
}
