mod coach;
mod quiz;
mod tutor;

use std::error::Error;
use std::path::Path;

use backend::{ProgressFeed, UploadFile};
use chrono::{Local, Offset};
use services::{AppServices, briefing_message};
use studymate_core::model::{CalendarEventDraft, DocumentName};
use tokio::task::JoinHandle;

use crate::args::{Command, EventArgs};

pub use coach::coach;
pub use quiz::quiz;
pub use tutor::tutor;

pub type CommandResult = Result<(), Box<dyn Error>>;

pub async fn dispatch(command: Command, services: &AppServices) -> CommandResult {
    match command {
        Command::Files => files(services).await,
        Command::Upload { path } => upload(services, &path).await,
        Command::Delete { file } => delete(services, &file).await,
        Command::Quiz(args) => quiz(services, args).await,
        Command::Results => results(services).await,
        Command::Highlights => highlights(services).await,
        Command::Tutor { file } => tutor(services, &file).await,
        Command::Coach => coach(services).await,
        Command::Podcast => podcast(services).await,
        Command::Events { all } => events(services, all).await,
        Command::AddEvent(event) => add_event(services, event).await,
        Command::Usage => usage(services).await,
        Command::Help => Ok(()),
    }
}

pub(crate) fn shown(services: &AppServices, file: &DocumentName) -> String {
    file.display_name(services.user_id()).to_string()
}

async fn files(services: &AppServices) -> CommandResult {
    let documents = services.library().list_documents().await?;
    if documents.is_empty() {
        println!("No documents uploaded yet.");
    }
    for (index, document) in documents.iter().enumerate() {
        println!("{:>3}. {}  ({document})", index + 1, shown(services, document));
    }
    Ok(())
}

/// Print upload progress frames until the returned task is aborted.
pub(crate) fn print_progress(feed: &ProgressFeed) -> JoinHandle<()> {
    let mut updates = feed.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let latest = updates.borrow_and_update().clone();
            if let Some(progress) = latest {
                println!("  [{:>3}%] {}", progress.percentage, progress.status);
            }
        }
    })
}

pub(crate) async fn read_upload(path: &Path) -> Result<UploadFile, Box<dyn Error>> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| format!("not a file: {}", path.display()))?;
    Ok(UploadFile::new(name, bytes))
}

async fn upload(services: &AppServices, path: &Path) -> CommandResult {
    let file = read_upload(path).await?;
    let feed = ProgressFeed::new();
    let _socket = services.subscribe_progress(feed.clone());
    let printer = print_progress(&feed);

    let result = services.library().upload_document(file).await;
    printer.abort();
    let stored = result?;
    println!("Uploaded {}", shown(services, &stored));
    Ok(())
}

async fn delete(services: &AppServices, file: &DocumentName) -> CommandResult {
    services.library().delete_document(file).await?;
    println!("Deleted {}", shown(services, file));
    Ok(())
}

async fn results(services: &AppServices) -> CommandResult {
    let groups = services.library().results_by_file().await?;
    if groups.is_empty() {
        println!("No quizzes taken yet.");
    }
    for group in groups {
        println!("{}", shown(services, &group.filename));
        for attempt in group.attempts {
            let difficulty = attempt
                .difficulty
                .map_or_else(String::new, |difficulty| format!(" [{difficulty}]"));
            println!(
                "    {}  {}/{} ({}%){difficulty}  {}",
                attempt.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                attempt.score,
                attempt.total_questions,
                attempt.percent(),
                attempt.topic,
            );
        }
    }
    Ok(())
}

async fn highlights(services: &AppServices) -> CommandResult {
    let offset = Local::now().offset().fix();
    let window = services.highlight_window();
    let Some(recap) = services.library().highlights(window, offset).await? else {
        println!(
            "No quizzes in the last {} days. Take one to see highlights.",
            window.lookback_days
        );
        return Ok(());
    };

    println!("Attempts:      {}", recap.attempts);
    println!("Average score: {}%", recap.average_percent);
    println!("Best / worst:  {}% / {}%", recap.best_percent, recap.worst_percent);
    println!(
        "Last quiz:     {} on {} ({}%)",
        recap.last.topic,
        shown(services, &recap.last.filename),
        recap.last.percent()
    );
    println!("Strongest:     {} ({}%)", recap.strongest.topic, recap.strongest.average_percent);
    println!("Needs work:    {} ({}%)", recap.weakest.topic, recap.weakest.average_percent);
    println!(
        "Most practiced: {} ({} attempts)",
        recap.most_practiced.topic, recap.most_practiced.attempts
    );
    let trend: Vec<String> = recap.trend.iter().map(|point| format!("{}%", point.percent)).collect();
    println!("Trend:         {}", trend.join(" > "));

    let practice = recap.weakest.practice_link();
    println!(
        "Practice it:   studymate quiz --file {} --topic \"{}\"",
        practice.filename, practice.topic
    );
    Ok(())
}

async fn podcast(services: &AppServices) -> CommandResult {
    let outcome = services.podcast().daily_briefing().await;
    println!("{}", briefing_message(&outcome));
    outcome?;
    Ok(())
}

async fn events(services: &AppServices, all: bool) -> CommandResult {
    let calendar = services.calendar();
    let events = if all {
        calendar.list_events().await?
    } else {
        calendar.upcoming().await?
    };
    if events.is_empty() {
        println!("Nothing planned.");
    }
    for event in events {
        println!(
            "{} - {}  {}  [{} | priority {}]",
            event.start_time.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            event.end_time.with_timezone(&Local).format("%H:%M"),
            event.title,
            event.category,
            event.priority.as_u8(),
        );
        if let Some(description) = event.description {
            println!("    {description}");
        }
    }
    Ok(())
}

async fn add_event(services: &AppServices, event: EventArgs) -> CommandResult {
    let draft = CalendarEventDraft {
        title: event.title,
        description: event.description,
        start_time: event.start,
        end_time: event.end,
        category: event.category,
        priority: event.priority,
    };
    services.calendar().add_event(draft).await?;
    println!("Event added.");
    Ok(())
}

async fn usage(services: &AppServices) -> CommandResult {
    let usage = services.usage().summary().await?;
    println!(
        "Files uploaded:    {}/{}",
        usage.total_files_uploaded, usage.limit_files
    );
    println!(
        "Quiz questions:    {}/{} today",
        usage.daily_quiz_questions, usage.limit_quiz
    );
    println!(
        "Tutor questions:   {}/{} today",
        usage.daily_tutor_questions, usage.limit_tutor
    );
    println!(
        "Coach messages:    {}/{} today",
        usage.daily_coach_msgs, usage.limit_coach
    );
    Ok(())
}
