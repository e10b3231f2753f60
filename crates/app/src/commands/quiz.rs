use std::path::Path;

use backend::ProgressFeed;
use services::{AppServices, PendingPractice, QuizSessionController, WizardStep};
use studymate_core::model::{PracticeLink, QuestionId};

use super::{CommandResult, print_progress, read_upload, shown};
use crate::args::QuizArgs;
use crate::console::Prompt;

const OPTION_LETTERS: &[char] = &['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Interactive quiz wizard. With both `--file` and `--topic` the quiz starts
/// straight away.
pub async fn quiz(services: &AppServices, args: QuizArgs) -> CommandResult {
    let feed = ProgressFeed::new();
    let _socket = services.subscribe_progress(feed.clone());
    let mut quiz = services.quiz_controller(feed);
    if let Some(count) = &args.count {
        quiz.set_question_count_input(count.as_str());
        quiz.commit_question_count();
    }
    if let Some(difficulty) = args.difficulty {
        quiz.set_difficulty(difficulty);
    }

    let pending = match (args.file.clone(), args.topic.clone()) {
        (Some(filename), Some(topic)) => PendingPractice::new(Some(PracticeLink { filename, topic })),
        _ => PendingPractice::none(),
    };
    let _ = quiz.mount(&pending).await;
    show_notice(&mut quiz);
    if quiz.step() == WizardStep::Upload {
        if let Some(file) = args.file {
            quiz.select_document(file);
        }
    }

    let mut prompt = Prompt::new();
    loop {
        println!();
        let keep_going = match quiz.step() {
            WizardStep::Upload => choose_document(services, &mut quiz, &mut prompt).await?,
            WizardStep::Configure => configure(services, &mut quiz, &mut prompt).await?,
            WizardStep::Active => take_quiz(&mut quiz, &mut prompt).await?,
            WizardStep::Results => after_results(&mut quiz, &mut prompt).await?,
        };
        if !keep_going {
            return Ok(());
        }
    }
}

fn show_notice(quiz: &mut QuizSessionController) {
    if let Some(notice) = quiz.take_notice() {
        println!("! {}", notice.message());
    }
}

fn header(quiz: &QuizSessionController, title: &str) {
    println!("Step {}/4: {title}", quiz.step().number());
}

async fn choose_document(
    services: &AppServices,
    quiz: &mut QuizSessionController,
    prompt: &mut Prompt,
) -> Result<bool, Box<dyn std::error::Error>> {
    header(quiz, "choose a document");
    for (index, document) in quiz.library().iter().enumerate() {
        println!("{:>3}. {}", index + 1, shown(services, document));
    }
    let Some(answer) = prompt
        .ask("Number of a document, or a PDF path to upload (empty to quit):")
        .await?
    else {
        return Ok(false);
    };
    if answer.is_empty() {
        return Ok(false);
    }

    if let Ok(index) = answer.parse::<usize>() {
        match index.checked_sub(1).and_then(|i| quiz.library().get(i)).cloned() {
            Some(document) => quiz.select_document(document),
            None => println!("! No document number {index}."),
        }
        return Ok(true);
    }

    let file = match read_upload(Path::new(&answer)).await {
        Ok(file) => file,
        Err(err) => {
            println!("! {err}");
            return Ok(true);
        }
    };
    let printer = print_progress(quiz.progress());
    let _ = quiz.upload(Some(file)).await;
    printer.abort();
    show_notice(quiz);
    Ok(true)
}

async fn configure(
    services: &AppServices,
    quiz: &mut QuizSessionController,
    prompt: &mut Prompt,
) -> Result<bool, Box<dyn std::error::Error>> {
    header(quiz, "configure");
    if let Some(file) = quiz.file() {
        println!("Document: {}", shown(services, file));
    }
    println!(
        "Questions: {}   Difficulty: {}",
        quiz.config().question_count,
        quiz.config().difficulty
    );

    if quiz.topic().trim().is_empty() {
        let Some(topic) = prompt.ask("Topic (empty to pick another document):").await? else {
            return Ok(false);
        };
        if topic.is_empty() {
            quiz.new_file().await;
            return Ok(true);
        }
        quiz.set_topic(topic);
    }

    if !services.usage().quiz_fits(quiz.config().question_count).await {
        println!("! This quiz would go over today's question allowance.");
    }
    println!("Generating a quiz on \"{}\"...", quiz.topic());
    if quiz.generate().await.is_err() {
        show_notice(quiz);
        quiz.set_topic("");
    }
    Ok(true)
}

async fn take_quiz(
    quiz: &mut QuizSessionController,
    prompt: &mut Prompt,
) -> Result<bool, Box<dyn std::error::Error>> {
    header(quiz, "quiz");
    let questions: Vec<(QuestionId, String, Vec<String>)> = quiz
        .questions()
        .iter()
        .map(|q| (q.id, q.text.clone(), q.options.clone()))
        .collect();
    let total = questions.len();

    for (number, (id, text, options)) in questions.into_iter().enumerate() {
        println!();
        println!("Q{}/{total}. {text}", number + 1);
        for (letter, option) in OPTION_LETTERS.iter().zip(&options) {
            println!("   {letter}) {option}");
        }
        let Some(answer) = prompt.ask("Your answer (empty to skip):").await? else {
            return Ok(false);
        };
        if let Some(option) = pick_option(&answer, &options) {
            quiz.select_option(id, option);
        }
    }

    let pending = quiz.submit();
    if let Some(outcome) = quiz.outcome() {
        println!();
        let verdict = if outcome.is_passing() { "passed" } else { "keep practicing" };
        println!(
            "Score: {}/{} ({}%), {verdict}",
            outcome.score,
            outcome.total,
            outcome.percent()
        );
        for mistake in &outcome.mistakes {
            println!("  x {}", mistake.question);
            println!("    you: {}   correct: {}", mistake.user_answer, mistake.correct_answer);
            if let Some(explanation) = &mistake.explanation {
                println!("    {explanation}");
            }
        }
    }
    if let Some(pending) = pending {
        if !pending.saved().await {
            println!("(result could not be saved; it will not appear in your history)");
        }
    }
    Ok(true)
}

fn pick_option(answer: &str, options: &[String]) -> Option<String> {
    let mut chars = answer.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() {
        return options.iter().find(|option| option.eq_ignore_ascii_case(answer)).cloned();
    }
    let index = OPTION_LETTERS.iter().position(|l| *l == letter)?;
    options.get(index).cloned()
}

async fn after_results(
    quiz: &mut QuizSessionController,
    prompt: &mut Prompt,
) -> Result<bool, Box<dyn std::error::Error>> {
    header(quiz, "results");
    let Some(choice) = prompt
        .ask("[t] new topic, [f] new file, anything else to quit:")
        .await?
    else {
        return Ok(false);
    };
    match choice.to_ascii_lowercase().as_str() {
        "t" => {
            quiz.new_topic();
            quiz.set_topic("");
            Ok(true)
        }
        "f" => {
            quiz.new_file().await;
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_picked_by_letter_or_text() {
        let options = vec!["Mitosis".to_string(), "Meiosis".to_string()];
        assert_eq!(pick_option("b", &options).as_deref(), Some("Meiosis"));
        assert_eq!(pick_option("mitosis", &options).as_deref(), Some("Mitosis"));
        assert_eq!(pick_option("c", &options), None);
        assert_eq!(pick_option("", &options), None);
    }
}
