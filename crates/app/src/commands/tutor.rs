use std::path::Path;

use backend::ChatImage;
use services::{AppServices, TutorError};
use studymate_core::model::{DocumentName, Role};

use super::{CommandResult, shown};
use crate::console::Prompt;

fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Chat with the tutor about one document. `/image <path>` attaches a
/// picture to the next question; `/quit` leaves.
pub async fn tutor(services: &AppServices, file: &DocumentName) -> CommandResult {
    let tutor = services.tutor();
    println!("Tutor for {}", shown(services, file));
    for turn in tutor.history(file).await? {
        let who = match turn.role {
            Role::User => "you",
            Role::Assistant => "tutor",
        };
        println!("{who}: {}", turn.content);
    }

    let mut prompt = Prompt::new();
    let mut image: Option<ChatImage> = None;
    loop {
        let Some(line) = prompt.ask("you:").await? else {
            return Ok(());
        };
        if line == "/quit" {
            return Ok(());
        }
        if let Some(path) = line.strip_prefix("/image ") {
            let path = Path::new(path.trim());
            match tokio::fs::read(path).await {
                Ok(bytes) => {
                    image = Some(ChatImage {
                        mime_type: image_mime(path).to_string(),
                        bytes,
                    });
                    println!("(image attached to your next question)");
                }
                Err(err) => println!("! {err}"),
            }
            continue;
        }

        match tutor.ask(file, &line, image.take()).await {
            Ok(reply) => println!("tutor: {reply}"),
            Err(TutorError::EmptyMessage) => {}
            Err(err) => println!("! {}", err.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(image_mime(Path::new("a/diagram.PNG")), "image/png");
        assert_eq!(image_mime(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(image_mime(Path::new("notes")), "application/octet-stream");
    }
}
