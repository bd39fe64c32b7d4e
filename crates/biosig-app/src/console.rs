use std::io::{BufRead, Write};

use async_trait::async_trait;
use biosig_auth::{AuthenticationError, BiometricAuthenticator};
use biosig_core::{AuthErrorCode, Availability, PromptInfo};
use biosig_crypto::{AuthenticatedSession, CryptoBinding};

/// Terminal stand-in for the platform prompt: the user confirms on stdin.
pub struct ConsoleAuthenticator;

#[async_trait]
impl BiometricAuthenticator for ConsoleAuthenticator {
    fn can_authenticate(&self) -> Availability {
        Availability::Available
    }

    async fn authenticate(
        &self,
        prompt: &PromptInfo,
        binding: CryptoBinding,
    ) -> Result<AuthenticatedSession, AuthenticationError> {
        let text = render(prompt);
        let answer = tokio::task::spawn_blocking(move || ask(&text))
            .await
            .map_err(|e| AuthenticationError::new(AuthErrorCode::UnableToProcess, e.to_string()))?;

        match answer {
            Some(line) if matches!(line.trim(), "y" | "yes") => Ok(binding.authorize()),
            Some(_) => Err(AuthenticationError::new(
                AuthErrorCode::NegativeButton,
                prompt.negative_button.clone(),
            )),
            None => Err(AuthenticationError::new(AuthErrorCode::Canceled, "Prompt closed")),
        }
    }
}

fn render(prompt: &PromptInfo) -> String {
    let mut text = format!("== {} ==\n", prompt.title);
    for line in [&prompt.subtitle, &prompt.description] {
        if !line.is_empty() {
            text.push_str(line);
            text.push('\n');
        }
    }
    text.push_str(&format!(
        "Confirm with [y], anything else for {}: ",
        prompt.negative_button
    ));
    text
}

/// `None` when stdin is closed.
fn ask(text: &str) -> Option<String> {
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(text.as_bytes());
    let _ = stderr.flush();

    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_skips_empty_lines() {
        let prompt = PromptInfo {
            title: "BIOMETRIC".into(),
            subtitle: String::new(),
            description: "Sign the order".into(),
            negative_button: "CANCEL".into(),
            invalidated_by_enrollment: true,
        };
        let text = render(&prompt);
        assert!(text.starts_with("== BIOMETRIC ==\nSign the order\n"));
        assert!(text.ends_with("for CANCEL: "));
    }
}
