//! Terminal front-end
//!
//! Reads queries from an interactive prompt, prints answers, and exposes the
//! voice, history, topic, and download actions as `:` commands.

use std::path::PathBuf;
use std::sync::Arc;

use dialoguer::Input;

use crate::completion::{Completion, CompletionClient};
use crate::history::HistoryStore;
use crate::recommend::Recommendations;
use crate::session::Session;
use crate::voice::{Listener, Recognition, RemoteSpeechEngine, SpeechController};
use crate::{Config, Error};

const PROMPT: &str = "Search what you want to know";

const HELP: &str = "\
Type a question and press enter. Commands:
  :voice            ask by speaking
  :speak            read the last answer aloud
  :stop             stop speaking
  :history          show past queries
  :clear            clear history
  :topics           suggested topics
  :download [dir]   save the last answer to findora_response.txt
  :help             show this help
  :quit             exit";

/// A parsed line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Voice,
    Speak,
    Stop,
    History,
    Clear,
    Topics,
    Download(Option<PathBuf>),
    Help,
    Quit,
    Unknown(String),
}

/// Parse one line of input
#[must_use]
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Ask(line.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    match name.as_str() {
        "voice" | "v" => Command::Voice,
        "speak" | "s" => Command::Speak,
        "stop" => Command::Stop,
        "history" | "h" => Command::History,
        "clear" => Command::Clear,
        "topics" | "t" => Command::Topics,
        "download" | "d" => Command::Download(arg.map(PathBuf::from)),
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Render topic suggestions for display
#[must_use]
pub fn format_recommendations(recs: &Recommendations) -> String {
    match recs {
        Recommendations::NoHistory => "Ask something first to get topic suggestions.".to_string(),
        Recommendations::Topics(topics) if topics.is_empty() => {
            "No matching topics yet.".to_string()
        }
        Recommendations::Topics(topics) => format!("Recommended topics: {}", topics.join(", ")),
    }
}

/// Interactive front-end over a [`Session`]
pub struct Repl {
    session: Session,
    speaker: Option<SpeechController<RemoteSpeechEngine>>,
    listener: Option<Listener>,
    download_dir: PathBuf,
}

impl Repl {
    /// Wire up the session and, when enabled, the voice engines
    ///
    /// The speaker is only opened when `speech_output` is set. A speaker that
    /// cannot start leaves the front-end running without spoken answers.
    #[must_use]
    pub fn from_config(config: &Config, speech_output: bool) -> Self {
        let completion = Arc::new(CompletionClient::from_config(config));
        tracing::debug!(model = completion.model(), "completion client ready");

        Self::assemble(config, completion, speech_output, RemoteSpeechEngine::new)
    }

    /// Build the front-end over any completion backend and speech engine constructor
    pub fn assemble<F>(
        config: &Config,
        completion: Arc<dyn Completion>,
        speech_output: bool,
        build_engine: F,
    ) -> Self
    where
        F: FnOnce(&Config) -> crate::Result<RemoteSpeechEngine>,
    {
        let session = Session::open(completion, HistoryStore::new(&config.history_path));

        let speaker = if config.voice.enabled && speech_output {
            match build_engine(config) {
                Ok(engine) => Some(SpeechController::new(engine)),
                Err(e) => {
                    tracing::error!(error = %e, "speech output unavailable");
                    println!("Warning: spoken answers are unavailable ({e}). Continuing without them.");
                    None
                }
            }
        } else {
            None
        };

        let listener = config.voice.enabled.then(|| Listener::from_config(config));

        Self {
            session,
            speaker,
            listener,
            download_dir: config.download_dir.clone(),
        }
    }

    /// Run the prompt loop until `:quit` or end of input
    ///
    /// # Errors
    ///
    /// Returns error if the terminal cannot be read
    #[allow(clippy::future_not_send)]
    pub async fn run(mut self) -> anyhow::Result<()> {
        println!("FINDORA\n");
        println!("{HELP}\n");

        loop {
            let line = match read_line().await {
                Ok(line) => line,
                Err(e) => {
                    tracing::debug!(error = %e, "input closed");
                    break;
                }
            };

            match parse_command(&line) {
                Command::Ask(query) => {
                    if !query.is_empty() || self.session.pending_voice().is_some() {
                        self.ask(&query).await;
                    }
                }
                Command::Voice => {
                    self.listen_and_ask().await;
                }
                Command::Speak => self.speak_last().await,
                Command::Stop => {
                    if let Some(speaker) = &self.speaker {
                        speaker.stop();
                    }
                }
                Command::History => self.print_history(),
                Command::Clear => match self.session.clear_history() {
                    Ok(()) => println!("History cleared."),
                    Err(e) => println!("History cleared for this session, but saving failed: {e}"),
                },
                Command::Topics => self.print_topics(),
                Command::Download(dir) => self.download(dir),
                Command::Help => println!("{HELP}"),
                Command::Quit => break,
                Command::Unknown(cmd) => println!("Unknown command {cmd}, try :help"),
            }
        }

        if let Some(speaker) = &self.speaker {
            speaker.stop();
        }
        Ok(())
    }

    /// Ask a question and print the answer or the error
    pub async fn ask(&mut self, query: &str) -> bool {
        match self.session.ask(query).await {
            Ok(answer) => {
                println!("\n{}\n", answer.response);
                if let Some(e) = answer.history_error {
                    println!("(could not save history: {e})");
                }
                true
            }
            Err(Error::EmptyQuery) => false,
            Err(e) => {
                println!("Error: {e}");
                false
            }
        }
    }

    /// Listen for a spoken query, then ask it
    #[allow(clippy::future_not_send)]
    pub async fn listen_and_ask(&mut self) -> bool {
        let Some(listener) = &self.listener else {
            println!("Voice is disabled.");
            return false;
        };

        println!("Listening... speak now.");
        match listener.listen().await {
            Ok(Recognition::Text(text)) => {
                println!("You said: {text}");
                self.session.set_voice_query(text);
                self.ask("").await
            }
            Ok(Recognition::NotUnderstood) => {
                println!("Sorry, could not understand audio.");
                false
            }
            Ok(Recognition::ServiceError(e)) => {
                println!("Speech service error: {e}");
                false
            }
            Err(e) => {
                println!("Microphone error: {e}");
                false
            }
        }
    }

    /// Read the last answer aloud in the background
    pub async fn speak_last(&self) {
        let Some(speaker) = &self.speaker else {
            println!("Voice is disabled.");
            return;
        };
        match self.session.last_response() {
            Some(response) => speaker.speak(response).await,
            None => println!("Nothing to read yet."),
        }
    }

    /// Block until the current utterance finishes
    pub async fn wait_for_speech(&self) {
        if let Some(speaker) = &self.speaker {
            speaker.wait().await;
        }
    }

    /// Print past queries
    pub fn print_history(&self) {
        let history = self.session.history();
        if history.is_empty() {
            println!("No history yet.");
            return;
        }
        for (i, entry) in history.iter().enumerate() {
            println!("{}. {}", i + 1, entry.query);
        }
    }

    /// Print topic suggestions
    pub fn print_topics(&self) {
        println!("{}", format_recommendations(&self.session.recommendations()));
    }

    fn download(&self, dir: Option<PathBuf>) {
        let dir = dir.unwrap_or_else(|| self.download_dir.clone());
        match self.session.download_response(&dir) {
            Ok(path) => println!("Saved {}", path.display()),
            Err(e) => println!("Download failed: {e}"),
        }
    }
}

/// Read one line from the terminal without blocking the runtime
async fn read_line() -> anyhow::Result<String> {
    let line = tokio::task::spawn_blocking(|| {
        Input::<String>::new()
            .with_prompt(PROMPT)
            .allow_empty(true)
            .interact_text()
    })
    .await??;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_query() {
        assert_eq!(
            parse_command("  What is Rust?  "),
            Command::Ask("What is Rust?".to_string())
        );
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(parse_command(":VOICE"), Command::Voice);
        assert_eq!(parse_command(":q"), Command::Quit);
        assert_eq!(parse_command(":Topics"), Command::Topics);
    }

    #[test]
    fn download_takes_optional_dir() {
        assert_eq!(parse_command(":download"), Command::Download(None));
        assert_eq!(
            parse_command(":download /tmp/out"),
            Command::Download(Some(PathBuf::from("/tmp/out")))
        );
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(
            parse_command(":frobnicate"),
            Command::Unknown(":frobnicate".to_string())
        );
    }

    struct CannedCompletion;

    #[async_trait::async_trait]
    impl Completion for CannedCompletion {
        async fn complete(&self, _question: &str) -> crate::Result<String> {
            Ok("Rust is a systems language.".to_string())
        }
    }

    fn test_config(dir: &tempfile::TempDir) -> Config {
        let mut file = crate::config::file::FindoraConfigFile::default();
        file.api_key = Some("gsk-test".to_string());
        file.storage.history_path = Some(dir.path().join("history.json").display().to_string());
        file.storage.download_dir = Some(dir.path().display().to_string());
        Config::from_sources(&file, |_| None, false).unwrap()
    }

    #[tokio::test]
    async fn speaker_failure_keeps_text_queries_working() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        assert!(config.voice.enabled);

        let mut repl = Repl::assemble(&config, Arc::new(CannedCompletion), true, |_| {
            Err(Error::Audio("no output device available".to_string()))
        });

        assert!(repl.speaker.is_none());
        assert!(repl.ask("What is Rust?").await);
        assert_eq!(
            repl.session.last_response(),
            Some("Rust is a systems language.")
        );

        // Speaking degrades to a message instead of failing
        repl.speak_last().await;
        repl.wait_for_speech().await;
    }

    #[tokio::test]
    async fn speaker_is_not_opened_without_speech_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);

        let repl = Repl::assemble(&config, Arc::new(CannedCompletion), false, |_| {
            panic!("speech engine should not be built")
        });

        assert!(repl.speaker.is_none());
        assert!(repl.listener.is_some());
    }

    #[test]
    fn recommendations_render_distinct_empty_states() {
        let none = format_recommendations(&Recommendations::NoHistory);
        let empty = format_recommendations(&Recommendations::Topics(vec![]));
        assert_ne!(none, empty);
        assert_eq!(
            format_recommendations(&Recommendations::Topics(vec!["Python", "AI"])),
            "Recommended topics: Python, AI"
        );
    }
}
