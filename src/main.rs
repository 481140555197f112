use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use findora::repl::{Repl, format_recommendations};
use findora::voice::{
    AudioCapture, AudioPlayback, RemoteSpeechEngine, SPEECH_ENERGY_THRESHOLD, SpeechController,
    SpeechEngine, rms_energy,
};
use findora::{Config, HistoryStore, recommend};

/// Findora - ask questions by typing or speaking, hear the answers
#[derive(Parser)]
#[command(name = "findora", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for machines without audio hardware)
    #[arg(long, env = "FINDORA_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a single question
    Ask {
        /// Question text
        #[arg(required = true)]
        query: Vec<String>,
        /// Read the answer aloud
        #[arg(short, long)]
        speak: bool,
    },
    /// Ask a single question by voice
    Listen {
        /// Read the answer aloud
        #[arg(short, long)]
        speak: bool,
    },
    /// Show past queries
    History,
    /// Delete all past queries
    ClearHistory,
    /// Suggest topics from past queries
    Topics,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system. It speaks one sentence at a time.")]
        text: String,
    },
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,findora=info",
        1 => "info,findora=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Command::TestMic { duration }) => return test_mic(duration).await,
        Some(Command::TestSpeaker) => return test_speaker().await,
        Some(Command::Setup) => return findora::setup::run_setup(),
        _ => {}
    }

    // Everything past this point needs the API key
    let config = Config::load(cli.disable_voice)?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        None => Repl::from_config(&config, true).run().await,
        Some(Command::Ask { query, speak }) => {
            let mut repl = Repl::from_config(&config, speak);
            if repl.ask(&query.join(" ")).await && speak {
                repl.speak_last().await;
                repl.wait_for_speech().await;
            }
            Ok(())
        }
        Some(Command::Listen { speak }) => {
            let mut repl = Repl::from_config(&config, speak);
            if repl.listen_and_ask().await && speak {
                repl.speak_last().await;
                repl.wait_for_speech().await;
            }
            Ok(())
        }
        Some(Command::History) => {
            let history = HistoryStore::new(&config.history_path).load();
            if history.is_empty() {
                println!("No history yet.");
            }
            for (i, entry) in history.iter().enumerate() {
                println!("{}. {}\n   {}\n", i + 1, entry.query, entry.response);
            }
            Ok(())
        }
        Some(Command::ClearHistory) => {
            HistoryStore::new(&config.history_path).clear()?;
            println!("History cleared.");
            Ok(())
        }
        Some(Command::Topics) => {
            let history = HistoryStore::new(&config.history_path).load();
            println!("{}", format_recommendations(&recommend(&history)));
            Ok(())
        }
        Some(Command::TestTts { text }) => test_tts(&config, &text).await,
        Some(Command::TestMic { .. } | Command::TestSpeaker | Command::Setup) => Ok(()),
    }
}

/// Check the microphone against the phrase detector's speech gate
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Listening on the default microphone for {duration} seconds.");
    println!("Talk, then stay quiet, and watch the gate open and close.\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;
    println!(
        "Capturing at {} Hz, speech gate at RMS {SPEECH_ENERGY_THRESHOLD}\n",
        capture.sample_rate()
    );

    let mut heard = 0_u64;
    for second in 1..=duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let energy = rms_energy(&capture.take_buffer());
        let speech = energy > SPEECH_ENERGY_THRESHOLD;
        heard += u64::from(speech);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bar = "|".repeat((energy * 200.0).min(40.0) as usize);
        println!(
            "{second:>3}s  {energy:.4}  {:<6}  {bar}",
            if speech { "speech" } else { "quiet" }
        );
    }

    capture.stop();

    if heard == 0 {
        println!("\nNo second crossed the speech gate. Check the default input device");
        println!("(pactl info | grep 'Default Source', or arecord -l).");
    } else {
        println!("\nSpeech heard in {heard} of {duration} seconds; voice queries should work.");
    }

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let sample_rate = 24000_u32;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (sample_rate as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

    let halt = std::sync::atomic::AtomicBool::new(false);
    tokio::task::block_in_place(|| playback.play_blocking(&samples, sample_rate, &halt))?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");

    Ok(())
}

/// Test TTS output sentence by sentence
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let engine = RemoteSpeechEngine::new(config)?;

    println!("Speaking the first sentence directly...");
    if let Some(first) = findora::voice::split_segments(text).first() {
        engine.say(first).await?;
    }

    println!("Speaking the whole text through the controller...");
    let speaker = SpeechController::new(engine);
    speaker.speak(text).await;
    speaker.wait().await;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
