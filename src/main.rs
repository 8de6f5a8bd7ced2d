use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use herald_gateway::api::ApiServer;
use herald_gateway::voice::{
    pcm_f32le_to_samples, AudioCapture, AudioPlayback, PlaybackHandle, Synthesizer,
};
use herald_gateway::{Config, SessionController};

/// Herald - voice assistant gateway that advocates for a candidate
#[derive(Parser)]
#[command(name = "herald", version, about)]
struct Cli {
    /// Path to config file (defaults to ~/.config/herald/config.toml)
    #[arg(short, long, env = "HERALD_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the gateway server
    Serve {
        /// Port to listen on
        #[arg(long, env = "HERALD_PORT")]
        port: Option<u16>,
    },
    /// Run the interactive voice session against a server
    Talk {
        /// Server URL (e.g. <http://127.0.0.1:18790>)
        #[arg(long, env = "HERALD_SERVER_URL")]
        server: Option<String>,
    },
    /// Submit a single text turn and print the reply
    Ask {
        /// Text of the question
        text: String,
    },
    /// Synthesize text with the configured voice and play it
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,herald_gateway=info",
        1 => "info,herald_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            tracing::info!(
                port = config.server.port,
                model = %config.llm.model,
                candidate = %config.advocate.candidate,
                "starting herald gateway"
            );
            ApiServer::from_config(&config)?.run().await?;
        }
        Command::Talk { server } => {
            if let Some(server) = server {
                config.server.url = server;
            }
            tracing::info!(server = %config.server.url, "starting voice session");
            SessionController::new(&config).run().await?;
        }
        Command::Ask { text } => {
            let reply = SessionController::new(&config).ask(&text).await?;
            println!("{reply}");
        }
        Command::Say { text } => say(&config, &text).await?,
        Command::TestMic { duration } => test_mic(duration).await?,
        Command::TestSpeaker => test_speaker().await?,
    }

    Ok(())
}

/// Synthesize text via the configured TTS voice and play it locally
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    let api_key = config
        .api_keys
        .cartesia
        .clone()
        .ok_or_else(|| anyhow::anyhow!("CARTESIA_API_KEY is required for say"))?;

    let synthesizer = Synthesizer::new(
        api_key,
        config.voice.tts_model.clone(),
        config.voice.tts_voice.clone(),
        config.voice.tts_sample_rate,
    )?
    .with_base_url(config.upstream.cartesia_url.clone());

    println!("Synthesizing: \"{text}\"");
    let audio = synthesizer.synthesize(text).await?.collect().await?;
    println!("Got {} bytes of audio", audio.len());

    let samples = pcm_f32le_to_samples(&audio);
    let playback = AudioPlayback::new(config.voice.tts_sample_rate)?;
    let handle = PlaybackHandle::new();
    tokio::task::spawn_blocking(move || playback.play(samples, &handle)).await??;

    Ok(())
}

/// Test microphone input with a live level meter
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working.");

    Ok(())
}

/// Test speaker output with a short sine tone
async fn test_speaker() -> anyhow::Result<()> {
    const SAMPLE_RATE: u32 = 24000;

    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new(SAMPLE_RATE)?;

    let num_samples = (SAMPLE_RATE * 2) as usize;
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    let handle = PlaybackHandle::new();
    tokio::task::spawn_blocking(move || playback.play(samples, &handle)).await??;

    println!("If you heard the tone, your speakers are working.");

    Ok(())
}

/// RMS energy of captured samples
#[allow(clippy::cast_precision_loss)]
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
