//! Say command handler: one full narration from the terminal.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use vaani::{
    Language, Narrator, NarratorConfig, NarratorEvent, NarratorState, SpeechChannel,
    default_cache_dir,
};

/// Arguments for the say command.
pub struct SayArgs {
    pub text: String,
    pub language: Language,
    pub endpoint: Option<String>,
    pub budget_ms: Option<u64>,
    pub no_cache: bool,
    pub cache_dir: Option<PathBuf>,
    pub model_dir: Option<PathBuf>,
}

/// Bound on one narration end to end: remote attempt, fallback synthesis,
/// and playback of a long label.
const NARRATION_DEADLINE: Duration = Duration::from_secs(120);

/// Execute the say command.
///
/// Builds a narrator the way an embedding application would, speaks once,
/// and follows the event stream until the narrator returns to idle.
pub async fn execute(args: SayArgs) -> Result<()> {
    if args.text.trim().is_empty() {
        bail!("nothing to say: text is empty");
    }

    let mut config = NarratorConfig::default();
    if let Some(endpoint) = args.endpoint {
        config.remote.endpoint = endpoint;
    }
    if let Some(ms) = args.budget_ms {
        config.remote.latency_budget = Duration::from_millis(ms);
    }
    // Caching is on by default for the CLI; --no-cache turns it off.
    config.cache_dir = if args.no_cache {
        None
    } else {
        args.cache_dir.or_else(default_cache_dir)
    };
    config.local.model_dir = args.model_dir;

    tracing::debug!(
        endpoint = %config.remote.endpoint,
        budget_ms = config.remote.latency_budget.as_millis(),
        "narrating from the command line"
    );

    let (narrator, mut events) = Narrator::with_defaults(config)?;
    narrator.speak(&args.text, args.language);

    let mut spoke_via: Option<SpeechChannel> = None;
    loop {
        let event = tokio::time::timeout(NARRATION_DEADLINE, events.recv())
            .await
            .map_err(|_| anyhow::anyhow!("narration did not finish within {NARRATION_DEADLINE:?}"))?
            .ok_or_else(|| anyhow::anyhow!("narrator event channel closed"))?;

        match event {
            NarratorEvent::NarrationStarted { channel } => {
                spoke_via = Some(channel);
                match channel {
                    SpeechChannel::Remote => println!("Speaking (remote service)..."),
                    SpeechChannel::Local => println!("Speaking (on-device voice)..."),
                }
            }
            NarratorEvent::NarrationFinished => println!("Done."),
            NarratorEvent::StateChanged(NarratorState::Idle) => break,
            NarratorEvent::StateChanged(_) => {}
        }
    }

    if spoke_via.is_none() {
        bail!("no speech channel could narrate; rerun with --verbose for details");
    }
    Ok(())
}
