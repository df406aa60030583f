//! CLI command implementations

use crate::output::{print_snapshot, OutputFormat};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tvdeck_core::{
    load_catalog_or_mock, CatalogEntry, Deck, DeckConfig, DirectoryCatalog, KeyEvent,
    MockCatalog, RemoteInput, RemoteKey, SimOptions, SimulatedFactory,
};

/// Configuration from file (or defaults), then `TVDECK_BACKEND`, then
/// command line overrides
pub fn load_config(
    path: Option<&Path>,
    backend: Option<&str>,
    media_dir: Option<PathBuf>,
) -> anyhow::Result<DeckConfig> {
    let mut config = DeckConfig::load(path).with_context(|| match path {
        Some(path) => format!("loading {}", path.display()),
        None => "loading default configuration".to_string(),
    })?;

    config.apply_backend_override(backend)?;
    if media_dir.is_some() {
        config.media_dir = media_dir;
    }
    config.validate()?;

    Ok(config)
}

async fn build_deck(config: DeckConfig) -> anyhow::Result<Deck> {
    let entries: Vec<CatalogEntry> = match &config.media_dir {
        Some(dir) => load_catalog_or_mock(&DirectoryCatalog::new(dir)).await,
        None => MockCatalog::entries(),
    };

    let factory = SimulatedFactory::with_options(SimOptions {
        streaming: config.streaming,
        ..Default::default()
    });

    let mut deck = Deck::new(config, Box::new(factory))?;
    deck.load_catalog(entries);
    Ok(deck)
}

/// One step of a key script
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Press(RemoteKey),
    Down(RemoteKey),
    Up(RemoteKey),
    /// Key down, hold for a while, key up
    Hold(RemoteKey, Duration),
    Wait(Duration),
    /// Application hidden or shown
    Visibility(bool),
    State,
}

fn parse_key(word: Option<&str>) -> anyhow::Result<RemoteKey> {
    let word = word.context("missing key name")?;
    Ok(RemoteKey::from_str(word)?)
}

fn parse_ms(word: Option<&str>) -> anyhow::Result<Duration> {
    let word = word.context("missing duration in milliseconds")?;
    let ms: u64 = word
        .parse()
        .with_context(|| format!("invalid duration: {}", word))?;
    Ok(Duration::from_millis(ms))
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let mut words = s.split_whitespace();
        let first = words.next().context("empty step")?;

        let step = match first.to_lowercase().as_str() {
            "down" if words.clone().next().is_some() => Step::Down(parse_key(words.next())?),
            "up" if words.clone().next().is_some() => Step::Up(parse_key(words.next())?),
            "hold" => {
                let key = parse_key(words.next())?;
                Step::Hold(key, parse_ms(words.next())?)
            }
            "wait" => Step::Wait(parse_ms(words.next())?),
            "hide" => Step::Visibility(true),
            "show" => Step::Visibility(false),
            "state" => Step::State,
            key => Step::Press(RemoteKey::from_str(key)?),
        };

        if let Some(extra) = words.next() {
            anyhow::bail!("unexpected '{}' in step '{}'", extra, s);
        }
        Ok(step)
    }
}

/// Split a script into steps. Commas and newlines separate steps; `#`
/// starts a comment.
pub fn parse_script(source: &str) -> anyhow::Result<Vec<Step>> {
    source
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .map(|step| step.parse::<Step>().with_context(|| format!("in step '{}'", step)))
        .collect()
}

fn apply(deck: &mut Deck, step: &Step, format: OutputFormat) {
    match step {
        Step::Press(key) => deck.press(*key),
        Step::Down(key) => deck.key_down(*key),
        Step::Up(key) => deck.key_up(*key),
        Step::Hold(key, duration) => {
            deck.key_down(*key);
            deck.advance(*duration);
            deck.key_up(*key);
        }
        Step::Wait(duration) => deck.advance(*duration),
        Step::Visibility(hidden) => deck.set_app_hidden(*hidden),
        Step::State => print_snapshot(deck, format),
    }
}

/// Replay a key script on the virtual clock
pub async fn run_script(
    config: DeckConfig,
    source: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let steps = parse_script(source)?;
    let mut deck = build_deck(config).await?;
    info!(steps = steps.len(), "Running script");

    for step in &steps {
        apply(&mut deck, step, format);
    }

    if steps.last() != Some(&Step::State) {
        print_snapshot(&deck, format);
    }
    Ok(())
}

/// Map one stdin line to deck input. `None` for lines to skip.
fn read_input(line: &str) -> Option<Vec<RemoteInput>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if matches!(line, "quit" | "exit" | "q") {
        return Some(vec![RemoteInput::Shutdown]);
    }

    match line.parse::<Step>() {
        Ok(Step::Press(key)) => Some(vec![
            RemoteInput::Key(KeyEvent::down(key)),
            RemoteInput::Key(KeyEvent::up(key)),
        ]),
        Ok(Step::Down(key)) => Some(vec![RemoteInput::Key(KeyEvent::down(key))]),
        Ok(Step::Up(key)) => Some(vec![RemoteInput::Key(KeyEvent::up(key))]),
        Ok(Step::Visibility(hidden)) => Some(vec![RemoteInput::Visibility { hidden }]),
        Ok(other) => {
            warn!(step = ?other, "Not available interactively");
            None
        }
        Err(e) => {
            warn!(error = %e, "Unreadable input");
            None
        }
    }
}

/// Read keys from stdin and drive the deck in real time
pub async fn interactive(
    config: DeckConfig,
    frame_ms: u64,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut deck = build_deck(config).await?;
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            for input in read_input(&line).unwrap_or_default() {
                let done = input == RemoteInput::Shutdown;
                if tx.send(input).await.is_err() || done {
                    return;
                }
            }
        }
    });

    eprintln!("Keys: left right up down enter back ff rw | down <key> | up <key> | hide | show | quit");
    tvdeck_core::drive(&mut deck, rx, Duration::from_millis(frame_ms.max(1))).await;

    print_snapshot(&deck, format);
    Ok(())
}
