//! Output formatting for CLI

use clap::ValueEnum;
use console::style;
use tabled::{settings::Style, Table, Tabled};
use tvdeck_core::{Deck, DeckSnapshot, InputContext, RemoteKey};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print the deck state to stdout
pub fn print_snapshot(deck: &Deck, format: OutputFormat) {
    let snapshot = deck.snapshot();
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!(error = %e, "Failed to serialize snapshot"),
        },
        OutputFormat::Text => {
            let title = snapshot
                .playing_index
                .and_then(|index| deck.sequencer().entries().get(index))
                .map(|entry| entry.display_name.as_str());
            print!("{}", render_text(&snapshot, title));
        }
    }
}

fn context_label(context: InputContext) -> String {
    match context {
        InputContext::Browsing => "browsing".to_string(),
        InputContext::Player(area) => format!("player ({:?})", area).to_lowercase(),
    }
}

fn render_text(snapshot: &DeckSnapshot, title: Option<&str>) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {} ms\n",
        style("Time:").bold(),
        snapshot.now_ms
    ));
    out.push_str(&format!(
        "{} {}\n",
        style("Context:").bold(),
        context_label(snapshot.context)
    ));
    out.push_str(&format!(
        "{} {}\n",
        style("Focus:").bold(),
        snapshot
            .focus
            .map(|target| target.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    out.push_str(&format!(
        "{} {:.0}\n",
        style("Scroll:").bold(),
        snapshot.scroll_offset
    ));

    match (snapshot.playing_index, snapshot.player_state) {
        (Some(index), Some(state)) => {
            out.push_str(&format!(
                "{} #{} {} [{}] at {}x\n",
                style("Playing:").bold(),
                index,
                style(title.unwrap_or("?")).cyan(),
                style(format!("{:?}", state).to_lowercase()).green(),
                snapshot.speed.unwrap_or(1.0)
            ));
        }
        (None, Some(state)) => {
            out.push_str(&format!(
                "{} {}\n",
                style("Player:").bold(),
                style(format!("{:?}", state).to_lowercase()).yellow()
            ));
        }
        _ => out.push_str(&format!("{} {}\n", style("Playing:").bold(), style("nothing").dim())),
    }

    let overlay = &snapshot.overlay;
    if overlay.visible {
        out.push_str(&format!(
            "{} {}  {} / {}  ({:.1}%)  speed {}\n",
            style("Overlay:").bold(),
            overlay.title,
            overlay.elapsed_label,
            overlay.duration_label,
            overlay.progress_percent,
            overlay.speed_label
        ));
    } else {
        out.push_str(&format!("{} {}\n", style("Overlay:").bold(), style("hidden").dim()));
    }

    out
}

#[derive(Tabled)]
struct KeyRow {
    #[tabled(rename = "Key")]
    name: String,
    #[tabled(rename = "Code")]
    code: u32,
}

/// Table of the remote keys the deck understands
pub fn key_table() -> String {
    let rows: Vec<KeyRow> = RemoteKey::ALL
        .iter()
        .map(|key| KeyRow {
            name: key.to_string(),
            code: key.code(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_table_lists_every_key() {
        let table = key_table();
        for key in RemoteKey::ALL {
            assert!(table.contains(&key.to_string()));
            assert!(table.contains(&key.code().to_string()));
        }
    }

    #[test]
    fn test_context_label() {
        assert_eq!(context_label(InputContext::Browsing), "browsing");
    }
}
