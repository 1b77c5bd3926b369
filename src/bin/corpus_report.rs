use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use play_similarity::config::SimilarityConfig;
use play_similarity::extract::build_corpus;
use play_similarity::partition::MIN_ALIGN_LEN;
use play_similarity::positions_file::load_sequence_positions_file;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let files: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if files.is_empty() {
        return Err(anyhow!("usage: corpus_report <positions.json>..."));
    }
    let cfg = SimilarityConfig::from_env();

    let mut raws = Vec::new();
    for path in &files {
        let rows = load_sequence_positions_file(path, None, cfg.frame_rate_hz)?;
        println!("{}: {} sequences", path.display(), rows.len());
        raws.extend(rows);
    }
    let corpus = build_corpus(raws, &cfg);

    let mut by_len: BTreeMap<usize, usize> = BTreeMap::new();
    let mut flipped = 0usize;
    let mut too_short = 0usize;
    for play in corpus.plays() {
        *by_len.entry(play.trajectory.len()).or_insert(0) += 1;
        if play.direction_normalized {
            flipped += 1;
        }
        if play.trajectory.len() < MIN_ALIGN_LEN {
            too_short += 1;
        }
    }

    println!();
    println!("Plays: {}", corpus.len());
    println!("Mirrored to attack +x: {flipped}");
    println!("Too short to align (<{MIN_ALIGN_LEN} positions): {too_short}");
    println!("Trajectory lengths:");
    for (len, count) in &by_len {
        println!("  {len:>4} positions: {count}");
    }
    if !corpus.excluded().is_empty() {
        println!("Excluded: {}", corpus.excluded().len());
        for ex in corpus.excluded().iter().take(20) {
            println!(" - {}: {}", ex.id, ex.reason);
        }
    }

    Ok(())
}
