use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use play_similarity::config::{self, SimilarityConfig};
use play_similarity::extract::build_corpus;
use play_similarity::positions_file::load_sequence_positions_file;
use play_similarity::similarity::{compute_top_similar, compute_top_similar_for_match};
use play_similarity::{Corpus, PlayId, SimilarityResult};

const USAGE: &str = "usage: play_similarity (--target <match_seq> | --match <match_id>) [--top-n N] <positions.json>...";

enum Mode {
    Target(PlayId),
    Match(u64),
}

struct Args {
    mode: Mode,
    top_n: usize,
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1).collect())?;
    let cfg = SimilarityConfig::from_env();

    let mut raws = Vec::new();
    for path in &args.files {
        raws.extend(load_sequence_positions_file(path, None, cfg.frame_rate_hz)?);
    }
    let corpus = build_corpus(raws, &cfg);
    println!(
        "Corpus: {} plays ({} excluded) from {} file(s), metric {}",
        corpus.len(),
        corpus.excluded().len(),
        args.files.len(),
        cfg.metric.label()
    );

    match args.mode {
        Mode::Target(id) => {
            let result = compute_top_similar(&id, &corpus, args.top_n, &cfg)?;
            print_result(&corpus, &result);
        }
        Mode::Match(match_id) => {
            let results = compute_top_similar_for_match(match_id, &corpus, args.top_n, &cfg)?;
            if results.is_empty() {
                println!("No plays for match {match_id}");
            }
            for result in &results {
                print_result(&corpus, result);
            }
        }
    }

    Ok(())
}

fn print_result(corpus: &Corpus, result: &SimilarityResult) {
    println!();
    match corpus.get(&result.target) {
        Some(target) => println!(
            "Target {} ({} positions, {:.1}s)",
            result.target,
            target.trajectory.len(),
            target.duration_secs
        ),
        None => println!("Target {}", result.target),
    }
    if result.entries.is_empty() {
        println!("  no comparable plays");
    }
    for entry in &result.entries {
        println!(
            "  #{:<3} {:<24} dist {:>9.4}  positions {:>3}  duration {:>5.1}s",
            entry.rank,
            entry.play.id.to_string(),
            entry.distance,
            entry.play.trajectory.len(),
            entry.play.duration_secs
        );
    }
    if !result.skipped.is_empty() {
        println!("  skipped: {}", result.skipped.len());
        for skip in result.skipped.iter().take(5) {
            println!("   - {}: {}", skip.play_id, skip.reason);
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Args> {
    let mut target: Option<PlayId> = None;
    let mut match_id: Option<u64> = None;
    let mut top_n = config::top_n_from_env();
    let mut files = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let (key, inline) = match arg.split_once('=') {
            Some((k, v)) if k.starts_with("--") => (k.to_string(), Some(v.to_string())),
            _ => (arg.clone(), None),
        };
        match key.as_str() {
            "--target" | "--match" | "--top-n" => {
                let value = match inline {
                    Some(v) => v,
                    None => iter
                        .next()
                        .with_context(|| format!("{key} needs a value\n{USAGE}"))?,
                };
                match key.as_str() {
                    "--target" => target = Some(value.parse()?),
                    "--match" => {
                        match_id = Some(
                            value
                                .trim()
                                .parse()
                                .with_context(|| format!("invalid match id {value:?}"))?,
                        )
                    }
                    _ => {
                        top_n = value
                            .trim()
                            .parse()
                            .with_context(|| format!("invalid top-n {value:?}"))?
                    }
                }
            }
            "-h" | "--help" => return Err(anyhow!(USAGE)),
            _ if key.starts_with("--") => return Err(anyhow!("unknown flag {key}\n{USAGE}")),
            _ => files.push(PathBuf::from(arg)),
        }
    }

    let mode = match (target, match_id) {
        (Some(id), None) => Mode::Target(id),
        (None, Some(m)) => Mode::Match(m),
        _ => return Err(anyhow!("pass exactly one of --target or --match\n{USAGE}")),
    };
    if files.is_empty() {
        return Err(anyhow!("no positions files given\n{USAGE}"));
    }
    Ok(Args { mode, top_n, files })
}
