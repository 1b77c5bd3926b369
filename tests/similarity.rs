use std::time::Instant;

use play_similarity::config::SimilarityConfig;
use play_similarity::dtw::Aligner;
use play_similarity::partition::ComparisonWindow;
use play_similarity::similarity::{
    ComparePool, compute_top_similar, compute_top_similar_for_match, compute_top_similar_within,
    pair_distance,
};
use play_similarity::{Corpus, Play, PlayId, Position, SimilarityError, Trajectory};

fn play(match_id: u64, seq: &str, pts: Vec<Position>) -> Play {
    Play {
        id: PlayId::new(match_id, seq),
        trajectory: Trajectory::new(pts).expect("test trajectories are non-empty"),
        duration_secs: 5.0,
        team_id: None,
        video_ref: None,
        direction_normalized: false,
    }
}

fn sweep(n: usize, dx: f64, y0: f64, wobble: f64) -> Vec<Position> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            Position::new(-40.0 + t * dx, y0 + (t * 0.9).sin() * wobble)
        })
        .collect()
}

fn corpus_of(plays: Vec<Play>) -> Corpus {
    let mut corpus = Corpus::new();
    for p in plays {
        corpus.insert(p).expect("test ids are unique");
    }
    corpus
}

fn cfg() -> SimilarityConfig {
    SimilarityConfig {
        parallelism: 2,
        ..SimilarityConfig::default()
    }
}

#[test]
fn ten_vs_twenty_three_takes_min_of_two_windows() {
    let target = play(1, "t", sweep(10, 3.0, 0.0, 4.0));
    let other = play(2, "o", sweep(23, 2.5, 6.0, 9.0));

    let d = pair_distance(&target, &other, &cfg()).expect("comparable");
    assert_eq!(d.windows, 2);
    assert!(!d.swapped);

    let aligner = Aligner::default();
    let short = target.trajectory.points();
    let long = other.trajectory.points();
    let w0 = aligner.cost(short, &long[0..10]).expect("non-empty");
    let w1 = aligner.cost(short, &long[10..20]).expect("non-empty");
    assert_eq!(d.distance, w0.min(w1));
    let expected_start = if w1 < w0 { 10 } else { 0 };
    assert_eq!(d.best_window, ComparisonWindow { start: expected_start, len: 10 });
}

#[test]
fn ten_vs_eight_swaps_roles() {
    let target = play(1, "t", sweep(10, 3.0, 0.0, 4.0));
    let other = play(2, "o", sweep(8, 3.0, 1.0, 4.0));

    let d = pair_distance(&target, &other, &cfg()).expect("comparable");
    assert!(d.swapped);
    assert_eq!(d.windows, 1);
    assert_eq!(d.best_window, ComparisonWindow { start: 0, len: 8 });

    let expected = Aligner::default()
        .cost(other.trajectory.points(), &target.trajectory.points()[0..8])
        .expect("non-empty");
    assert_eq!(d.distance, expected);
}

#[test]
fn role_swap_does_not_change_distance() {
    let shapes = [
        sweep(4, 5.0, 0.0, 2.0),
        sweep(9, 2.0, -3.0, 7.0),
        sweep(13, 1.5, 8.0, 3.0),
        sweep(9, 2.2, -1.0, 6.0),
    ];
    for (i, a) in shapes.iter().enumerate() {
        for (j, b) in shapes.iter().enumerate() {
            let pa = play(1, &format!("a{i}"), a.clone());
            let pb = play(2, &format!("b{j}"), b.clone());
            let ab = pair_distance(&pa, &pb, &cfg()).expect("comparable");
            let ba = pair_distance(&pb, &pa, &cfg()).expect("comparable");
            assert_eq!(ab.distance, ba.distance, "shapes {i} and {j}");
            assert!(ab.distance >= 0.0);
        }
    }
}

#[test]
fn identical_play_ranks_first_with_zero_distance() {
    let shape = sweep(12, 2.0, 3.0, 5.0);
    let corpus = corpus_of(vec![
        play(1, "target", shape.clone()),
        play(2, "twin", shape),
        play(3, "other", sweep(12, 2.0, 20.0, 1.0)),
    ]);
    let result =
        compute_top_similar(&PlayId::new(1, "target"), &corpus, 5, &cfg()).expect("valid request");
    assert_eq!(result.entries[0].play.id, PlayId::new(2, "twin"));
    assert_eq!(result.entries[0].distance, 0.0);
    assert_eq!(result.entries[0].rank, 1);
    assert_eq!(result.entries[0].similarity_score(), Some(1.0));
    assert!(result.ids().iter().all(|id| **id != PlayId::new(1, "target")));
}

#[test]
fn small_corpus_returns_every_comparable_play() {
    let mut plays = vec![play(1, "t", sweep(8, 2.0, 0.0, 3.0))];
    for k in 0..5 {
        plays.push(play(2, &k.to_string(), sweep(6 + k * 3, 2.0, k as f64, 3.0)));
    }
    let corpus = corpus_of(plays);
    let result = compute_top_similar(&PlayId::new(1, "t"), &corpus, 10, &cfg()).expect("valid");
    assert_eq!(result.entries.len(), 5);
    assert!(result.skipped.is_empty());
    assert_eq!(result.top_n, 10);

    let ranks: Vec<usize> = result.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    for pair in result.entries.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn top_n_bounds_result_length() {
    let mut plays = vec![play(1, "t", sweep(8, 2.0, 0.0, 3.0))];
    for k in 0..7 {
        plays.push(play(3, &format!("p{k}"), sweep(8, 2.0 + k as f64 * 0.1, 1.0, 3.0)));
    }
    let corpus = corpus_of(plays);
    for n in [1, 3, 7, 20] {
        let result = compute_top_similar(&PlayId::new(1, "t"), &corpus, n, &cfg()).expect("valid");
        assert_eq!(result.entries.len(), n.min(7));
    }
}

#[test]
fn short_plays_are_skipped_not_scored() {
    let corpus = corpus_of(vec![
        play(1, "t", sweep(6, 2.0, 0.0, 3.0)),
        play(1, "single", vec![Position::new(0.0, 0.0)]),
        play(1, "ok", sweep(6, 2.0, 1.0, 3.0)),
    ]);
    let result = compute_top_similar(&PlayId::new(1, "t"), &corpus, 5, &cfg()).expect("valid");
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].play_id, PlayId::new(1, "single"));
    assert_eq!(
        result.skipped[0].reason,
        SimilarityError::InsufficientLength { len: 1, min: 2 }
    );
}

#[test]
fn single_point_target_yields_empty_result() {
    let corpus = corpus_of(vec![
        play(1, "t", vec![Position::new(1.0, 1.0)]),
        play(1, "a", sweep(6, 2.0, 1.0, 3.0)),
        play(1, "b", sweep(9, 2.0, 1.0, 3.0)),
    ]);
    let result = compute_top_similar(&PlayId::new(1, "t"), &corpus, 5, &cfg()).expect("valid");
    assert!(result.entries.is_empty());
    assert_eq!(result.skipped.len(), 2);
}

#[test]
fn ties_are_broken_by_play_id() {
    let shape = sweep(7, 2.0, 0.0, 3.0);
    let copy = sweep(7, 2.0, 2.0, 3.0);
    let corpus = corpus_of(vec![
        play(5, "t", shape),
        play(9, "1", copy.clone()),
        play(4, "b", copy.clone()),
        play(4, "a", copy.clone()),
        play(4, "10", copy),
    ]);
    let result = compute_top_similar(&PlayId::new(5, "t"), &corpus, 10, &cfg()).expect("valid");
    let ids: Vec<String> = result.entries.iter().map(|e| e.play.id.to_string()).collect();
    assert_eq!(ids, vec!["4_10", "4_a", "4_b", "9_1"]);
    assert!(result.entries.windows(2).all(|w| w[0].distance == w[1].distance));
}

#[test]
fn repeated_runs_are_identical() {
    let mut plays = Vec::new();
    for k in 0..40 {
        let len = 4 + (k * 7) % 15;
        plays.push(play(
            100 + (k % 3) as u64,
            &format!("s{k}"),
            sweep(len, 1.0 + (k % 5) as f64 * 0.4, (k % 4) as f64, (k % 6) as f64),
        ));
    }
    let corpus = corpus_of(plays);
    let target = PlayId::new(101, "s1");

    let first = compute_top_similar(&target, &corpus, 8, &cfg()).expect("valid");
    let wide = SimilarityConfig {
        parallelism: 8,
        ..cfg()
    };
    let second = compute_top_similar(&target, &corpus, 8, &wide).expect("valid");
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serializable"),
        serde_json::to_string(&second).expect("serializable")
    );
}

#[test]
fn invalid_requests_fail_the_call() {
    let corpus = corpus_of(vec![
        play(1, "t", sweep(6, 2.0, 0.0, 3.0)),
        play(1, "a", sweep(6, 2.0, 1.0, 3.0)),
    ]);
    assert_eq!(
        compute_top_similar(&PlayId::new(1, "t"), &corpus, 0, &cfg()),
        Err(SimilarityError::InvalidTopN(0))
    );
    assert_eq!(
        compute_top_similar(&PlayId::new(1, "missing"), &corpus, 3, &cfg()),
        Err(SimilarityError::UnknownTarget(PlayId::new(1, "missing")))
    );
    // Top-n is checked before the target lookup.
    assert_eq!(
        compute_top_similar(&PlayId::new(1, "missing"), &corpus, 0, &cfg()),
        Err(SimilarityError::InvalidTopN(0))
    );
}

#[test]
fn elapsed_deadline_aborts_search() {
    let corpus = corpus_of(vec![
        play(1, "t", sweep(6, 2.0, 0.0, 3.0)),
        play(1, "a", sweep(6, 2.0, 1.0, 3.0)),
    ]);
    let deadline = Instant::now();
    assert_eq!(
        compute_top_similar_within(&PlayId::new(1, "t"), &corpus, 3, &cfg(), deadline),
        Err(SimilarityError::DeadlineExceeded)
    );

    let later = Instant::now() + std::time::Duration::from_secs(60);
    let result = compute_top_similar_within(&PlayId::new(1, "t"), &corpus, 3, &cfg(), later)
        .expect("deadline far away");
    assert_eq!(result.entries.len(), 1);
}

#[test]
fn match_batch_covers_every_play_of_the_match() {
    let corpus = corpus_of(vec![
        play(7, "2", sweep(6, 2.0, 0.0, 3.0)),
        play(7, "1", sweep(8, 2.0, 1.0, 3.0)),
        play(8, "1", sweep(7, 2.0, 2.0, 3.0)),
    ]);
    let results = compute_top_similar_for_match(7, &corpus, 2, &cfg()).expect("valid");
    let targets: Vec<String> = results.iter().map(|r| r.target.to_string()).collect();
    assert_eq!(targets, vec!["7_1", "7_2"]);
    for r in &results {
        assert_eq!(r.entries.len(), 2);
    }
    assert!(
        compute_top_similar_for_match(99, &corpus, 2, &cfg())
            .expect("valid")
            .is_empty()
    );
}

#[test]
fn non_finite_positions_never_reach_the_ranking() {
    let corpus = corpus_of(vec![
        play(1, "t", vec![Position::new(0.0, 0.0), Position::new(1.0, 0.0)]),
        play(1, "nan", vec![Position::new(f64::NAN, 0.0), Position::new(1.0, 0.0)]),
        play(1, "ok", vec![Position::new(0.0, 1.0), Position::new(1.0, 1.0)]),
    ]);
    assert_eq!(corpus.get(&PlayId::new(1, "nan")).map(|p| p.trajectory.len()), Some(1));

    let result = compute_top_similar(&PlayId::new(1, "t"), &corpus, 5, &cfg()).expect("valid");
    assert_eq!(result.ids(), vec![&PlayId::new(1, "ok")]);
    assert!(result.entries.iter().all(|e| e.distance.is_finite()));
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].play_id, PlayId::new(1, "nan"));
    assert_eq!(
        result.skipped[0].reason,
        SimilarityError::InsufficientLength { len: 1, min: 2 }
    );
}

#[test]
fn shared_pool_matches_one_shot_searches() {
    let mut plays = Vec::new();
    for k in 0..12 {
        plays.push(play(3, &format!("p{k}"), sweep(5 + k, 1.5 + k as f64 * 0.2, 0.0, 4.0)));
    }
    let corpus = corpus_of(plays);
    let pool = ComparePool::new(3);
    for k in [0, 5, 11] {
        let target = PlayId::new(3, format!("p{k}"));
        let shared = pool.top_similar(&target, &corpus, 4, &cfg()).expect("valid");
        let fresh = compute_top_similar(&target, &corpus, 4, &cfg()).expect("valid");
        assert_eq!(shared, fresh);
    }
    assert_eq!(
        pool.top_similar_within(&PlayId::new(3, "p0"), &corpus, 4, &cfg(), Instant::now()),
        Err(SimilarityError::DeadlineExceeded)
    );
}
