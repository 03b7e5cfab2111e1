use ffbf_core::{
    run, Backing, FfbfError, FeedForwardMatcher, FilterConfig, FilterSource, HashKind, MatchConfig, RunPaths,
};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fs;
use std::io::Cursor;
use tempfile::tempdir;

fn small_config(window_len: usize) -> MatchConfig {
    MatchConfig {
        window_len,
        filter: FilterConfig { cache_bits: 1 << 14, ext_bits: 1 << 18, probes: 5, cache_probes: 2 },
        backing: Backing::Heap,
        ..MatchConfig::default()
    }
}

struct Outcome {
    filtered: Vec<u8>,
    phrases: Vec<u8>,
    index: Vec<u8>,
}

fn two_pass(config: MatchConfig, dictionary: &[u8], corpus: &[u8]) -> Outcome {
    let mut m = FeedForwardMatcher::new(config).unwrap();
    m.build(dictionary).unwrap();
    let mut filtered = Vec::new();
    m.scan_corpus(corpus, &mut filtered).unwrap();
    let (mut phrases, mut index) = (Vec::new(), Vec::new());
    m.confirm_phrases(dictionary, &mut phrases, &mut index).unwrap();
    Outcome { filtered, phrases, index }
}

#[test]
fn quick_brown_fox_end_to_end() {
    let out = two_pass(
        small_config(19),
        b"the quick brown fox jumps\n",
        b"nothing to see\nyesterday the quick brown fox jumps over the dog\nmore nothing\n",
    );
    assert_eq!(out.filtered, b"yesterday the quick brown fox jumps over the dog\n");
    assert_eq!(out.phrases, b"the quick brown fox jumps\n");
    assert_eq!(out.index, b"0\n");
}

#[test]
fn every_hash_kind_finds_the_phrase() {
    for kind in HashKind::ALL {
        let cfg = MatchConfig { hash: kind, ..small_config(19) };
        let out = two_pass(cfg, b"the quick brown fox jumps", b"and the quick brown fox jumps");
        assert_eq!(out.filtered, b"and the quick brown fox jumps\n", "{}", kind.name());
        assert_eq!(out.index, b"0\n", "{}", kind.name());
    }
}

#[test]
fn length_boundary() {
    let phrase = b"exactly eighteen!!";
    assert_eq!(phrase.len(), 18);
    let mut m = FeedForwardMatcher::new(small_config(19)).unwrap();
    assert!(!m.insert_phrase(phrase));
    assert_eq!(m.forward().count_ones(), 0);

    let out = two_pass(small_config(19), b"exactly eighteen!!\n", b"exactly eighteen!!\n");
    assert!(out.filtered.is_empty());
    assert!(out.phrases.is_empty());
    assert!(out.index.is_empty());

    // one byte longer qualifies
    let out = two_pass(small_config(19), b"exactly nineteen!!!\n", b"exactly nineteen!!!\n");
    assert_eq!(out.filtered, b"exactly nineteen!!!\n");
    assert_eq!(out.index, b"0\n");
}

#[test]
fn short_corpus_lines_are_never_reproduced() {
    let out = two_pass(small_config(8), b"abcdefgh\n", b"abcdefg\nabcdefgh\nabc\n");
    assert_eq!(out.filtered, b"abcdefgh\n");
}

#[test]
fn interior_window_flags_the_line_but_does_not_confirm_the_phrase() {
    // line 0's interior window "shared-w" is line 1's first window
    let dictionary = b"prefix-one shared-window tail\nshared-window elsewhere\n";
    let corpus = b"a corpus line with shared-window inside\n";
    let out = two_pass(small_config(8), dictionary, corpus);

    assert_eq!(out.filtered, b"a corpus line with shared-window inside\n");
    assert_eq!(out.phrases, b"shared-window elsewhere\n");
    assert_eq!(out.index, b"1\n");
}

#[test]
fn only_first_windows_are_dictionary_keys() {
    let out = two_pass(small_config(8), b"first-w then the interior\n", b"xx then the interior xx\n");
    assert!(out.filtered.is_empty());
    assert!(out.phrases.is_empty());
}

#[test]
fn unterminated_last_lines_are_processed() {
    let out = two_pass(small_config(8), b"zzz\nneedle-in-stack", b"hay\nhay needle-in-stack hay");
    assert_eq!(out.filtered, b"hay needle-in-stack hay\n");
    assert_eq!(out.phrases, b"needle-in-stack\n");
    assert_eq!(out.index, b"1\n");
}

#[test]
fn no_false_negatives_for_random_phrases() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut m = FeedForwardMatcher::new(small_config(12)).unwrap();
    let phrases: Vec<Vec<u8>> = (0..2000)
        .map(|i| {
            let mut p = vec![0u8; 12 + i % 20];
            rng.fill_bytes(&mut p);
            p
        })
        .collect();
    for p in &phrases {
        assert!(m.insert_phrase(p));
    }
    for p in &phrases {
        assert!(m.contains_line(p));
        assert!(m.contains_line(&p[..12]));
    }
}

#[test]
fn false_positive_rate_tracks_the_formula() {
    const WINDOW: usize = 8;
    let filter = FilterConfig { cache_bits: 1 << 15, ext_bits: 1 << 16, probes: 5, cache_probes: 2 };
    let cfg = MatchConfig {
        window_len: WINDOW,
        filter,
        backing: Backing::Heap,
        fold_non_ascii: false,
        ..MatchConfig::default()
    };
    let mut m = FeedForwardMatcher::new(cfg).unwrap();
    let mut rng = StdRng::seed_from_u64(2011);
    let mut w = [0u8; WINDOW];

    let inserted = 10_000u64;
    for _ in 0..inserted {
        rng.fill_bytes(&mut w);
        m.insert_phrase(&w);
    }
    let trials = 50_000u32;
    let mut positives = 0u32;
    for _ in 0..trials {
        rng.fill_bytes(&mut w);
        if m.contains_line(&w) {
            positives += 1;
        }
    }
    let observed = positives as f64 / trials as f64;
    let expected = filter.expected_fp_rate(inserted);
    assert!(
        observed > expected * 0.4 && observed < expected * 2.5,
        "observed {observed}, expected {expected}"
    );
    assert!((m.forward().estimated_fp_rate() - expected).abs() < 1e-12);
}

fn lowercase<const N: usize>(rng: &mut StdRng, w: &mut [u8; N]) {
    w.iter_mut().for_each(|b| *b = rng.random_range(b'a'..=b'z'));
}

#[test]
fn every_hash_kind_keeps_false_positives_bounded_on_short_ascii_windows() {
    const WINDOW: usize = 8;
    let filter = FilterConfig { cache_bits: 1 << 15, ext_bits: 1 << 16, probes: 5, cache_probes: 2 };
    let inserted = 10_000u64;
    let expected = filter.expected_fp_rate(inserted);
    for kind in HashKind::ALL {
        let cfg = MatchConfig { window_len: WINDOW, filter, hash: kind, backing: Backing::Heap, ..MatchConfig::default() };
        let mut m = FeedForwardMatcher::new(cfg).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let mut w = [0u8; WINDOW];

        for _ in 0..inserted {
            lowercase(&mut rng, &mut w);
            m.insert_phrase(&w);
        }
        let trials = 50_000u32;
        let mut positives = 0u32;
        for _ in 0..trials {
            lowercase(&mut rng, &mut w);
            if m.contains_line(&w) {
                positives += 1;
            }
        }
        let observed = positives as f64 / trials as f64;
        assert!(observed < expected * 4.0, "{}: observed {observed}, expected {expected}", kind.name());
    }
}

#[test]
fn pipeline_writes_outputs_and_reuses_a_stale_cache() {
    let dir = tempdir().unwrap();
    let dict_path = dir.path().join("phrases.txt");
    let out_path = dir.path().join("found.txt");
    fs::write(&dict_path, "the quick brown fox jumps\nlazy dogs sleeping all day\n").unwrap();
    let paths = RunPaths::derive(&dict_path, &out_path).unwrap();

    let corpus = "x\nthe quick brown fox jumps high\nlazy dogs sleeping all day long\n";
    let mut filtered = Vec::new();
    let report = run(small_config(19), &paths, Cursor::new(corpus), &mut filtered).unwrap();
    assert!(matches!(report.filter, FilterSource::Built(s) if s.inserted == 2));
    assert!(report.cache_written);
    assert_eq!(report.scan.lines_emitted, 2);
    assert_eq!(report.confirm.confirmed, 2);
    assert_eq!(filtered, b"the quick brown fox jumps high\nlazy dogs sleeping all day long\n");
    assert_eq!(fs::read_to_string(&out_path).unwrap(), "the quick brown fox jumps\nlazy dogs sleeping all day\n");
    assert_eq!(fs::read_to_string(&paths.index_out).unwrap(), "0\n1\n");
    assert!(paths.filter_cache.exists());

    // a new phrase is invisible while the old cache is in place
    fs::write(&dict_path, "the quick brown fox jumps\nlazy dogs sleeping all day\na brand new phrase here\n").unwrap();
    let mut filtered = Vec::new();
    let report = run(small_config(19), &paths, Cursor::new("a brand new phrase here\n"), &mut filtered).unwrap();
    assert!(matches!(report.filter, FilterSource::Loaded { .. }));
    assert!(!report.cache_written);
    assert!(filtered.is_empty());
    assert_eq!(fs::read_to_string(&out_path).unwrap(), "");

    // dropping the cache picks the new phrase up
    fs::remove_file(&paths.filter_cache).unwrap();
    let mut filtered = Vec::new();
    run(small_config(19), &paths, Cursor::new("a brand new phrase here\n"), &mut filtered).unwrap();
    assert_eq!(filtered, b"a brand new phrase here\n");
    assert_eq!(fs::read_to_string(&paths.index_out).unwrap(), "2\n");
}

#[test]
fn cache_write_can_be_disabled() {
    let dir = tempdir().unwrap();
    let dict_path = dir.path().join("p.txt");
    fs::write(&dict_path, "some phrase of words\n").unwrap();
    let paths = RunPaths::derive(&dict_path, dir.path().join("o.txt")).unwrap();
    let cfg = MatchConfig { write_cache: false, ..small_config(10) };
    let report = run(cfg, &paths, Cursor::new(""), &mut Vec::<u8>::new()).unwrap();
    assert!(!report.cache_written);
    assert!(!paths.filter_cache.exists());
}

#[test]
fn corrupt_cache_is_fatal() {
    let dir = tempdir().unwrap();
    let dict_path = dir.path().join("p.txt");
    fs::write(&dict_path, "some phrase of words\n").unwrap();
    let paths = RunPaths::derive(&dict_path, dir.path().join("o.txt")).unwrap();
    fs::write(&paths.filter_cache, [1u8, 2, 3]).unwrap();
    let err = run(small_config(10), &paths, Cursor::new("some phrase of words\n"), &mut Vec::<u8>::new()).unwrap_err();
    assert!(matches!(err, FfbfError::Corrupt(_)));
}

#[test]
fn missing_dictionary_fails_and_releases_the_backing_files() {
    let dir = tempdir().unwrap();
    let scratch = dir.path().join("scratch");
    fs::create_dir(&scratch).unwrap();
    let paths = RunPaths::derive(dir.path().join("absent.txt"), dir.path().join("o.txt")).unwrap();
    let cfg = MatchConfig { backing: Backing::File { dir: scratch.clone() }, ..small_config(10) };

    let err = run(cfg, &paths, Cursor::new("whatever\n"), &mut Vec::<u8>::new()).unwrap_err();
    match err {
        FfbfError::Resource { op, path, .. } => {
            assert_eq!(op, "open dictionary");
            assert_eq!(path.as_deref(), Some(paths.dictionary.as_path()));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
}
