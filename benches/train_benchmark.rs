use std::{io::Cursor, time::Duration};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hmm_tagger::{Corpus, Trainer};

const DET: [&str; 3] = ["the", "a", "this"];
const ADJ: [&str; 4] = ["old", "big", "red", "quiet"];
const NOUN: [&str; 6] = ["dog", "cat", "man", "house", "river", "city"];
const VERB: [&str; 5] = ["saw", "walks", "likes", "finds", "leaves"];

/// Deterministic DET (ADJ) NOUN VERB DET NOUN . sentences.
fn corpus(n: usize) -> (String, String) {
    let mut sentences = String::new();
    let mut tags = String::new();
    for i in 0..n {
        let adj = i % 3 == 0;
        let words = [
            Some(DET[i % DET.len()]),
            adj.then(|| ADJ[i % ADJ.len()]),
            Some(NOUN[i % NOUN.len()]),
            Some(VERB[(i / 2) % VERB.len()]),
            Some(DET[(i / 3) % DET.len()]),
            Some(NOUN[(i / 5) % NOUN.len()]),
            Some("."),
        ];
        let labels = ["DET", "ADJ", "NOUN", "VERB", "DET", "NOUN", "."];
        for (w, l) in words.iter().zip(labels) {
            if let Some(w) = w {
                sentences.push_str(w);
                sentences.push(' ');
                tags.push_str(l);
                tags.push(' ');
            }
        }
        sentences.push('\n');
        tags.push('\n');
    }
    (sentences, tags)
}

fn train((sentences, tags): &(String, String)) -> usize {
    let mut trainer = Trainer::new();
    trainer.train(Corpus::new(Cursor::new(sentences), Cursor::new(tags))).expect("failed to train")
}

fn train_benchmark(c: &mut Criterion) {
    let data = corpus(5000);
    assert_eq!(train(&data), 5000, "read count mismatch");
    c.bench_function("train", |b| b.iter(|| train(black_box(&data))));
    c.bench_function("train+derive", |b| {
        b.iter(|| {
            let mut trainer = Trainer::new();
            trainer.train(Corpus::new(Cursor::new(&data.0), Cursor::new(&data.1))).expect("failed to train");
            trainer.finish()
        })
    });
}

criterion_group! {
    name = benchmarks;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = train_benchmark
}
criterion_main!(benchmarks);
