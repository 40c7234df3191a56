use std::{
    fs::File,
    io::{self, stdin, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use clap::{Args, Parser, Subcommand};
use hmm_tagger::{
    dataset::{read_lines, read_sentences},
    format_pairs, Corpus, Error, Evaluation, HmmModel, HmmTagger, Result, Tagger, Trainer, UNSEEN_SCORE,
};

/// Train, apply and evaluate a Hidden Markov Model part-of-speech tagger
#[derive(Debug, Parser)]
#[command(version)]
#[command(propagate_version = true)]
struct Argv {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// count a line-aligned corpus and write the model to a file (MODEL)
    Train {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,
    },
    /// assign tags to every line of a file (FILE), or STDIN when omitted
    Tag {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// report the performance of the model on tagged sentences
    Evaluate {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        corpus: CorpusArgs,
        /// print the per-label report as well
        #[arg(short, long)]
        verbose: bool,
    },
    /// prompt for sentences on STDIN and print them tagged
    Interactive {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Args)]
struct CorpusArgs {
    /// whitespace separated sentences, one per line
    #[arg(short, long, value_name = "FILE")]
    sentences: PathBuf,
    /// whitespace separated tags, line-aligned with the sentences
    #[arg(short, long, value_name = "FILE")]
    tags: PathBuf,
}

#[derive(Debug, Args)]
struct ModelArgs {
    /// read a model from a file (MODEL)
    #[arg(short, long, value_name = "MODEL", required_unless_present = "train_sentences")]
    model: Option<PathBuf>,
    /// train in memory from these sentences instead of reading a model
    #[arg(long, value_name = "FILE", requires = "train_tags", conflicts_with = "model")]
    train_sentences: Option<PathBuf>,
    #[arg(long, value_name = "FILE", requires = "train_sentences")]
    train_tags: Option<PathBuf>,
    /// emission log score for a token never observed under a tag
    #[arg(long, default_value_t = UNSEEN_SCORE, allow_negative_numbers = true, value_parser = parse_score)]
    unseen_score: f64,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// string joining each token with its tag
    #[arg(long, default_value = "/")]
    separator: String,
}

fn parse_score(s: &str) -> std::result::Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(v) => Err(format!("{v} is not a finite score")),
        Err(e) => Err(e.to_string()),
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

fn train(sentences: &Path, tags: &Path) -> Result<HmmModel> {
    let begin = Instant::now();
    let mut trainer = Trainer::new();
    trainer.train(Corpus::new(open(sentences)?, open(tags)?))?;
    let model = trainer.finish();
    log::info!("training took: {:?}", begin.elapsed());
    Ok(model)
}

impl ModelArgs {
    fn load(&self) -> Result<HmmModel> {
        match (&self.model, &self.train_sentences, &self.train_tags) {
            (Some(path), _, _) => {
                log::info!("read model from {}", path.display());
                HmmModel::load(open(path)?)
            }
            (None, Some(sentences), Some(tags)) => train(sentences, tags),
            _ => Err(Error::InvalidModel("no model given".into())),
        }
    }
}

fn tag_lines<R: BufRead>(tagger: &HmmTagger, reader: R, separator: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        match tagger.tag_line(&line) {
            Ok(pairs) => writeln!(out, "{}", format_pairs(&pairs, separator))?,
            Err(e @ Error::DeadEnd { .. }) => {
                log::warn!("line {}: {e}", i + 1);
                writeln!(out)?;
            }
            Err(e) => return Err(e),
        }
    }
    out.flush()?;
    Ok(())
}

fn evaluate(tagger: &HmmTagger, corpus: &CorpusArgs, verbose: bool) -> Result<()> {
    let begin = Instant::now();
    let sentences = read_sentences(open(&corpus.sentences)?)?;
    let gold = read_lines(open(&corpus.tags)?)?;
    if sentences.len() != gold.len() {
        return Err(Error::UnevenCorpus { line: sentences.len().min(gold.len()) + 1 });
    }
    let mut evaluation = Evaluation::default();
    for (i, (tokens, tags)) in sentences.iter().zip(&gold).enumerate() {
        match tagger.tag(tokens) {
            Ok(prediction) => {
                evaluation.accumulate(tags, &prediction)?;
            }
            Err(e @ Error::DeadEnd { .. }) => {
                log::warn!("line {}: {e}", i + 1);
                evaluation.record_failure(tokens, tags)?;
            }
            Err(e) => return Err(e),
        }
    }
    log::info!("evaluated {} sentences in {:?}", sentences.len(), begin.elapsed());
    if verbose {
        println!("{}", evaluation);
    } else {
        println!("{}", evaluation.score());
    }
    Ok(())
}

fn interactive(tagger: &HmmTagger, separator: &str) -> Result<()> {
    let stdin = stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Please type a sentence to tag: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };
        match tagger.tag_line(&line?) {
            Ok(pairs) => println!("{}", format_pairs(&pairs, separator)),
            Err(e @ Error::DeadEnd { .. }) => eprintln!("{e}"),
            Err(e) => return Err(e),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let argv = Argv::parse();
    log::info!("argv: {:?}", argv);

    match argv.command {
        Command::Train { corpus, model } => {
            let hmm = train(&corpus.sentences, &corpus.tags)?;
            let mut writer = BufWriter::new(File::create(&model)?);
            hmm.save(&mut writer)?;
            writer.flush()?;
            log::info!("write model to {}", model.display());
        }
        Command::Tag { model, output, input } => {
            let hmm = model.load()?;
            let tagger = HmmTagger::with_unseen_score(&hmm, model.unseen_score);
            match input {
                Some(path) => tag_lines(&tagger, open(&path)?, &output.separator)?,
                None => tag_lines(&tagger, stdin().lock(), &output.separator)?,
            }
        }
        Command::Evaluate { model, corpus, verbose } => {
            let hmm = model.load()?;
            let tagger = HmmTagger::with_unseen_score(&hmm, model.unseen_score);
            evaluate(&tagger, &corpus, verbose)?;
        }
        Command::Interactive { model, output } => {
            let hmm = model.load()?;
            let tagger = HmmTagger::with_unseen_score(&hmm, model.unseen_score);
            interactive(&tagger, &output.separator)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unseen_score(value: &str) -> std::result::Result<f64, clap::Error> {
        let argv = Argv::try_parse_from(["hmm-tagger", "tag", "-m", "model.json", "--unseen-score", value])?;
        match argv.command {
            Command::Tag { model, .. } => Ok(model.unseen_score),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unseen_score_must_be_finite() {
        assert_eq!(unseen_score("-50").unwrap(), -50.0);
        assert_eq!(unseen_score("-1e3").unwrap(), -1000.0);
        for value in ["NaN", "inf", "-inf", "low"] {
            assert!(unseen_score(value).is_err(), "{value}");
        }
    }

    #[test]
    fn unseen_score_defaults_to_floor() {
        let argv = Argv::try_parse_from(["hmm-tagger", "evaluate", "-m", "m.json", "-s", "s.txt", "-t", "t.txt"]).unwrap();
        match argv.command {
            Command::Evaluate { model, .. } => assert_eq!(model.unseen_score, UNSEEN_SCORE),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
