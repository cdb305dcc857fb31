use std::{
    error::Error,
    fmt::Write as _,
    hint::black_box,
    io::Write as _,
    path::Path,
    time::{Duration, Instant},
};

use yansi::Paint;

use crate::{
    classify::{Classify, Strategy},
    cli,
    error::{Diag, Level, Snippetize},
    hash::{HashClassifier, MAX_HASH, MIN_HASH},
    keyword::KEYWORDS,
    mem_size::DeepSize,
    scan::{occurrences, Scanner, Tally},
    trie::TrieClassifier,
    utils::{duration_fmt, ByteFmt},
    verify,
};

pub fn classify_main(args: &cli::Classify) -> Result<(), Box<dyn Error>> {
    let classifier = args.strategy.classifier();
    let mut out = anstream::stdout().lock();

    for word in &args.words {
        match classifier.classify(word.as_bytes()) {
            Some(keyword) => writeln!(out, "{}: {}", word.bold(), keyword.code().green())?,
            None => writeln!(out, "{}: {}", word.bold(), "not a keyword".dim())?,
        }
    }

    Ok(())
}

pub fn scan_main(args: &cli::Scan) -> Result<(), Box<dyn Error>> {
    let source = read_source(&args.file)?;
    let classifier = args.strategy.classifier();

    let scan_timer = Instant::now();
    let tally = Tally::new(source.as_bytes(), classifier);
    if cli::verbose() {
        eprintln!(
            "scanning done ({}): {}",
            args.strategy,
            duration_fmt(scan_timer.elapsed())
        );
        eprintln!("tally memory: {}", ByteFmt(tally.deep_size_of()));
    }

    let mut out = anstream::stdout().lock();
    writeln!(
        out,
        "{} keywords in {} identifiers",
        tally.keywords.bold(),
        tally.identifiers.bold()
    )?;
    for (keyword, count) in tally.ranked() {
        writeln!(out, "{count:>8} {}", keyword.cyan())?;
    }

    if args.annotate {
        let found = occurrences(source.as_bytes(), classifier);
        if cli::verbose() {
            eprintln!("occurrence memory: {}", ByteFmt(found.deep_size_of()));
        }
        let diag = Diag::new(
            Level::Info,
            format!("{} keywords in {}", found.len(), args.file.display()),
        )
        .add_annotations(found.iter().map(Snippetize::snippetize));
        anstream::eprint!("{}", diag.render(&source, &args.file)?);
    }

    Ok(())
}

pub fn verify_main(args: &cli::Verify) -> Result<(), Box<dyn Error>> {
    let verify_timer = Instant::now();

    let verification = match args.seed {
        Some(seed) => verify::verify_with_seed(&Strategy::ALL, seed),
        None => verify::verify(&Strategy::ALL),
    };

    if cli::verbose() {
        eprintln!("verifying done: {}", duration_fmt(verify_timer.elapsed()));
    }

    let mut out = anstream::stdout().lock();
    for failure in &verification.failures {
        writeln!(out, "{} {failure}", "fail:".red().bold())?;
    }

    let strategies = Strategy::ALL.map(Strategy::name).join(", ");
    if let Some(first) = verification.failures.first() {
        writeln!(
            out,
            "{} failures across {} probes [{strategies}]",
            verification.failures.len(),
            verification.probes
        )?;
        return Err(first.clone().into());
    }

    writeln!(
        out,
        "{} {} keywords, {} probes [{strategies}]",
        "ok:".green().bold(),
        KEYWORDS.len(),
        verification.probes
    )?;
    Ok(())
}

pub fn dump_main(args: &cli::Dump) -> Result<(), Box<dyn Error>> {
    let mut buf = String::new();

    if args.hash {
        writeln!(buf, "hash slots {MIN_HASH}..={MAX_HASH}")?;
        for (slot, entry) in HashClassifier.slots() {
            writeln!(
                buf,
                "{slot:>4} len {:>2} {} ({})",
                entry.len(),
                entry.kind.cyan(),
                entry.code()
            )?;
        }
        if cli::verbose() {
            eprintln!("hash memory: {}", ByteFmt(HashClassifier.deep_size_of()));
        }
    }

    if args.trie {
        let trie = TrieClassifier::shared();
        writeln!(buf, "trie widths {}", trie.widths())?;
        for matcher in trie.matchers() {
            write!(buf, "{matcher}")?;
        }
        if cli::verbose() {
            eprintln!("trie memory: {}", ByteFmt(trie.deep_size_of()));
        }
    }

    anstream::stdout().lock().write_all(buf.as_bytes())?;
    Ok(())
}

pub fn bench_main(args: &cli::Bench) -> Result<(), Box<dyn Error>> {
    let total_time = Duration::try_from_secs_f64(args.total_time)
        .map_err(|e| format!("invalid total time {}: {e}", args.total_time))?;
    let source = read_source(&args.file)?;
    let lexemes: Vec<&[u8]> = Scanner::new(source.as_bytes())
        .map(|ident| ident.text)
        .collect();
    if cli::verbose() {
        eprintln!("{} identifiers in {}", lexemes.len(), args.file.display());
    }

    let results: Vec<_> = Strategy::ALL
        .iter()
        .map(|&strategy| {
            let rate = bench_strategy(strategy.classifier(), &lexemes, total_time);
            (strategy.name(), rate)
        })
        .collect();

    report_results(&results);
    Ok(())
}

fn bench_strategy(classifier: &dyn Classify, lexemes: &[&[u8]], total_time: Duration) -> f64 {
    let mut counter = 0;
    let mut timer = Duration::ZERO;
    while timer < total_time {
        let start = Instant::now();
        for lexeme in lexemes {
            black_box(classifier.classify(black_box(lexeme)));
        }
        timer += start.elapsed();
        counter += lexemes.len();
    }

    counter as f64 / timer.as_secs_f64()
}

fn report_results(results: &[(&str, f64)]) {
    let results: Vec<_> = results
        .iter()
        .map(|(name, rate)| (format!("{name}:"), *rate as usize))
        .collect();
    let max_name_len = results
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or_default();
    let max_rate_len = results
        .iter()
        .map(|(_, rate)| rate.checked_ilog10().unwrap_or_default() as usize + 1)
        .max()
        .unwrap_or_default();
    for (name, rate) in results {
        eprintln!("{name: >max_name_len$} {rate: >max_rate_len$} lexemes/s")
    }
}

fn read_source(path: &Path) -> Result<String, Box<dyn Error>> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("could not read {}: {e}", path.display()).into())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn bench_reports_bad_total_time() {
        let file = PathBuf::from("does-not-exist.v");
        for total_time in [-1.0, f64::NAN, f64::INFINITY] {
            let err = bench_main(&cli::Bench {
                file: file.clone(),
                total_time,
            })
            .unwrap_err();
            assert!(err.to_string().starts_with("invalid total time"), "{err}");
        }
    }
}
