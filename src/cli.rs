use clap::{
    builder::{styling::AnsiColor, PossibleValuesParser, Styles, TypedValueParser, ValueParser},
    error::ErrorKind,
    Arg, ArgAction, ArgMatches, Command, Error,
};
use std::{
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::classify::Strategy;

pub enum CLI {
    Classify(Classify),
    Scan(Scan),
    Verify(Verify),
    Dump(Dump),
    Bench(Bench),
}

pub struct Classify {
    pub words: Vec<String>,
    pub strategy: Strategy,
}

pub struct Scan {
    pub file: PathBuf,
    pub strategy: Strategy,
    pub annotate: bool,
}

pub struct Verify {
    pub seed: Option<u64>,
}

pub struct Dump {
    pub hash: bool,
    pub trie: bool,
}

pub struct Bench {
    pub file: PathBuf,
    pub total_time: f64,
}

static VERBOSITY: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn verbose() -> bool {
    VERBOSITY.load(Ordering::Relaxed)
}

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().bold())
    .usage(AnsiColor::Green.on_default().bold())
    .placeholder(AnsiColor::Green.on_default())
    .literal(AnsiColor::Cyan.on_default().bold())
    .valid(AnsiColor::Cyan.on_default().bold());

impl CLI {
    pub fn parse() -> Self {
        let command = Self::command();

        let matches = command.get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.format(&mut Self::command()).exit())
    }

    fn command() -> Command {
        Command::new("kwclass")
            .styles(STYLES)
            .version(env!("CARGO_PKG_VERSION"))
            .about("Classify identifier lexemes as keywords")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Enable verbose output")
                    .value_parser(ValueParser::bool())
                    .action(ArgAction::SetTrue)
                    .global(true),
            )
            .subcommands([
                Classify::command(),
                Scan::command(),
                Verify::command(),
                Dump::command(),
                Bench::command(),
            ])
    }

    fn from_arg_matches(matches: &ArgMatches) -> Result<Self, Error> {
        VERBOSITY.store(matches.get_flag("verbose"), Ordering::Relaxed);
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| Error::new(ErrorKind::MissingSubcommand))?;

        match name {
            "classify" => Ok(Self::Classify(Classify::from_arg_matches(sub_matches)?)),
            "scan" => Ok(Self::Scan(Scan::from_arg_matches(sub_matches)?)),
            "verify" => Ok(Self::Verify(Verify::from_arg_matches(sub_matches)?)),
            "dump" => Ok(Self::Dump(Dump::from_arg_matches(sub_matches)?)),
            "bench" => Ok(Self::Bench(Bench::from_arg_matches(sub_matches)?)),
            _ => Err(Error::raw(
                ErrorKind::InvalidSubcommand,
                format!("the subcommand `{name}` wasn't recognized"),
            )),
        }
    }
}

impl Classify {
    fn command() -> Command {
        Command::new("classify")
            .styles(STYLES)
            .about("Print the token code of each word")
            .args([
                Arg::new("words")
                    .value_name("WORD")
                    .num_args(1..)
                    .required(true)
                    .action(ArgAction::Append),
                strategy_arg(),
            ])
    }

    fn from_arg_matches(matches: &ArgMatches) -> Result<Self, Error> {
        Ok(Classify {
            words: pluck_many(matches, "words"),
            strategy: pluck(matches, "strategy")?,
        })
    }
}

impl Scan {
    fn command() -> Command {
        Command::new("scan")
            .styles(STYLES)
            .about("Count keyword occurrences in a source file")
            .args([
                file_arg(),
                strategy_arg(),
                Arg::new("annotate")
                    .short('a')
                    .long("annotate")
                    .help("label every keyword occurrence in the source")
                    .value_parser(ValueParser::bool())
                    .action(ArgAction::SetTrue),
            ])
    }

    fn from_arg_matches(matches: &ArgMatches) -> Result<Self, Error> {
        Ok(Scan {
            file: pluck(matches, "file")?,
            strategy: pluck(matches, "strategy")?,
            annotate: matches.get_flag("annotate"),
        })
    }
}

impl Verify {
    fn command() -> Command {
        Command::new("verify")
            .styles(STYLES)
            .about("Check every strategy against the keyword table")
            .arg(
                Arg::new("seed")
                    .long("seed")
                    .value_name("SEED")
                    .help("seed for the random identifier corpus")
                    .value_parser(clap::value_parser!(u64))
                    .action(ArgAction::Set),
            )
    }

    fn from_arg_matches(matches: &ArgMatches) -> Result<Self, Error> {
        Ok(Verify {
            seed: matches.get_one("seed").copied(),
        })
    }
}

impl Dump {
    fn command() -> Command {
        Command::new("dump")
            .styles(STYLES)
            .about("Print the classifier tables")
            .args([
                Arg::new("hash")
                    .long("hash")
                    .help("only print the hash slot table")
                    .value_parser(ValueParser::bool())
                    .action(ArgAction::SetTrue)
                    .conflicts_with("trie"),
                Arg::new("trie")
                    .long("trie")
                    .help("only print the trie matchers")
                    .value_parser(ValueParser::bool())
                    .action(ArgAction::SetTrue),
            ])
    }

    fn from_arg_matches(matches: &ArgMatches) -> Result<Self, Error> {
        let (hash, trie) = (matches.get_flag("hash"), matches.get_flag("trie"));
        Ok(Dump {
            hash: hash || !trie,
            trie: trie || !hash,
        })
    }
}

impl Bench {
    fn command() -> Command {
        Command::new("bench")
            .styles(STYLES)
            .about("Measure classification throughput over a source file")
            .args([
                file_arg(),
                Arg::new("total_time")
                    .long("total-time")
                    .value_name("SECS")
                    .help("time spent per strategy")
                    .default_value("3")
                    .value_parser(parse_secs)
                    .action(ArgAction::Set),
            ])
    }

    fn from_arg_matches(matches: &ArgMatches) -> Result<Self, Error> {
        Ok(Bench {
            file: pluck(matches, "file")?,
            total_time: pluck(matches, "total_time")?,
        })
    }
}

fn pluck<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Result<T, Error> {
    matches.get_one(id).cloned().ok_or_else(|| {
        Error::raw(
            ErrorKind::MissingRequiredArgument,
            format!("The following required argument was not provided: `{id}`"),
        )
    })
}

fn pluck_many<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Vec<T> {
    matches.get_many(id).unwrap_or_default().cloned().collect()
}

fn file_arg() -> Arg {
    Arg::new("file")
        .value_name("FILE")
        .value_parser(ValueParser::path_buf())
        .action(ArgAction::Set)
        .required(true)
}

fn parse_secs(s: &str) -> Result<f64, String> {
    let secs = s.parse::<f64>().map_err(|e| e.to_string())?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(format!("expected a positive number of seconds, got `{s}`"))
    }
}

fn strategy_arg() -> Arg {
    Arg::new("strategy")
        .short('s')
        .long("strategy")
        .value_name("STRATEGY")
        .help("classifier to use")
        .default_value(Strategy::default().name())
        .value_parser(
            PossibleValuesParser::new(Strategy::ALL.map(Strategy::name))
                .try_map(|name| name.parse::<Strategy>()),
        )
        .action(ArgAction::Set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CLI, Error> {
        let matches = CLI::command().try_get_matches_from(args)?;
        CLI::from_arg_matches(&matches)
    }

    #[test]
    fn command_is_well_formed() {
        CLI::command().debug_assert();
    }

    #[test]
    fn classify_defaults_to_hash() {
        let Ok(CLI::Classify(classify)) = parse(&["kwclass", "classify", "fn", "struct"]) else {
            panic!("expected classify");
        };
        assert_eq!(classify.words, ["fn", "struct"]);
        assert_eq!(classify.strategy, Strategy::Hash);
    }

    #[test]
    fn strategy_flag() {
        let Ok(CLI::Scan(scan)) = parse(&["kwclass", "scan", "-s", "bytewise", "main.v", "-a"])
        else {
            panic!("expected scan");
        };
        assert_eq!(scan.strategy, Strategy::Bytewise);
        assert_eq!(scan.file, PathBuf::from("main.v"));
        assert!(scan.annotate);

        assert!(parse(&["kwclass", "scan", "-s", "perfect", "main.v"]).is_err());
    }

    #[test]
    fn dump_selection() {
        let Ok(CLI::Dump(dump)) = parse(&["kwclass", "dump"]) else {
            panic!("expected dump");
        };
        assert!(dump.hash && dump.trie);

        let Ok(CLI::Dump(dump)) = parse(&["kwclass", "dump", "--trie"]) else {
            panic!("expected dump");
        };
        assert!(!dump.hash && dump.trie);
    }

    #[test]
    fn bench_total_time() {
        let Ok(CLI::Bench(bench)) = parse(&["kwclass", "bench", "x.v", "--total-time", "0.5"])
        else {
            panic!("expected bench");
        };
        assert_eq!(bench.total_time, 0.5);
    }

    #[test]
    fn bench_rejects_bad_total_time() {
        for secs in ["-1", "0", "inf", "-inf", "NaN", "soon"] {
            let arg = format!("--total-time={secs}");
            assert!(parse(&["kwclass", "bench", "x.v", arg.as_str()]).is_err(), "{secs}");
        }
    }
}
