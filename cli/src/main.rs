use std::env;
use std::io;
use std::process;

use spruce::binarize::Binarizer;
use spruce::cyk;
use spruce::generate::SentenceGenerator;
use spruce::grammar::Grammar;
use spruce::index::GrammarIndex;
use spruce::induce::RuleInducer;
use spruce::Err;

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} FILE [options]

Reads FILE as a binarized PCFG and parses whitespace-tokenized sentences
from stdin, one per line, printing the best parse with its score, or NULL
when a sentence has no parse.

Options:
  -h, --help        Print this message
  -i, --induce      Treat FILE as a treebank of bracketed trees and induce
                    a (binarized) grammar from it
  -s, --shared      Share intermediate rules when binarizing (implies -i)
  -d, --dump        Print the grammar before reading sentences
  -c, --chart       Print the parse chart for each sentence
  -g, --generate N  Generate N random sentences instead of parsing",
    prog_name
  )
}

fn parse(index: &GrammarIndex, sentence: &str, print_chart: bool) {
  let words = sentence.split_whitespace().collect::<Vec<_>>();

  if print_chart {
    if let Ok(chart) = cyk::parse_chart(index, &words) {
      println!("chart:\n{}", chart);
    }
  }

  match index.parse(&words) {
    Ok(parse) => println!("{}", parse),
    Err(_) => println!("{}", cyk::NO_PARSE),
  }
}

struct Args {
  filename: String,
  induce: bool,
  shared: bool,
  dump: bool,
  print_chart: bool,
  generate: Option<usize>,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "spruce"));
    }

    let args_len = v.len();
    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap();

    if args_len < 2 {
      return Err(Self::make_error_message("not enough arguments", prog_name));
    }

    let mut filename: Option<String> = None;
    let mut induce = false;
    let mut shared = false;
    let mut dump = false;
    let mut print_chart = false;
    let mut generate: Option<usize> = None;
    let mut wants_count = false;

    for o in iter {
      if wants_count {
        match o.parse::<usize>() {
          Ok(n) => generate = Some(n),
          Err(_) => return Err(Self::make_error_message("bad sentence count", prog_name)),
        }
        wants_count = false;
      } else if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-i" || o == "--induce" {
        induce = true;
      } else if o == "-s" || o == "--shared" {
        shared = true;
      } else if o == "-d" || o == "--dump" {
        dump = true;
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if o == "-g" || o == "--generate" {
        wants_count = true;
      } else if filename.is_none() {
        filename = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    if wants_count {
      return Err(Self::make_error_message("--generate needs a count", prog_name));
    }

    if let Some(filename) = filename {
      Ok(Self {
        filename,
        induce,
        shared,
        dump,
        print_chart,
        generate,
      })
    } else {
      Err(Self::make_error_message("missing filename", prog_name))
    }
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let grammar = if opts.induce || opts.shared {
    let mut inducer = RuleInducer::new();
    inducer.count_file(&opts.filename)?;
    let rules = inducer.calculate_probs();
    let mut binarizer = Binarizer::new();
    let rules = if opts.shared {
      binarizer.binarize_shared(&rules)
    } else {
      binarizer.binarize(&rules)
    };
    Grammar::new(rules)
  } else {
    Grammar::read_from_file(&opts.filename)?
  };

  if opts.dump {
    print!("{}", grammar);
  }

  if let Some(n) = opts.generate {
    let generator = SentenceGenerator::new(&grammar);
    for sentence in generator.sample(n) {
      println!("{}", sentence);
    }
    return Ok(());
  }

  let index = grammar.index()?;

  let mut input = String::new();
  loop {
    match io::stdin().read_line(&mut input) {
      Ok(0) => return Ok(()),
      Ok(_) => {
        parse(&index, input.trim(), opts.print_chart);
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
