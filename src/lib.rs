#[macro_use]
extern crate lazy_static;

pub mod binarize;
pub mod cyk;
pub mod error;
pub mod generate;
pub mod grammar;
pub mod index;
pub mod induce;
pub mod rules;
pub mod syntree;

pub use crate::error::Error;

/// Boxed static error type
pub type Err = Box<dyn std::error::Error + 'static>;

use crate::cyk::{best_parse, ParseFailure, ParsedSentence};
use crate::grammar::{Grammar, START_SYMBOL};
use crate::index::GrammarIndex;

impl Grammar {
  /// Builds the parser-facing index for this grammar.
  /// Fails if the grammar has not been binarized.
  pub fn index(&self) -> Result<GrammarIndex, Error> {
    GrammarIndex::from_rules(&self.rules)
  }
}

impl GrammarIndex {
  /// The best parse of `words`, rooted at the designated start symbol.
  pub fn parse(&self, words: &[&str]) -> Result<ParsedSentence, ParseFailure> {
    best_parse(self, words, START_SYMBOL)
  }
}

#[test]
fn test_induce_binarize_parse() {
  use crate::binarize::Binarizer;
  use crate::induce::RuleInducer;

  let treebank = "\
(S (NP (N dog)) (VP (V barks)))
(S (NP (DT the) (N dog)) (VP (V gives) (NP (N cat)) (NP (N bone))))
(S (NP (N cat)) (VP (V purrs)))
";

  let mut inducer = RuleInducer::new();
  assert_eq!(inducer.count_reader(treebank.as_bytes()).unwrap(), 3);

  let rules = inducer.calculate_probs();
  let grammar = Grammar::new(Binarizer::new().binarize_shared(&rules));

  // VP -> V NP NP was the only super-binary rule
  assert!(grammar.rules.iter().any(|r| r.lhs == "X1" && r.rhs == ["V", "NP"]));
  assert!(grammar.rules.iter().all(|r| r.len() <= 2));

  // the persisted text form round-trips
  let reparsed: Grammar = grammar.to_string().parse().unwrap();
  assert_eq!(reparsed, grammar);

  let index = grammar.index().unwrap();
  let parse = index
    .parse(&["the", "dog", "gives", "cat", "bone"])
    .unwrap();

  assert_eq!(
    format!("{}", parse.tree),
    "(S (NP (DT the) (N dog)) (VP (X1 (V gives) (NP (N cat))) (NP (N bone))))"
  );
  // NP [0,1] = 8/5, X1 [2,3] = 38/15, VP [2,4] = 58/15, S = 97/15
  assert!((parse.score - 97.0 / 15.0).abs() < 1e-9);

  assert_eq!(
    index.parse(&["the", "platypus", "barks"]),
    Err(ParseFailure::UnknownWord("platypus".to_string()))
  );
}
