use std::collections::HashMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::grammar::Grammar;

/// Symbols that are bare punctuation placeholders: even when the grammar has
/// productions for them, they are emitted as words rather than expanded.
const PUNCTUATION: [&str; 3] = [".", ",", "$"];

/// Samples sentences top-down from a weighted grammar, choosing each
/// production with probability proportional to its weight among the
/// productions sharing its LHS.
///
/// Best-effort: a grammar whose recursive rules have unbounded expected
/// expansion depth may take arbitrarily long to bottom out.
pub struct SentenceGenerator {
  start: String,
  productions: HashMap<String, Production>,
}

struct Production {
  options: Vec<Vec<String>>,
  dist: WeightedIndex<f64>,
}

impl SentenceGenerator {
  pub fn new(grammar: &Grammar) -> Self {
    let mut grouped: HashMap<String, Vec<(Vec<String>, f64)>> = HashMap::new();
    for rule in grammar.rules.iter().filter(|r| r.weight > 0.0) {
      grouped
        .entry(rule.lhs.clone())
        .or_default()
        .push((rule.rhs.clone(), rule.weight));
    }

    let productions = grouped
      .into_iter()
      .map(|(lhs, options)| {
        let dist = WeightedIndex::new(options.iter().map(|(_, weight)| *weight))
          .expect("per-LHS weights are positive");
        let production = Production {
          options: options.into_iter().map(|(rhs, _)| rhs).collect(),
          dist,
        };
        (lhs, production)
      })
      .collect();

    Self {
      start: grammar.start.clone(),
      productions,
    }
  }

  pub fn generate<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<String> {
    (0..n).map(|_| self.sentence(rng)).collect()
  }

  /// [`generate`](Self::generate) with a thread-local RNG.
  pub fn sample(&self, n: usize) -> Vec<String> {
    self.generate(n, &mut rand::thread_rng())
  }

  /// One sentence, sampled from the start symbol down.
  pub fn sentence<R: Rng>(&self, rng: &mut R) -> String {
    let mut words = Vec::new();
    self.expand(&self.start, &mut words, rng);
    words.join(" ")
  }

  fn expand<R: Rng>(&self, symbol: &str, words: &mut Vec<String>, rng: &mut R) {
    let production = match self.productions.get(symbol) {
      Some(p) if !PUNCTUATION.contains(&symbol) => p,
      // a terminal, or a placeholder that shouldn't be expanded further
      _ => {
        words.push(symbol.to_string());
        return;
      }
    };

    let choice = &production.options[production.dist.sample(rng)];
    for next in choice.iter() {
      self.expand(next, words, rng);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[test]
  fn test_deterministic_grammar() {
    let g: Grammar = "S -> NP VP\t1\nNP -> dog\t1\nVP -> barks\t1\n".parse().unwrap();
    let generator = SentenceGenerator::new(&g);
    let mut rng = StdRng::seed_from_u64(7);

    for sentence in generator.generate(5, &mut rng) {
      assert_eq!(sentence, "dog barks");
    }
  }

  #[test]
  fn test_same_seed_same_sentences() {
    let g: Grammar =
      "S -> NP VP\t1\nNP -> dog\t0.5\nNP -> cat\t0.5\nVP -> barks\t0.25\nVP -> purrs\t0.75\n"
        .parse()
        .unwrap();
    let generator = SentenceGenerator::new(&g);

    let first = generator.generate(20, &mut StdRng::seed_from_u64(42));
    let second = generator.generate(20, &mut StdRng::seed_from_u64(42));
    assert_eq!(first, second);

    for sentence in first {
      let words: Vec<&str> = sentence.split(' ').collect();
      assert!(matches!(words[0], "dog" | "cat"));
      assert!(matches!(words[1], "barks" | "purrs"));
    }
  }

  #[test]
  fn test_punctuation_is_not_expanded() {
    // "." has a production but is a placeholder: it must be emitted, not
    // expanded through it
    let g: Grammar = "S -> NP .\t1\nNP -> dog\t1\n. -> !\t1\n".parse().unwrap();
    let generator = SentenceGenerator::new(&g);
    let mut rng = StdRng::seed_from_u64(0);

    assert_eq!(generator.sentence(&mut rng), "dog .");
  }

  #[test]
  fn test_zero_weight_rules_are_never_chosen() {
    let g: Grammar = "S -> NP\t0\nS -> VP\t1\nNP -> dog\t1\nVP -> barks\t1\n"
      .parse()
      .unwrap();
    let generator = SentenceGenerator::new(&g);
    let mut rng = StdRng::seed_from_u64(3);

    for sentence in generator.generate(10, &mut rng) {
      assert_eq!(sentence, "barks");
    }
  }
}
