use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::Error;
use crate::rules::GrammarRule;
use crate::syntree::SynTree;

/// Accumulates constituent and rule counts over a treebank, then derives
/// maximum-likelihood rule probabilities.
///
/// Counting and probability estimation are separate passes so the raw counts
/// can be inspected before any division happens.
#[derive(Debug, Default)]
pub struct RuleInducer {
  /// Times each symbol occupied an LHS position
  constituent_counts: HashMap<String, usize>,
  /// LHS -> RHS sequence -> times that production was used
  rule_counts: HashMap<String, HashMap<Vec<String>, usize>>,
  /// Words observed at terminal positions
  terminals: HashSet<String>,
}

impl RuleInducer {
  pub fn new() -> Self {
    Default::default()
  }

  /// Full pre-order traversal. Every non-terminal node contributes one LHS
  /// count and one count for the RHS sequence formed by its children's
  /// labels; terminal nodes contribute their word to the terminal set.
  pub fn count_tree(&mut self, tree: &SynTree) {
    if tree.is_terminal() {
      self.terminals.insert(tree.label().to_string());
      return;
    }

    let lhs = tree.label().to_string();
    *self.constituent_counts.entry(lhs.clone()).or_insert(0) += 1;
    *self
      .rule_counts
      .entry(lhs)
      .or_default()
      .entry(tree.child_labels())
      .or_insert(0) += 1;

    for child in tree.children() {
      self.count_tree(child);
    }
  }

  /// Counts a line-oriented treebank, one bracketed tree per line.
  /// Blank lines are skipped; a malformed line aborts the whole read.
  pub fn count_reader<R: BufRead>(&mut self, reader: R) -> Result<usize, Error> {
    let mut trees = 0;
    for line in reader.lines() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }
      let tree: SynTree = line.parse()?;
      self.count_tree(&tree);
      trees += 1;
    }
    debug!(trees, "counted treebank");
    Ok(trees)
  }

  pub fn count_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, Error> {
    let file = File::open(path)?;
    self.count_reader(BufReader::new(file))
  }

  pub fn terminals(&self) -> &HashSet<String> {
    &self.terminals
  }

  pub fn constituent_count(&self, lhs: &str) -> usize {
    self.constituent_counts.get(lhs).copied().unwrap_or(0)
  }

  pub fn rule_count(&self, lhs: &str, rhs: &[String]) -> usize {
    self
      .rule_counts
      .get(lhs)
      .and_then(|m| m.get(rhs))
      .copied()
      .unwrap_or(0)
  }

  /// Maximum-likelihood estimate: `count(lhs -> rhs) / count(lhs)` for every
  /// distinct production observed. A rule is lexical iff its RHS is a single
  /// symbol that only ever appeared at a terminal position.
  ///
  /// The result is sorted by `(lhs, rhs)` so induced grammars are stable
  /// across runs.
  pub fn calculate_probs(&self) -> Vec<GrammarRule> {
    let mut rules = Vec::new();
    for (lhs, rhs_counts) in self.rule_counts.iter() {
      let denominator = self.constituent_counts[lhs] as f64;
      for (rhs, count) in rhs_counts.iter() {
        let probability = *count as f64 / denominator;
        let lexical = rhs.len() == 1 && self.terminals.contains(&rhs[0]);
        rules.push(GrammarRule::new(
          lhs.clone(),
          rhs.clone(),
          probability,
          lexical,
        ));
      }
    }
    rules.sort_by(|a, b| (&a.lhs, &a.rhs).cmp(&(&b.lhs, &b.rhs)));

    debug!(
      rules = rules.len(),
      terminals = self.terminals.len(),
      "derived grammar"
    );
    rules
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn inducer_over(trees: &[&str]) -> RuleInducer {
    let mut inducer = RuleInducer::new();
    for src in trees {
      inducer.count_tree(&src.parse().unwrap());
    }
    inducer
  }

  #[test]
  fn test_counts() {
    let inducer = inducer_over(&[
      "(S (NP (N dog)) (VP (V barks)))",
      "(S (NP (N cat)) (VP (V purrs)))",
    ]);

    assert_eq!(inducer.constituent_count("S"), 2);
    assert_eq!(inducer.constituent_count("N"), 2);
    assert_eq!(
      inducer.rule_count("S", &["NP".to_string(), "VP".to_string()]),
      2
    );
    assert_eq!(inducer.rule_count("N", &["dog".to_string()]), 1);
    assert!(inducer.terminals().contains("barks"));
    assert!(!inducer.terminals().contains("NP"));
  }

  #[test]
  fn test_lhs_counts_match_rule_totals() {
    let inducer = inducer_over(&[
      "(S (NP (N dog)) (VP (V barks)))",
      "(S (VP (V run)))",
      "(S (NP (N cat)) (VP (V purrs)))",
    ]);

    // for every LHS, the rule counts under it sum to its constituent count
    for (lhs, rhs_counts) in inducer.rule_counts.iter() {
      let total: usize = rhs_counts.values().sum();
      assert_eq!(total, inducer.constituent_count(lhs), "lhs {}", lhs);
    }
  }

  #[test]
  fn test_probs_sum_to_one() {
    let inducer = inducer_over(&[
      "(S (NP (N dog)) (VP (V barks)))",
      "(S (VP (V run)))",
      "(S (NP (N dog)) (VP (V barks) (NP (N cat))))",
    ]);
    let rules = inducer.calculate_probs();

    let mut by_lhs: HashMap<&str, f64> = HashMap::new();
    for rule in rules.iter() {
      *by_lhs.entry(rule.lhs.as_str()).or_insert(0.0) += rule.weight;
    }
    for (lhs, total) in by_lhs {
      assert!((total - 1.0).abs() < 1e-9, "{} sums to {}", lhs, total);
    }
  }

  #[test]
  fn test_lexical_flag() {
    let inducer = inducer_over(&["(S (NP (N dog)) (VP (V barks)))"]);
    let rules = inducer.calculate_probs();

    let n_dog = rules
      .iter()
      .find(|r| r.lhs == "N" && r.rhs == ["dog"])
      .unwrap();
    assert!(n_dog.lexical);

    // S -> NP VP and NP -> N are not lexical
    assert!(rules.iter().all(|r| r.lhs != "S" || !r.lexical));
    let np_n = rules
      .iter()
      .find(|r| r.lhs == "NP" && r.rhs == ["N"])
      .unwrap();
    assert!(!np_n.lexical);
    assert!(np_n.is_unary());
  }

  #[test]
  fn test_count_reader() {
    let mut inducer = RuleInducer::new();
    let treebank = "(S (NP (N dog)) (VP (V barks)))\n\n(S (NP (N cat)) (VP (V purrs)))\n";
    let trees = inducer.count_reader(treebank.as_bytes()).unwrap();
    assert_eq!(trees, 2);
    assert_eq!(inducer.constituent_count("S"), 2);

    let mut inducer = RuleInducer::new();
    assert!(inducer.count_reader("(S (NP".as_bytes()).is_err());
  }
}
