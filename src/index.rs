use std::collections::HashMap;

use tracing::debug;

use crate::error::Error;
use crate::rules::GrammarRule;

/// `LHS -> word`, where the word is a terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalRule {
  pub lhs: String,
  pub word: String,
  pub weight: f64,
}

/// `LHS -> RHS`, a single non-terminal on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryRule {
  pub lhs: String,
  pub rhs: String,
  pub weight: f64,
}

/// `LHS -> RHS1 RHS2`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryRule {
  pub lhs: String,
  pub rhs1: String,
  pub rhs2: String,
  pub weight: f64,
}

/// Parser-facing partition of a binarized rule list.
///
/// Rule shapes are fixed here, once, so the parser's hot path never
/// re-checks arities. The index is immutable after construction; a single
/// index can be shared read-only across threads parsing different sentences.
#[derive(Debug, Default)]
pub struct GrammarIndex {
  /// terminal word -> rules producing exactly that word
  lexical: HashMap<String, Vec<LexicalRule>>,
  /// RHS symbol -> unary rules deriving it, so "what can derive X" is one lookup
  unary: HashMap<String, Vec<UnaryRule>>,
  binary: Vec<BinaryRule>,
}

impl GrammarIndex {
  /// Partitions `rules`. Fails if any non-lexical rule has an RHS length
  /// outside {1, 2}: such a grammar has not been binarized and cannot be
  /// parsed correctly.
  pub fn from_rules(rules: &[GrammarRule]) -> Result<Self, Error> {
    let mut index = Self::default();

    for rule in rules.iter() {
      if rule.lexical {
        if rule.len() != 1 {
          return Err(Error::MalformedGrammar {
            rule: rule.to_string(),
            arity: rule.len(),
          });
        }
        index
          .lexical
          .entry(rule.rhs[0].clone())
          .or_default()
          .push(LexicalRule {
            lhs: rule.lhs.clone(),
            word: rule.rhs[0].clone(),
            weight: rule.weight,
          });
      } else {
        match rule.rhs.as_slice() {
          [rhs] => index.unary.entry(rhs.clone()).or_default().push(UnaryRule {
            lhs: rule.lhs.clone(),
            rhs: rhs.clone(),
            weight: rule.weight,
          }),
          [rhs1, rhs2] => index.binary.push(BinaryRule {
            lhs: rule.lhs.clone(),
            rhs1: rhs1.clone(),
            rhs2: rhs2.clone(),
            weight: rule.weight,
          }),
          _ => {
            return Err(Error::MalformedGrammar {
              rule: rule.to_string(),
              arity: rule.len(),
            });
          }
        }
      }
    }

    debug!(
      lexical = index.lexical.len(),
      unary = index.unary.len(),
      binary = index.binary.len(),
      "indexed grammar"
    );
    Ok(index)
  }

  /// All lexical rules producing `word`, or None if the word is unknown.
  pub fn lexical_rules(&self, word: &str) -> Option<&[LexicalRule]> {
    self.lexical.get(word).map(|rules| rules.as_slice())
  }

  /// All unary rules whose RHS is `rhs`.
  pub fn unary_rules(&self, rhs: &str) -> &[UnaryRule] {
    self.unary.get(rhs).map(|rules| rules.as_slice()).unwrap_or(&[])
  }

  pub fn binary_rules(&self) -> &[BinaryRule] {
    &self.binary
  }
}
