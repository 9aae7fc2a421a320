use std::collections::HashMap;

use tracing::debug;

use crate::rules::GrammarRule;

/// Rewrites rules whose RHS is longer than two symbols into chains of binary
/// rules over fresh intermediate symbols `X1, X2, ...`.
///
/// The symbol counter lives on the binarizer value rather than in process
/// state, so independent runs number their intermediates independently.
#[derive(Debug)]
pub struct Binarizer {
  next_symbol: usize,
}

impl Default for Binarizer {
  fn default() -> Self {
    Self::new()
  }
}

impl Binarizer {
  pub fn new() -> Self {
    Self { next_symbol: 1 }
  }

  fn fresh_symbol(&mut self) -> String {
    let symbol = format!("X{}", self.next_symbol);
    self.next_symbol += 1;
    symbol
  }

  /// Peels the first two RHS symbols into an intermediate rule until the
  /// remainder is binary. Intermediates are deterministic rewrites, not
  /// probabilistic choices, so they carry weight 1.0; the final reduced rule
  /// carries the original rule's whole weight. Rules that are already binary
  /// or shorter pass through unchanged.
  pub fn binarize(&mut self, rules: &[GrammarRule]) -> Vec<GrammarRule> {
    let start = self.next_symbol;
    let mut bin_rules = Vec::new();

    for rule in rules.iter() {
      if rule.len() <= 2 {
        bin_rules.push(rule.clone());
        continue;
      }

      let mut rhs = rule.rhs.clone();
      while rhs.len() > 2 {
        let symbol = self.fresh_symbol();
        let pair = vec![rhs[0].clone(), rhs[1].clone()];
        bin_rules.push(GrammarRule::new(symbol.clone(), pair, 1.0, false));

        let mut reduced = Vec::with_capacity(rhs.len() - 1);
        reduced.push(symbol);
        reduced.extend_from_slice(&rhs[2..]);
        rhs = reduced;
      }
      bin_rules.push(GrammarRule::new(rule.lhs.clone(), rhs, rule.weight, false));
    }

    debug!(
      minted = self.next_symbol - start,
      rules = bin_rules.len(),
      "binarized grammar"
    );
    bin_rules
  }

  /// Like [`binarize`](Self::binarize), but a peeled pair that already has an
  /// intermediate rule anywhere in this call reuses that rule's symbol
  /// instead of minting (and re-emitting) a new one. Shared symbols are still
  /// numbered sequentially from `X1` in first-use order.
  pub fn binarize_shared(&mut self, rules: &[GrammarRule]) -> Vec<GrammarRule> {
    let start = self.next_symbol;
    let mut seen: HashMap<(String, String), String> = HashMap::new();
    let mut bin_rules = Vec::new();

    for rule in rules.iter() {
      if rule.len() <= 2 {
        bin_rules.push(rule.clone());
        continue;
      }

      let mut rhs = rule.rhs.clone();
      while rhs.len() > 2 {
        let pair = (rhs[0].clone(), rhs[1].clone());
        let symbol = match seen.get(&pair) {
          Some(symbol) => symbol.clone(),
          None => {
            let symbol = self.fresh_symbol();
            bin_rules.push(GrammarRule::new(
              symbol.clone(),
              vec![pair.0.clone(), pair.1.clone()],
              1.0,
              false,
            ));
            seen.insert(pair, symbol.clone());
            symbol
          }
        };

        let mut reduced = Vec::with_capacity(rhs.len() - 1);
        reduced.push(symbol);
        reduced.extend_from_slice(&rhs[2..]);
        rhs = reduced;
      }
      bin_rules.push(GrammarRule::new(rule.lhs.clone(), rhs, rule.weight, false));
    }

    debug!(
      minted = self.next_symbol - start,
      rules = bin_rules.len(),
      "binarized grammar with sharing"
    );
    bin_rules
  }
}
