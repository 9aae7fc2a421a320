use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::Error;
use crate::rules::GrammarRule;

/// The designated start symbol: full-sentence parses must be rooted here,
/// and generation starts here.
pub const START_SYMBOL: &str = "S";

/// A flat weighted rule list with a designated start symbol.
///
/// The textual form is line-oriented, one rule per line in the
/// `LHS -> RHS1 RHS2 ...<TAB>weight` shape produced by [`GrammarRule`]'s
/// `Display`; `FromStr` re-parses that same form, so persisted grammars
/// round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
  pub start: String,
  pub rules: Vec<GrammarRule>,
}

impl Grammar {
  pub fn new(rules: Vec<GrammarRule>) -> Self {
    Self {
      start: START_SYMBOL.to_string(),
      rules,
    }
  }

  pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
    fs::read_to_string(path)?.parse()
  }

  pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
    fs::write(path, self.to_string())?;
    Ok(())
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for rule in self.rules.iter() {
      writeln!(f, "{}", rule)?;
    }
    Ok(())
  }
}

impl FromStr for Grammar {
  type Err = Error;

  /// Parses a line-oriented grammar. The last whitespace-separated token of
  /// a line is the weight; the text before `->` is the LHS. Terminal-ness is
  /// contextual: a 1-symbol RHS is lexical iff its symbol never occurs as an
  /// LHS anywhere in the rule set.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut parsed: Vec<(String, Vec<String>, f64)> = Vec::new();

    for (num, line) in s.lines().enumerate() {
      let line = line.trim();
      if line.is_empty() {
        continue;
      }

      let (lhs, rest) = line
        .split_once("->")
        .ok_or_else(|| Error::GrammarSyntax(format!("line {}: missing `->`", num + 1)))?;

      let lhs = lhs.trim();
      if lhs.is_empty() || lhs.contains(char::is_whitespace) {
        return Err(Error::GrammarSyntax(format!(
          "line {}: bad LHS {:?}",
          num + 1,
          lhs
        )));
      }

      let mut symbols: Vec<&str> = rest.split_whitespace().collect();
      let weight = match symbols.pop() {
        Some(tok) => tok.parse::<f64>().map_err(|_| {
          Error::GrammarSyntax(format!("line {}: bad weight {:?}", num + 1, tok))
        })?,
        None => {
          return Err(Error::GrammarSyntax(format!(
            "line {}: missing weight",
            num + 1
          )));
        }
      };

      if symbols.is_empty() {
        return Err(Error::GrammarSyntax(format!(
          "line {}: empty RHS",
          num + 1
        )));
      }

      parsed.push((
        lhs.to_string(),
        symbols.into_iter().map(|s| s.to_string()).collect(),
        weight,
      ));
    }

    if parsed.is_empty() {
      return Err(Error::EmptyGrammar);
    }

    let lhs_symbols: HashSet<&str> = parsed.iter().map(|(lhs, _, _)| lhs.as_str()).collect();
    let rules = parsed
      .iter()
      .map(|(lhs, rhs, weight)| {
        let lexical = rhs.len() == 1 && !lhs_symbols.contains(rhs[0].as_str());
        GrammarRule::new(lhs.clone(), rhs.clone(), *weight, lexical)
      })
      .collect::<Vec<_>>();

    debug!(rules = rules.len(), "parsed grammar");
    Ok(Self::new(rules))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SRC: &str = "S -> NP VP\t1\nNP -> N\t0.5\nNP -> DT N\t0.5\nN -> dog\t1\nVP -> barks\t1\nDT -> the\t1\n";

  #[test]
  fn test_grammar_round_trip() {
    let g: Grammar = SRC.parse().unwrap();
    assert_eq!(g.start, START_SYMBOL);
    assert_eq!(g.rules.len(), 6);
    assert_eq!(g.to_string(), SRC);
    assert_eq!(g.to_string().parse::<Grammar>().unwrap(), g);
  }

  #[test]
  fn test_lexical_inference() {
    let g: Grammar = SRC.parse().unwrap();

    let n_dog = g.rules.iter().find(|r| r.lhs == "N").unwrap();
    assert!(n_dog.lexical);

    // NP -> N is unary over a symbol that occurs as an LHS
    let np_n = g
      .rules
      .iter()
      .find(|r| r.lhs == "NP" && r.rhs == ["N"])
      .unwrap();
    assert!(!np_n.lexical);
    assert!(np_n.is_unary());
  }

  #[test]
  fn test_space_separated_weight() {
    // a hand-edited grammar with spaces instead of a tab still parses
    let g: Grammar = "S -> NP VP 0.25\nNP -> dog 1\nVP -> barks 1\n".parse().unwrap();
    assert_eq!(g.rules[0].weight, 0.25);
    assert_eq!(g.rules[0].rhs, ["NP", "VP"]);
  }

  #[test]
  fn test_rejects_malformed_lines() {
    assert!(matches!("".parse::<Grammar>(), Err(Error::EmptyGrammar)));
    assert!("S NP VP 1.0".parse::<Grammar>().is_err());
    assert!("S -> NP VP weight".parse::<Grammar>().is_err());
    assert!("S -> 1.0".parse::<Grammar>().is_err());
    assert!("S Q -> NP 1.0".parse::<Grammar>().is_err());
  }
}
