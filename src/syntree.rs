use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::Error;

/// A node in a bracketed parse tree: either a constituent with ordered
/// children, or a terminal word.
#[derive(Debug, Clone, PartialEq)]
pub enum SynTree {
  Branch(String, Vec<SynTree>),
  Leaf(String),
}

impl SynTree {
  pub fn label(&self) -> &str {
    match self {
      Self::Branch(label, _) => label,
      Self::Leaf(word) => word,
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Leaf(_))
  }

  pub fn children(&self) -> &[SynTree] {
    match self {
      Self::Branch(_, children) => children,
      Self::Leaf(_) => &[],
    }
  }

  /// Labels of the immediate children -- the RHS of the rule this node used.
  pub fn child_labels(&self) -> Vec<String> {
    self
      .children()
      .iter()
      .map(|c| c.label().to_string())
      .collect()
  }
}

impl fmt::Display for SynTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(word) => write!(f, "{}", word),
      Self::Branch(label, children) => {
        write!(f, "({}", label)?;
        for child in children.iter() {
          write!(f, " {}", child)?;
        }
        write!(f, ")")
      }
    }
  }
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Error>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  if let Some(caps) = re.captures(s) {
    let m = caps.get(0).unwrap();
    if m.start() > 0 {
      return (None, s);
    }
    let (_, rest) = s.split_at(m.end());
    (Some(m.as_str()), rest)
  } else {
    (None, s)
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  let mut iter = s.char_indices().peekable();
  if let Some((_, c1)) = iter.next() {
    if c == c1 {
      let rest = if let Some((idx, _)) = iter.peek() {
        s.split_at(*idx).1
      } else {
        ""
      };
      return (Some(c), rest);
    }
  }
  (None, s)
}

/// Try to consume a char, failing if it doesn't match
fn needed_char(c: char, s: &str) -> ParseResult<'_, char> {
  if let (Some(c), rest) = optional_char(c, s) {
    Ok((c, rest))
  } else {
    Err(Error::TreeSyntax(format!("expected {} at {:?}", c, s)))
  }
}

fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE, r"\s+");
  optional_re(&*WHITESPACE, s).1
}

/// A label or word: anything that isn't whitespace or a bracket
fn parse_token(s: &str) -> ParseResult<'_, &str> {
  regex_static!(TOKEN, r"[^\s()]+");
  if let (Some(tok), rest) = optional_re(&*TOKEN, s) {
    Ok((tok, rest))
  } else {
    Err(Error::TreeSyntax(format!("expected token at {:?}", s)))
  }
}

/// `( label child... )`, where a child is either a nested bracket or a word
fn parse_tree(s: &str) -> ParseResult<'_, SynTree> {
  let (_, s) = needed_char('(', s)?;
  let s = skip_whitespace(s);
  let (label, s) = parse_token(s)?;

  let mut children = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if let (Some(_), s) = optional_char(')', rem) {
      rem = s;
      break;
    }
    if rem.starts_with('(') {
      let (child, s) = parse_tree(rem)?;
      children.push(child);
      rem = s;
    } else {
      let (word, s) = parse_token(rem)?;
      children.push(SynTree::Leaf(word.to_string()));
      rem = s;
    }
  }

  if children.is_empty() {
    return Err(Error::TreeSyntax(format!(
      "constituent {} has no children",
      label
    )));
  }

  Ok((SynTree::Branch(label.to_string(), children), rem))
}

impl FromStr for SynTree {
  type Err = Error;

  /// Parses one bracketed tree, e.g. `(S (NP (N dog)) (VP (V barks)))`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (tree, rem) = parse_tree(skip_whitespace(s))?;
    let rem = skip_whitespace(rem);
    if rem.is_empty() {
      Ok(tree)
    } else {
      Err(Error::TreeSyntax(format!("trailing input at {:?}", rem)))
    }
  }
}

#[test]
fn test_parse_tree() {
  let t: SynTree = "(S (NP (N dog)) (VP (V barks)))".parse().unwrap();
  assert_eq!(t.label(), "S");
  assert_eq!(t.child_labels(), vec!["NP", "VP"]);

  let np = &t.children()[0];
  assert!(!np.is_terminal());
  assert_eq!(np.child_labels(), vec!["N"]);
  assert!(np.children()[0].children()[0].is_terminal());
}

#[test]
fn test_tree_round_trip() {
  let src = "(S (NP (DT the) (N dog)) (VP (V barks)))";
  let t: SynTree = src.parse().unwrap();
  assert_eq!(format!("{}", t), src);
  assert_eq!(format!("{}", t).parse::<SynTree>().unwrap(), t);
}

#[test]
fn test_parse_tree_rejects_garbage() {
  assert!("".parse::<SynTree>().is_err());
  assert!("(S".parse::<SynTree>().is_err());
  assert!("(S)".parse::<SynTree>().is_err());
  assert!("(S (NP dog)) extra".parse::<SynTree>().is_err());
}
