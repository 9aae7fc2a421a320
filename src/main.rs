use spruce::binarize::Binarizer;
use spruce::cyk::NO_PARSE;
use spruce::grammar::Grammar;
use spruce::induce::RuleInducer;
use spruce::Err;

const TREEBANK: &str = r#"
(S (NP (N dog)) (VP (V barks)))
(S (NP (DT the) (N dog)) (VP (V gives) (NP (N cat)) (NP (N bone))))
(S (NP (N cat)) (VP (V purrs)))
(S (NP (DT the) (N cat)) (VP (V bites) (NP (N dog))))
"#;

fn main() -> Result<(), Err> {
    let mut inducer = RuleInducer::new();
    for line in TREEBANK.lines().filter(|l| !l.trim().is_empty()) {
        inducer.count_tree(&line.parse()?);
    }

    let rules = Binarizer::new().binarize_shared(&inducer.calculate_probs());
    let grammar = Grammar::new(rules);
    println!("induced grammar:\n{}", grammar);

    let index = grammar.index()?;
    for sentence in ["the dog bites cat", "dog purrs", "cat gives dog bone"] {
        let words = sentence.split(' ').collect::<Vec<_>>();
        match index.parse(&words) {
            Ok(parse) => println!("{}", parse),
            Err(_) => println!("{}", NO_PARSE),
        }
    }

    Ok(())
}
