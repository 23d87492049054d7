//! Property-based tests for template rendering
//!
//! Templates are generated as sequences of literal pieces (text, whitespace,
//! line breaks) and placeholders with arbitrary inner whitespace. Arbitrary
//! brace-heavy strings check that malformed input fails cleanly.

use std::collections::HashMap;

use brace_template::Template;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Piece {
    Literal(String),
    Placeholder { name: String, marker: String },
}

fn literal_strategy() -> impl Strategy<Value = Piece> {
    prop_oneof![
        // Words, no braces
        "[a-z_]{1,8}",
        // Whitespace runs
        "[ \t]{1,3}",
        Just("\n".to_string()),
    ]
    .prop_map(Piece::Literal)
}

fn placeholder_strategy() -> impl Strategy<Value = Piece> {
    ("[ \t]{0,2}", "([A-Z][a-z]{0,4}){1,2}", "[ \t]{0,2}").prop_map(|(before, name, after)| {
        Piece::Placeholder {
            marker: format!("{{{{{before}.{name}{after}}}}}"),
            name,
        }
    })
}

fn template_strategy() -> impl Strategy<Value = Vec<Piece>> {
    prop::collection::vec(prop_oneof![literal_strategy(), placeholder_strategy()], 1..8)
}

fn source(pieces: &[Piece]) -> String {
    pieces
        .iter()
        .map(|piece| match piece {
            Piece::Literal(text) => text.as_str(),
            Piece::Placeholder { marker, .. } => marker.as_str(),
        })
        .collect()
}

fn value_for(name: &str) -> String {
    format!("<{}>", name.to_lowercase())
}

proptest! {
    #[test]
    fn test_unresolved_template_round_trips(pieces in template_strategy()) {
        let source = source(&pieces);
        let template = Template::parse(&source);
        prop_assert!(template.is_ok(), "Failed to parse: {:?}", source);

        let mut out = Vec::new();
        template.unwrap().write(&mut out).unwrap();
        prop_assert_eq!(String::from_utf8(out).unwrap(), source);
    }

    #[test]
    fn test_full_substitution(pieces in template_strategy()) {
        let source = source(&pieces);
        let mut data = HashMap::new();
        let mut expected = String::new();
        for piece in &pieces {
            match piece {
                Piece::Literal(text) => expected.push_str(text),
                Piece::Placeholder { name, .. } => {
                    data.insert(name.clone(), value_for(name));
                    expected.push_str(&value_for(name));
                }
            }
        }

        let mut template = Template::parse(&source).unwrap();
        let mut out = Vec::new();
        template.execute(&mut out, &data).unwrap();
        prop_assert_eq!(String::from_utf8(out).unwrap(), expected);
        prop_assert!(template.unresolved().is_empty());
    }

    #[test]
    fn test_arbitrary_input_parses_or_fails(source in "[{}. \t\nAaZb\r_é]{0,24}") {
        // Either outcome is fine; an accepted template must write itself back.
        if let Ok(template) = Template::parse(&source) {
            let mut out = Vec::new();
            template.write(&mut out).unwrap();
            prop_assert_eq!(String::from_utf8(out).unwrap(), source.replace("\r\n", "\n"));
        }
    }

    #[test]
    fn test_unresolved_names_in_order(pieces in template_strategy()) {
        let names: Vec<&str> = pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Placeholder { name, .. } => Some(name.as_str()),
                Piece::Literal(_) => None,
            })
            .collect();

        let template = Template::parse(&source(&pieces)).unwrap();
        prop_assert_eq!(template.unresolved(), names);
    }
}
