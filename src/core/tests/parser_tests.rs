use crate::core::parser::{key_code, key_name, parse_shortcut, ParseError};
use crate::core::ModifierMask;

#[test]
fn test_parse_single_key() {
    let combo = parse_shortcut("F1").unwrap();
    assert_eq!(combo.key_code, 122);
    assert!(combo.modifiers.is_empty());
}

#[test]
fn test_parse_modifiers_any_order() {
    let a = parse_shortcut("CMD+SHIFT+K").unwrap();
    let b = parse_shortcut("shift+cmd+k").unwrap();

    assert_eq!(a, b);
    assert_eq!(a.modifiers, ModifierMask::COMMAND | ModifierMask::SHIFT);
}

#[test]
fn test_parse_with_whitespace_and_aliases() {
    let combo = parse_shortcut(" ctrl + alt + esc ").unwrap();
    assert_eq!(combo.key_code, 53);
    assert_eq!(combo.modifiers, ModifierMask::CONTROL | ModifierMask::OPTION);
}

#[test]
fn test_parse_raw_key_code() {
    let combo = parse_shortcut("OPT+#49").unwrap();
    assert_eq!(combo.key_code, 49);
    assert_eq!(combo.modifiers, ModifierMask::OPTION);
}

#[test]
fn test_unknown_modifier() {
    assert_eq!(
        parse_shortcut("HYPER+K"),
        Err(ParseError::UnknownModifier("HYPER".to_string()))
    );
}

#[test]
fn test_unknown_key() {
    assert_eq!(
        parse_shortcut("CMD+NOPE"),
        Err(ParseError::UnknownKey("NOPE".to_string()))
    );
}

#[test]
fn test_dangling_separator_is_syntax_error() {
    assert!(matches!(parse_shortcut("CMD+"), Err(ParseError::InvalidSyntax(_))));
    assert!(matches!(parse_shortcut(""), Err(ParseError::InvalidSyntax(_))));
}

#[test]
fn test_display_round_trips_through_parser() {
    let combo = parse_shortcut("cmd+shift+space").unwrap();
    let text = combo.to_string();

    assert_eq!(text, "CMD+SHIFT+SPACE");
    assert_eq!(parse_shortcut(&text).unwrap(), combo);
}

#[test]
fn test_key_table_lookups() {
    assert_eq!(key_name(49), Some("SPACE"));
    assert_eq!(key_code("return"), Some(36));
    assert_eq!(key_code("enter"), Some(36));
    assert_eq!(key_name(500), None);
}
