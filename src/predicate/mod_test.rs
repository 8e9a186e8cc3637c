//! Tests for predicate evaluation

use super::*;

fn entry() -> Entry {
    Entry::new(Level::Info, "test entry")
}

fn and(l: Predicate, r: Predicate) -> Predicate {
    Predicate::And(Box::new(l), Box::new(r))
}

fn or(l: Predicate, r: Predicate) -> Predicate {
    Predicate::Or(Box::new(l), Box::new(r))
}

// ============================================================================
// Boolean truth tables
// ============================================================================

#[test]
fn test_and_truth_table() {
    let e = entry();
    assert!(and(Predicate::True, Predicate::True).matches(&e));
    assert!(!and(Predicate::True, Predicate::False).matches(&e));
    assert!(!and(Predicate::False, Predicate::True).matches(&e));
    assert!(!and(Predicate::False, Predicate::False).matches(&e));
}

#[test]
fn test_or_truth_table() {
    let e = entry();
    assert!(or(Predicate::True, Predicate::True).matches(&e));
    assert!(or(Predicate::True, Predicate::False).matches(&e));
    assert!(or(Predicate::False, Predicate::True).matches(&e));
    assert!(!or(Predicate::False, Predicate::False).matches(&e));
}

#[test]
fn test_not_truth_table() {
    let e = entry();
    assert!(!Predicate::Not(Box::new(Predicate::True)).matches(&e));
    assert!(Predicate::Not(Box::new(Predicate::False)).matches(&e));
}

// ============================================================================
// Field operators
// ============================================================================

#[test]
fn test_prefix_matches_exact_text() {
    let e = entry().with_field("prefix", "auth");
    assert!(Predicate::Prefix("auth".into()).matches(&e));
    assert!(!Predicate::Prefix("auth2".into()).matches(&e));
}

#[test]
fn test_prefix_requires_text_field() {
    // A numeric prefix field is not text and never matches
    let e = entry().with_field("prefix", 7);
    assert!(!Predicate::Prefix("7".into()).matches(&e));

    // Missing field never matches
    assert!(!Predicate::Prefix("auth".into()).matches(&entry()));
}

#[test]
fn test_has_field() {
    let e = entry().with_field("user", "bob");
    assert!(Predicate::HasField("user".into()).matches(&e));
    assert!(!Predicate::HasField("group".into()).matches(&e));
}

// ============================================================================
// Comparisons through coercion
// ============================================================================

#[test]
fn test_equals_coerces_field_text() {
    // Field stored as text "500" coerces to Int 500
    let e = entry().with_field("status", "500");
    let p = Predicate::parse("Field('status') == 500").unwrap();
    assert!(p.matches(&e));

    let p = Predicate::parse("Field('status') == 404").unwrap();
    assert!(!p.matches(&e));
}

#[test]
fn test_equals_mismatched_kinds_is_false() {
    let e = entry().with_field("status", "ready");
    let p = Predicate::parse("Field('status') == 500").unwrap();
    assert!(!p.matches(&e));
}

#[test]
fn test_missing_field_is_nil() {
    let e = entry();
    assert!(Predicate::parse("Field('absent') == null").unwrap().matches(&e));
    assert!(!Predicate::parse("Field('absent') == 'x'").unwrap().matches(&e));
}

#[test]
fn test_greater_and_less() {
    let e = entry().with_field("ms", "1500").with_field("name", "beta");

    assert!(Predicate::parse("Field('ms') > 1000").unwrap().matches(&e));
    assert!(!Predicate::parse("Field('ms') > 1500").unwrap().matches(&e));
    assert!(Predicate::parse("Field('ms') < 2000").unwrap().matches(&e));

    // Lexicographic for strings
    assert!(Predicate::parse("Field('name') > 'alpha'").unwrap().matches(&e));
    assert!(Predicate::parse("Field('name') < 'gamma'").unwrap().matches(&e));

    // Mismatched kinds never order
    assert!(!Predicate::parse("Field('name') > 7").unwrap().matches(&e));
}

#[test]
fn test_ordering_desugar_semantics() {
    let e = entry().with_field("n", "5");

    assert!(Predicate::parse("Field('n') >= 5").unwrap().matches(&e));
    assert!(Predicate::parse("Field('n') >= 4").unwrap().matches(&e));
    assert!(!Predicate::parse("Field('n') >= 6").unwrap().matches(&e));

    assert!(Predicate::parse("Field('n') <= 5").unwrap().matches(&e));
    assert!(Predicate::parse("Field('n') <= 6").unwrap().matches(&e));
    assert!(!Predicate::parse("Field('n') <= 4").unwrap().matches(&e));

    assert!(Predicate::parse("Field('n') != 4").unwrap().matches(&e));
    assert!(!Predicate::parse("Field('n') != 5").unwrap().matches(&e));
}

// ============================================================================
// Level literals
// ============================================================================

#[test]
fn test_level_resolves_to_rank() {
    let e = entry();
    let rank = i64::from(Level::Warn.rank());
    let p = Predicate::parse(&format!("warn == {rank}")).unwrap();
    assert!(p.matches(&e));
}

#[test]
fn test_level_rank_against_field() {
    let e = entry().with_field("min-level", i64::from(Level::Error.rank()));
    assert!(Predicate::parse("Field('min-level') == error").unwrap().matches(&e));
    assert!(Predicate::parse("Field('min-level') > warn").unwrap().matches(&e));
    assert!(!Predicate::parse("Field('min-level') > fatal").unwrap().matches(&e));
}

// ============================================================================
// Short-circuiting
// ============================================================================

#[test]
fn test_empty_expression_matches_any_entry() {
    let p = Predicate::parse("").unwrap();
    assert!(p.matches(&entry()));
    assert!(p.matches(&entry().with_field("anything", "at all")));
}

#[test]
fn test_compound_expression_end_to_end() {
    let p = Predicate::parse("Prefix(auth) && HasField('user')").unwrap();

    let hit = entry().with_field("prefix", "auth").with_field("user", "bob");
    assert!(p.matches(&hit));

    let miss = entry().with_field("prefix", "auth");
    assert!(!p.matches(&miss));
}
