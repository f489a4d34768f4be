use schedule_import::{
    Lag, PredecessorLink, RelationType, RelationshipError, parse_predecessor,
    parse_predecessor_list,
};

const HOURS_PER_DAY: f64 = 24.0;

fn parsed(token: &str) -> (String, RelationType, f64) {
    let link = parse_predecessor(token).expect("token should parse");
    let hours = link.lag.to_hours(HOURS_PER_DAY);
    (link.code, link.relation, hours)
}

#[test]
fn bare_code_defaults_to_finish_to_start_without_lag() {
    assert_eq!(
        parsed("A100"),
        ("A100".to_string(), RelationType::FinishToStart, 0.0)
    );
}

#[test]
fn day_lag_is_converted_to_hours() {
    assert_eq!(
        parsed("A1000[SS+5d]"),
        ("A1000".to_string(), RelationType::StartToStart, 120.0)
    );
    assert_eq!(
        parsed("A100[FS+2d]"),
        ("A100".to_string(), RelationType::FinishToStart, 48.0)
    );
}

#[test]
fn hour_lag_passes_through_and_keeps_sign() {
    assert_eq!(
        parsed("A100[FF-10h]"),
        ("A100".to_string(), RelationType::FinishToFinish, -10.0)
    );
    assert_eq!(
        parsed("A100[SF3h]"),
        ("A100".to_string(), RelationType::StartToFinish, 3.0)
    );
}

#[test]
fn type_is_case_insensitive_and_whitespace_is_ignored() {
    let link = parse_predecessor("  B-2.1 [ ss  -1d ]  ").unwrap();
    assert_eq!(link.code, "B-2.1");
    assert_eq!(link.relation, RelationType::StartToStart);
    assert_eq!(link.lag, Lag::days(-1));
}

#[test]
fn brackets_without_lag_keep_zero_lag() {
    let link = parse_predecessor("A100[ff]").unwrap();
    assert_eq!(link.relation, RelationType::FinishToFinish);
    assert!(link.lag.is_zero());
}

#[test]
fn unknown_two_letter_type_is_rejected() {
    let err = parse_predecessor("A100[XX+1d]").unwrap_err();
    assert_eq!(
        err,
        RelationshipError::UnknownType {
            kind: "XX".into(),
            token: "A100[XX+1d]".into(),
        }
    );
}

#[test]
fn tokens_outside_the_grammar_are_malformed() {
    for token in [
        "",
        "A 100",
        "[FS]",
        "A100[FS+5w]",
        "A100[FS+d]",
        "A100[+2d]",
        "A100[FSS]",
        "A100[FS+2D]",
        "A100[FS+2d",
        "A100#",
    ] {
        assert!(
            matches!(
                parse_predecessor(token),
                Err(RelationshipError::Malformed(_))
            ),
            "expected '{token}' to be malformed"
        );
    }
}

#[test]
fn display_then_parse_yields_the_same_link() {
    for token in [
        "A100",
        "A100[SS]",
        "A100[FS+2d]",
        "A100[FF-8h]",
        "X.9-1[sf+0h]",
        "C3[fs-3d]",
        "A100[SS+0d]",
        "A100[FS-0d]",
    ] {
        let first = parse_predecessor(token).unwrap();
        let rendered = first.to_string();
        let second: PredecessorLink = rendered.parse().unwrap();
        assert_eq!(first, second, "round trip of '{token}' via '{rendered}'");
    }
}

#[test]
fn display_uses_compact_forms() {
    assert_eq!(
        PredecessorLink::new("A1", RelationType::FinishToStart, Lag::default()).to_string(),
        "A1"
    );
    assert_eq!(
        PredecessorLink::new("A1", RelationType::StartToStart, Lag::days(2)).to_string(),
        "A1[SS+2d]"
    );
    assert_eq!(
        PredecessorLink::new("A1", RelationType::FinishToFinish, Lag::hours(-4)).to_string(),
        "A1[FF-4h]"
    );
    assert_eq!(
        PredecessorLink::new("A1", RelationType::FinishToStart, Lag::days(0)).to_string(),
        "A1[FS+0d]"
    );
}

#[test]
fn one_bad_token_does_not_affect_its_siblings() {
    let links = parse_predecessor_list("A100[FS+2d], not valid!, A300[QQ], A400");
    assert_eq!(links.len(), 4);
    assert_eq!(links[0].1.as_ref().unwrap().code, "A100");
    assert!(matches!(links[1].1, Err(RelationshipError::Malformed(_))));
    assert!(matches!(links[2].1, Err(RelationshipError::UnknownType { .. })));
    assert_eq!(links[3].1.as_ref().unwrap().code, "A400");
    assert_eq!(links[1].0, "not valid!");
}

#[test]
fn blank_entries_in_a_list_are_skipped() {
    let links = parse_predecessor_list(" A100 , ,A200,");
    let codes: Vec<_> = links
        .into_iter()
        .map(|(_, link)| link.unwrap().code)
        .collect();
    assert_eq!(codes, vec!["A100", "A200"]);
}

#[test]
fn relation_codes_map_to_p6_values() {
    assert_eq!(RelationType::FinishToStart.p6_code(), "PR_FS");
    assert_eq!(RelationType::StartToStart.p6_code(), "PR_SS");
    assert_eq!(RelationType::FinishToFinish.p6_code(), "PR_FF");
    assert_eq!(RelationType::StartToFinish.p6_code(), "PR_SF");
    assert_eq!(RelationType::from_code("sf"), Some(RelationType::StartToFinish));
    assert_eq!(RelationType::from_code("XY"), None);
}
