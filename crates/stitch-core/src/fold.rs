//! The adjacent-record fold engine
//!
//! Reduces one group of records to a sequence of merged and unmerged
//! output records under a rule set. The engine itself has no failure
//! modes: missing data degrades to empty-string comparisons, and the
//! caller owns all I/O.

use crate::record::{Header, Record};
use crate::rule::{evaluate, MatchRule};

/// Reserved provenance column name. If the source header already carries
/// it the column is reused, never duplicated.
pub const FLAG_COLUMN: &str = "stitched";

/// Group-wide existence gate for `any` rules.
///
/// A synthetic empty record is prepended as a left-boundary sentinel and
/// the rule is evaluated over every consecutive pair of the padded
/// sequence: (sentinel, first), (first, second), and so on. True iff at
/// least one pair satisfies the rule. The condition asks whether the
/// group contains the thing somewhere, not at a specific adjacency.
pub fn any_match(header: &Header, group: &[Record], rule: &MatchRule) -> bool {
    let sentinel = Record::empty();
    let mut prev = &sentinel;

    for record in group {
        if evaluate(header, prev, record, rule) {
            return true;
        }
        prev = record;
    }

    false
}

/// Fold one group under a rule set.
///
/// - A singleton group is returned unchanged; it is never subject to
///   merge logic.
/// - Every `any` rule must pass its group-wide gate, or the whole group
///   is returned unmerged. All or nothing.
/// - An empty ordinary-rule set never merges. The vacuous all-match
///   (zero satisfied of zero required) would otherwise collapse the
///   entire group.
/// - Otherwise the group reduces left to right: a candidate that
///   satisfies every ordinary rule is absorbed into the accumulator,
///   advancing each rule's left column to the candidate's value and
///   raising the accumulator's merged flag; anything else flushes the
///   accumulator and reseeds with the candidate. The final accumulator
///   flushes unconditionally.
///
/// The merged flag is only ever raised, never cleared, so folding
/// already-folded output changes nothing.
pub fn fold_group(header: &Header, group: Vec<Record>, rules: &[MatchRule]) -> Vec<Record> {
    if group.len() <= 1 {
        return group;
    }

    let (any_rules, ordinary): (Vec<&MatchRule>, Vec<&MatchRule>) =
        rules.iter().partition(|rule| rule.match_any);

    if any_rules
        .iter()
        .any(|rule| !any_match(header, &group, rule))
    {
        return group;
    }

    if ordinary.is_empty() {
        return group;
    }

    let mut records = group.into_iter();
    let mut accumulator = match records.next() {
        Some(record) => record,
        None => return Vec::new(),
    };

    let mut out = Vec::new();

    for record in records {
        let absorbs = ordinary
            .iter()
            .all(|rule| evaluate(header, &accumulator, &record, rule));

        if absorbs {
            // The left column advances to the later record's value, so
            // an "end" timestamp extends forward. Copied by value: the
            // accumulator owns its storage outright.
            for rule in &ordinary {
                let value = record.get(header, &rule.left).to_string();
                accumulator.set(header, &rule.left, value);
            }
            accumulator.merged = true;
        } else {
            out.push(accumulator);
            accumulator = record;
        }
    }

    out.push(accumulator);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::RecordReader;
    use crate::rule::Comparand;

    fn parse(csv: &str) -> (Header, Vec<Record>) {
        let reader = RecordReader::new(csv.as_bytes()).unwrap();
        let header = reader.header().clone();
        let records = reader.collect::<crate::error::Result<Vec<_>>>().unwrap();
        (header, records)
    }

    fn time_rules() -> Vec<MatchRule> {
        vec![
            MatchRule::columns("id", "id"),
            MatchRule::columns("end", "start"),
        ]
    }

    fn rows(folded: &[Record]) -> Vec<String> {
        folded
            .iter()
            .map(|r| format!("{},{}", r.values.join(","), r.merged))
            .collect()
    }

    #[test]
    fn test_singleton_group_unchanged() {
        let (header, group) = parse("id,start,end\none,9am,11am\n");
        let folded = fold_group(&header, group.clone(), &time_rules());

        assert_eq!(folded, group);
        assert!(!folded[0].merged);
    }

    #[test]
    fn test_adjacent_pair_merges() {
        let (header, group) = parse("id,start,end\none,9am,11am\none,11am,5pm\n");
        let folded = fold_group(&header, group, &time_rules());

        assert_eq!(rows(&folded), vec!["one,9am,5pm,true"]);
    }

    #[test]
    fn test_three_way_merge_spans_first_to_last() {
        let (header, group) =
            parse("id,start,end\none,9am,11am\none,11am,2pm\none,2pm,5pm\n");
        let folded = fold_group(&header, group, &time_rules());

        assert_eq!(rows(&folded), vec!["one,9am,5pm,true"]);
    }

    #[test]
    fn test_broken_chain_flushes() {
        let (header, group) =
            parse("id,start,end\ntwo,9am,10am\ntwo,11am,5pm\n");
        let folded = fold_group(&header, group, &time_rules());

        assert_eq!(
            rows(&folded),
            vec!["two,9am,10am,false", "two,11am,5pm,false"]
        );
    }

    #[test]
    fn test_no_ordinary_rules_never_merges() {
        // Zero required rules must not count as a vacuous all-match.
        let (header, group) = parse("id,start,end\none,9am,11am\none,11am,5pm\n");
        let folded = fold_group(&header, group.clone(), &[]);

        assert_eq!(folded, group);
        assert!(folded.iter().all(|r| !r.merged));
    }

    #[test]
    fn test_any_gate_failure_disables_whole_group() {
        // Ordinary rules would merge every pair, but the gate fails.
        let (header, group) =
            parse("id,start,end,flag\ntwo,9am,11am,nope\ntwo,11am,2pm,nope\ntwo,2pm,5pm,nope\n");

        let mut rules = time_rules();
        rules.push(MatchRule::parse("?flag=yep").unwrap());

        let folded = fold_group(&header, group.clone(), &rules);
        assert_eq!(folded, group);
        assert!(folded.iter().all(|r| !r.merged));
    }

    #[test]
    fn test_any_gate_satisfied_anywhere_enables_fold() {
        let mut rules = time_rules();
        rules.push(MatchRule::parse("?flag=yep").unwrap());

        // Satisfied at the first record.
        let (header, group) =
            parse("id,start,end,flag\nfoo,9am,11am,yep\nfoo,11am,2pm,nope\nfoo,2pm,5pm,nope\n");
        let folded = fold_group(&header, group, &rules);
        assert_eq!(rows(&folded), vec!["foo,9am,5pm,yep,true"]);

        // Satisfied in the middle.
        let (header, group) =
            parse("id,start,end,flag\none,9am,11am,nope\none,11am,2pm,yep\none,2pm,5pm,nope\n");
        let folded = fold_group(&header, group, &rules);
        assert_eq!(rows(&folded), vec!["one,9am,5pm,nope,true"]);
    }

    #[test]
    fn test_any_match_uses_left_boundary_sentinel() {
        let (header, group) = parse("paycode,end\nbar,5pm\nfoo,11am\n");

        // The sentinel pair means the first record is tested on the
        // right-hand side.
        let rule = MatchRule {
            left: "paycode".to_string(),
            comparand: Comparand::Literal("bar".to_string()),
            inverse: false,
            match_any: true,
        };
        assert!(any_match(&header, &group, &rule));

        // Accumulator-side literals see the sentinel and every record
        // except the last in left position.
        let rule = MatchRule {
            left: "paycode".to_string(),
            comparand: Comparand::AccumulatorLiteral("bar".to_string()),
            inverse: false,
            match_any: true,
        };
        assert!(any_match(&header, &group, &rule));

        let rule = MatchRule {
            left: "paycode".to_string(),
            comparand: Comparand::AccumulatorLiteral("foo".to_string()),
            inverse: false,
            match_any: true,
        };
        assert!(!any_match(&header, &group, &rule));
    }

    #[test]
    fn test_literal_right_restricts_merges() {
        let (header, group) = parse(
            "id,paycode,start,end\none,foo,9am,11am\none,bar,11am,5pm\none,baz,9am,11am\none,quux,11am,5pm\n",
        );

        let mut rules = time_rules();
        rules.push(MatchRule::parse("paycode=bar").unwrap());

        let folded = fold_group(&header, group, &rules);
        assert_eq!(
            rows(&folded),
            vec![
                "one,bar,9am,5pm,true",
                "one,baz,9am,11am,false",
                "one,quux,11am,5pm,false",
            ]
        );
    }

    #[test]
    fn test_literal_left_restricts_merges() {
        let (header, group) = parse(
            "id,paycode,start,end\none,foo,9am,11am\none,bar,11am,5pm\none,baz,9am,11am\none,quux,11am,5pm\n",
        );

        let mut rules = time_rules();
        rules.push(MatchRule::parse("paycode:=foo").unwrap());

        let folded = fold_group(&header, group, &rules);
        assert_eq!(
            rows(&folded),
            vec![
                "one,bar,9am,5pm,true",
                "one,baz,9am,11am,false",
                "one,quux,11am,5pm,false",
            ]
        );
    }

    #[test]
    fn test_inverse_literal_right_blocks_terminal_value() {
        // "end != never": a row whose end is the literal never merges
        // with its neighbor, other rules notwithstanding.
        let (header, group) = parse("id,start,end\ntwo,9am,11am\ntwo,11am,never\n");

        let mut rules = time_rules();
        rules.push(MatchRule::parse("!end=never").unwrap());

        let folded = fold_group(&header, group, &rules);
        assert_eq!(
            rows(&folded),
            vec!["two,9am,11am,false", "two,11am,never,false"]
        );
    }

    #[test]
    fn test_inverse_field_rule_merges_on_difference() {
        let (header, group) = parse("id,start,end\none,9am,11am\none,12am,5pm\n");

        let rules = vec![
            MatchRule::columns("id", "id"),
            MatchRule::columns("end", "start").inverted(),
        ];

        let folded = fold_group(&header, group, &rules);
        assert_eq!(rows(&folded), vec!["one,9am,5pm,true"]);
    }

    #[test]
    fn test_matched_literal_rule_advances_left_column() {
        // On a merge every matched rule copies the candidate's left
        // column forward, literal rules included.
        let (header, group) = parse("id,paycode,start,end\none,foo,9am,11am\none,bar,11am,5pm\n");

        let mut rules = time_rules();
        rules.push(MatchRule::parse("paycode=bar").unwrap());

        let folded = fold_group(&header, group, &rules);
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].get(&header, "paycode"), "bar");
    }

    #[test]
    fn test_refolding_folded_group_is_identity() {
        let (header, group) =
            parse("id,start,end\none,9am,11am\none,11am,2pm\none,2pm,5pm\n");
        let rules = time_rules();

        let once = fold_group(&header, group, &rules);
        let twice = fold_group(&header, once.clone(), &rules);

        assert_eq!(twice, once);
    }

    #[test]
    fn test_order_preserved_across_flushes() {
        let (header, group) = parse(
            "id,start,end\none,9am,10am\none,10am,11am\none,1pm,2pm\none,2pm,3pm\n",
        );
        let folded = fold_group(&header, group, &time_rules());

        assert_eq!(
            rows(&folded),
            vec!["one,9am,11am,true", "one,1pm,3pm,true"]
        );
    }
}
