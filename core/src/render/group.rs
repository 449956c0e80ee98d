use std::collections::BTreeMap;

use super::tally::StatusTally;
use crate::findings::Finding;

/// 同一 control 下的检查结果
#[derive(Debug, Clone, PartialEq)]
pub struct ControlGroup<'a> {
    pub control_id: &'a str,
    /// (原始下标, 结果)，保持输入顺序
    pub findings: Vec<(usize, &'a Finding)>,
    pub tally: StatusTally,
    pub default_expanded: bool,
}

/// 按 control id 分组，组按 id 升序，组内保持输入顺序
pub fn group_findings(findings: &[Finding]) -> Vec<ControlGroup<'_>> {
    let mut buckets: BTreeMap<&str, Vec<(usize, &Finding)>> = BTreeMap::new();
    for (idx, finding) in findings.iter().enumerate() {
        buckets
            .entry(finding.group_key())
            .or_default()
            .push((idx, finding));
    }

    buckets
        .into_iter()
        .map(|(control_id, members)| {
            let tally = StatusTally::from_findings(members.iter().map(|(_, f)| *f));
            ControlGroup {
                control_id,
                default_expanded: tally.needs_attention(),
                findings: members,
                tally,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::UNKNOWN_CONTROL;

    fn finding(control: Option<&str>, status: &str) -> Finding {
        Finding {
            control_id: control.map(str::to_string),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Finding> {
        vec![
            finding(Some("L2-09"), "PASS"),
            finding(Some("L1-02"), "fail"),
            finding(None, "WARN"),
            finding(Some("L1-01"), "PASS"),
            finding(Some("L1-02"), "INFO"),
            finding(Some(""), "SKIP"),
            finding(Some("L1-01"), "skip"),
        ]
    }

    #[test]
    fn empty_input_has_no_groups() {
        assert!(group_findings(&[]).is_empty());
    }

    #[test]
    fn groups_are_sorted_by_control_id() {
        let findings = sample();
        let ids: Vec<&str> = group_findings(&findings).iter().map(|g| g.control_id).collect();
        assert_eq!(ids, vec!["L1-01", "L1-02", "L2-09", UNKNOWN_CONTROL]);
    }

    #[test]
    fn order_is_stable_under_input_permutation() {
        let findings = sample();
        let mut reversed = findings.clone();
        reversed.reverse();

        let a: Vec<(&str, usize)> = group_findings(&findings)
            .iter()
            .map(|g| (g.control_id, g.findings.len()))
            .collect();
        let b: Vec<(&str, usize)> = group_findings(&reversed)
            .iter()
            .map(|g| (g.control_id, g.findings.len()))
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn partition_covers_every_finding_once() {
        let findings = sample();
        let groups = group_findings(&findings);

        let mut seen: Vec<usize> = groups
            .iter()
            .flat_map(|g| g.findings.iter().map(|(idx, _)| *idx))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..findings.len()).collect::<Vec<_>>());
    }

    #[test]
    fn group_tallies_sum_to_global_tally() {
        let findings = sample();
        let global = StatusTally::from_findings(&findings);
        let groups = group_findings(&findings);

        let mut summed = StatusTally::default();
        for g in &groups {
            summed.fail += g.tally.fail;
            summed.warn += g.tally.warn;
            summed.pass += g.tally.pass;
            summed.skip += g.tally.skip;
        }
        assert_eq!(summed, global);
    }

    #[test]
    fn default_expanded_iff_fail_or_warn() {
        let findings = sample();
        for g in group_findings(&findings) {
            assert_eq!(g.default_expanded, g.tally.fail + g.tally.warn > 0, "{}", g.control_id);
        }

        let expanded: Vec<&str> = group_findings(&findings)
            .into_iter()
            .filter(|g| g.default_expanded)
            .map(|g| g.control_id)
            .collect();
        assert_eq!(expanded, vec!["L1-02", UNKNOWN_CONTROL]);
    }

    #[test]
    fn unknown_status_stays_in_group_but_not_in_tally() {
        let findings = sample();
        let groups = group_findings(&findings);
        let l102 = groups.iter().find(|g| g.control_id == "L1-02").unwrap();
        assert_eq!(l102.findings.len(), 2);
        assert_eq!(l102.tally.total(), 1);
    }
}
