use serde::Serialize;

use super::escape::Html;
use crate::findings::{Finding, Status};

/// 四种状态的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub fail: usize,
    pub warn: usize,
    pub pass: usize,
    pub skip: usize,
}

impl StatusTally {
    pub fn from_findings<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Self {
        let mut tally = Self::default();
        for finding in findings {
            tally.record(finding);
        }
        tally
    }

    /// 未知状态不计入任何桶
    pub fn record(&mut self, finding: &Finding) {
        if let Some(status) = finding.canonical_status() {
            *self.slot(status) += 1;
        }
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Fail => self.fail,
            Status::Warn => self.warn,
            Status::Pass => self.pass,
            Status::Skip => self.skip,
        }
    }

    pub fn total(&self) -> usize {
        self.fail + self.warn + self.pass + self.skip
    }

    /// FAIL 或 WARN 存在时分组默认展开
    pub fn needs_attention(&self) -> bool {
        self.fail + self.warn > 0
    }

    fn slot(&mut self, status: Status) -> &mut usize {
        match status {
            Status::Fail => &mut self.fail,
            Status::Warn => &mut self.warn,
            Status::Pass => &mut self.pass,
            Status::Skip => &mut self.skip,
        }
    }

    /// 汇总栏：`FAIL: n` 等四个 pill
    pub fn to_pills(&self) -> Html {
        let pills = Status::ALL.iter().map(|status| {
            Html::trusted(format!(
                r#"<span class="pill">{}: <b>{}</b></span>"#,
                status.as_str(),
                self.get(*status)
            ))
        });
        Html::join(pills, "")
    }

    /// 分组标题里的紧凑计数，零值省略
    pub fn to_chips(&self) -> Html {
        let chips = Status::ALL
            .iter()
            .filter(|status| self.get(**status) > 0)
            .map(|status| {
                Html::trusted(format!(
                    r#"<span class="chip {}">{} {}</span>"#,
                    status.badge_class(),
                    status.as_str(),
                    self.get(*status)
                ))
            });
        Html::join(chips, "")
    }
}
