//! Topic trigger rules.
//!
//! An ordered table mapping question keywords to the corpus section that
//! should be folded into the prompt in full. Multiple rules may fire for one
//! question; fired sections are appended in table order. Data-driven so
//! tests can enumerate every rule independently.

/// A static mapping from trigger substrings to a knowledge section.
#[derive(Debug, Clone, Copy)]
pub struct TriggerRule {
    /// Section to force-load in full when the rule fires.
    pub section_id: &'static str,

    /// Block title rendered above the section dump.
    pub label: &'static str,

    /// Substrings that fire the rule when present in the question.
    pub triggers: &'static [&'static str],

    /// Whether the rule also fires when the question contains the caller's
    /// province name (the regions rule).
    pub match_province: bool,
}

impl TriggerRule {
    /// Does this rule fire for the given question?
    pub fn fires(&self, question: &str, province: Option<&str>) -> bool {
        if self.triggers.iter().any(|t| question.contains(t)) {
            return true;
        }
        if self.match_province
            && let Some(p) = province
            && !p.is_empty()
            && question.contains(p)
        {
            return true;
        }
        false
    }
}

/// The rule table, in render order.
pub const TRIGGER_RULES: &[TriggerRule] = &[
    TriggerRule {
        section_id: "policy",
        label: "高考政策信息",
        triggers: &["政策", "报名", "考试时间"],
        match_province: false,
    },
    TriggerRule {
        section_id: "regions",
        label: "地区信息",
        triggers: &["地区"],
        match_province: true,
    },
    TriggerRule {
        section_id: "majors",
        label: "专业信息",
        triggers: &["专业", "学科"],
        match_province: false,
    },
    TriggerRule {
        section_id: "universities",
        label: "院校信息",
        triggers: &["大学", "院校", "高校"],
        match_province: false,
    },
    TriggerRule {
        section_id: "admission_guide",
        label: "志愿填报指导",
        triggers: &["志愿", "填报", "录取"],
        match_province: false,
    },
    TriggerRule {
        section_id: "career_planning",
        label: "职业规划信息",
        triggers: &["职业", "就业", "发展"],
        match_province: false,
    },
    TriggerRule {
        section_id: "medical_exam",
        label: "体检标准信息",
        triggers: &["体检", "身体", "健康"],
        match_province: false,
    },
    TriggerRule {
        section_id: "student_status",
        label: "学籍管理信息",
        triggers: &["学籍", "转学", "户籍"],
        match_province: false,
    },
    TriggerRule {
        section_id: "subject_categories",
        label: "科类信息",
        triggers: &["文科", "理科", "选科"],
        match_province: false,
    },
];

/// All rules that fire for a question, in table order.
pub fn fired_rules(question: &str, province: Option<&str>) -> Vec<&'static TriggerRule> {
    TRIGGER_RULES
        .iter()
        .filter(|rule| rule.fires(question, province))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_trigger_fires_its_own_rule() {
        for rule in TRIGGER_RULES {
            for trigger in rule.triggers {
                let question = format!("请问{trigger}是怎么回事");
                let fired = fired_rules(&question, None);
                assert!(
                    fired.iter().any(|r| r.section_id == rule.section_id),
                    "trigger {trigger} should fire {}",
                    rule.section_id
                );
            }
        }
    }

    #[test]
    fn registration_keyword_fires_policy() {
        let fired = fired_rules("北京的报名时间是什么", None);
        assert!(fired.iter().any(|r| r.section_id == "policy"));
    }

    #[test]
    fn province_name_fires_regions() {
        let fired = fired_rules("北京的报名时间是什么", Some("北京"));
        assert!(fired.iter().any(|r| r.section_id == "regions"));

        // without a province match, "regions" needs its own keyword
        let fired = fired_rules("报名时间是什么", Some("上海"));
        assert!(!fired.iter().any(|r| r.section_id == "regions"));
    }

    #[test]
    fn multiple_rules_fire_in_table_order() {
        let fired = fired_rules("高考报名前要体检吗，想上大学", None);
        let ids: Vec<_> = fired.iter().map(|r| r.section_id).collect();
        assert_eq!(ids, vec!["policy", "universities", "medical_exam"]);
    }

    #[test]
    fn unrelated_question_fires_nothing() {
        assert!(fired_rules("今天天气怎么样", None).is_empty());
    }
}
