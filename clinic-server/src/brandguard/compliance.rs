//! Medical Advertising Compliance Scan
//!
//! Flags wording that Chinese medical-advertising rules prohibit in
//! marketing copy. Matching is a case-insensitive substring scan; the
//! word list entries are already lowercase.

use shared::models::ComplianceReport;

/// 医疗广告违禁词库
pub const PROHIBITED_WORDS: [&str; 34] = [
    "根治",
    "彻底治愈",
    "永久",
    "100%",
    "最好",
    "最佳",
    "第一",
    "唯一",
    "国家级",
    "最高技术",
    "最先进",
    "最新技术",
    "填补国内空白",
    "绝对",
    "保证",
    "包治",
    "速效",
    "特效",
    "全面",
    "安全",
    "无副作用",
    "无痛",
    "无创",
    "立竿见影",
    "药到病除",
    "一次见效",
    "永不复发",
    "祖传",
    "秘方",
    "偏方",
    "神医",
    "专家",
    "权威",
    "国际领先",
];

/// Scan marketing copy for prohibited wording.
///
/// Every match yields one issue entry in word-list order, so the same
/// phrase appearing twice is still reported once.
pub fn check(content: &str) -> ComplianceReport {
    let haystack = content.to_lowercase();
    let issues: Vec<String> = PROHIBITED_WORDS
        .iter()
        .filter(|word| haystack.contains(*word))
        .map(|word| format!("包含违禁词: {word}"))
        .collect();

    ComplianceReport {
        is_compliant: issues.is_empty(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prohibited_word_is_flagged() {
        let report = check("本产品可以根治痘痘");

        assert!(!report.is_compliant);
        assert_eq!(report.issues, vec!["包含违禁词: 根治".to_string()]);
    }

    #[test]
    fn test_clean_copy_passes() {
        let report = check("改善肌肤状态");

        assert!(report.is_compliant);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_multiple_words_reported_in_list_order() {
        let report = check("祖传秘方，永久根治，绝对安全");

        assert!(!report.is_compliant);
        assert_eq!(
            report.issues,
            vec![
                "包含违禁词: 根治".to_string(),
                "包含违禁词: 永久".to_string(),
                "包含违禁词: 绝对".to_string(),
                "包含违禁词: 安全".to_string(),
                "包含违禁词: 祖传".to_string(),
                "包含违禁词: 秘方".to_string(),
            ]
        );
    }

    #[test]
    fn test_latin_match_is_case_insensitive() {
        let report = check("疗效可达100%！");

        assert!(!report.is_compliant);
        assert_eq!(report.issues, vec!["包含违禁词: 100%".to_string()]);
    }

    #[test]
    fn test_repeated_word_reported_once() {
        let report = check("根治一切，根治到底");

        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_empty_content_is_compliant() {
        assert!(check("").is_compliant);
    }
}
