//! Chart classification heuristics.
//!
//! Pure functions that infer a chart category, a style template name, and
//! inline style overrides from unstructured input text. All tables are
//! static and immutable; there is no I/O here. Absence of a signal is a
//! valid outcome, not an error: callers fall back to explicit values or
//! defaults.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Inferred category of diagram.
///
/// Declaration order matters: it is the tie-break order for the keyword
/// heuristic, so variants must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Flowchart,
    Sequence,
    Class,
    State,
    Er,
    Gantt,
    Pie,
}

impl ChartType {
    /// All chart types in declaration (tie-break) order.
    pub const ALL: [ChartType; 7] = [
        ChartType::Flowchart,
        ChartType::Sequence,
        ChartType::Class,
        ChartType::State,
        ChartType::Er,
        ChartType::Gantt,
        ChartType::Pie,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Flowchart => "flowchart",
            ChartType::Sequence => "sequence",
            ChartType::Class => "class",
            ChartType::State => "state",
            ChartType::Er => "er",
            ChartType::Gantt => "gantt",
            ChartType::Pie => "pie",
        }
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChartType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "flowchart" => Ok(ChartType::Flowchart),
            "sequence" => Ok(ChartType::Sequence),
            "class" => Ok(ChartType::Class),
            "state" => Ok(ChartType::State),
            "er" => Ok(ChartType::Er),
            "gantt" => Ok(ChartType::Gantt),
            "pie" => Ok(ChartType::Pie),
            other => Err(Error::Config(format!("Unknown chart type: {}", other))),
        }
    }
}

/// Result of classifying one input text.
///
/// Every field is optional; the pipeline only uses a field when the caller
/// did not already supply an explicit value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub chart_type: Option<ChartType>,
    pub template: Option<String>,
    pub inline_style: Option<String>,
}

/// Classify an input text in one pass.
pub fn classify(text: &str) -> Classification {
    Classification {
        chart_type: detect_chart_type(text),
        template: extract_template_name(text),
        inline_style: extract_inline_style(text),
    }
}

// Markup headers that unambiguously signal a chart type. Checked in order;
// structural evidence is authoritative over keyword evidence.
static STRUCTURAL_PATTERNS: Lazy<Vec<(Regex, ChartType)>> = Lazy::new(|| {
    [
        (r"(?m)^\s*graph\s+(TD|TB|BT|RL|LR)", ChartType::Flowchart),
        (r"(?m)^\s*sequenceDiagram", ChartType::Sequence),
        (r"(?m)^\s*classDiagram", ChartType::Class),
        (r"(?m)^\s*stateDiagram", ChartType::State),
        (r"(?m)^\s*erDiagram", ChartType::Er),
        (r"(?m)^\s*gantt", ChartType::Gantt),
        (r"(?m)^\s*pie", ChartType::Pie),
    ]
    .iter()
    .map(|(p, t)| (Regex::new(p).expect("static pattern"), *t))
    .collect()
});

// Per-category keyword synonyms, all lowercase. Matched as case-insensitive
// substrings; the category with the strictly highest count of distinct hits
// wins, ties resolving to the earlier entry.
static KEYWORDS: &[(ChartType, &[&str])] = &[
    (
        ChartType::Flowchart,
        &["流程图", "流程", "步骤", "process", "flow", "flowchart"],
    ),
    (
        ChartType::Sequence,
        &["时序图", "序列图", "顺序图", "sequence", "时间顺序"],
    ),
    (
        ChartType::Class,
        &["类图", "class diagram", "类关系", "继承", "实现"],
    ),
    (
        ChartType::State,
        &["状态图", "状态", "state diagram", "状态转换"],
    ),
    (
        ChartType::Er,
        &["实体关系图", "entity relationship", "er图", "数据库"],
    ),
    (
        ChartType::Gantt,
        &["甘特图", "进度图", "项目计划", "gantt", "timeline"],
    ),
    (
        ChartType::Pie,
        &["饼图", "比例", "占比", "pie chart", "百分比"],
    ),
];

/// Detect the chart type of an input text.
///
/// Structural markup headers are checked first and win outright; otherwise
/// keyword synonyms are counted per category. Returns `None` when neither
/// heuristic produces a signal.
pub fn detect_chart_type(text: &str) -> Option<ChartType> {
    for (pattern, chart_type) in STRUCTURAL_PATTERNS.iter() {
        if pattern.is_match(text) {
            return Some(*chart_type);
        }
    }

    let lowered = text.to_lowercase();
    let mut best: Option<(ChartType, usize)> = None;
    for (chart_type, words) in KEYWORDS {
        let score = words.iter().filter(|w| lowered.contains(**w)).count();
        // Strictly greater keeps the earlier category on ties.
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((*chart_type, score));
        }
    }

    best.map(|(chart_type, _)| chart_type)
}

// Canonical template name -> accepted synonyms (lowercase).
static TEMPLATE_ALIASES: &[(&str, &[&str])] = &[
    ("default", &["默认", "default", "standard", "normal"]),
    ("dark", &["暗色", "dark", "black", "night", "深色"]),
    ("light", &["亮色", "light", "white", "day", "浅色"]),
    ("business", &["商务", "business", "professional", "corporate", "企业"]),
    ("colorful", &["彩色", "colorful", "vibrant", "vivid", "多彩"]),
    ("minimal", &["简约", "minimal", "simple", "clean", "minimalist"]),
];

// Ordered patterns for an explicit template/style declaration. The first
// match wins; each captures the template token in group 1.
static TEMPLATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // use "dark" template / use dark style
        r#"(?i)use\s+["']?(\w+)["']?\s+(?:template|style|theme)"#,
        // 使用"dark"模板
        r#"使用["']?(\w+)["']?模板"#,
        // bare token followed by a style-word: dark模板 / 暗色风格
        r#"["']?(\w+)["']?[模板样式风格]"#,
        // template: dark
        r#"(?i)template[:\s]+["']?(\w+)["']?"#,
        // css: dark
        r#"(?i)css[:\s]+["']?(\w+)["']?"#,
        // style: dark
        r#"(?i)style[:\s]+["']?(\w+)["']?"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// Extract an explicitly declared template name from the input text.
///
/// The captured token is lowercased and resolved through the alias table to
/// a canonical name. Tokens that match no alias pass through verbatim;
/// whether they exist is resolved downstream by the template store.
pub fn extract_template_name(text: &str) -> Option<String> {
    for pattern in TEMPLATE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let token = caps.get(1)?.as_str().to_lowercase();
            for (canonical, aliases) in TEMPLATE_ALIASES {
                if aliases.contains(&token.as_str()) {
                    return Some((*canonical).to_string());
                }
            }
            return Some(token);
        }
    }
    None
}

// Fenced css block or a literal <style> block, multi-line.
static STYLE_BLOCK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"```css\s*([\s\S]*?)\s*```",
        r"<style>\s*([\s\S]*?)\s*</style>",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// Extract embedded style overrides (a fenced css block or a `<style>`
/// block) from the input text, trimmed.
pub fn extract_inline_style(text: &str) -> Option<String> {
    for pattern in STYLE_BLOCK_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps.get(1)?.as_str().trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_header_wins_over_keywords() {
        // Keyword evidence points at pie, but the markup header decides.
        let text = "draw the 占比 比例 pie chart\ngraph TD\n  A --> B";
        assert_eq!(detect_chart_type(text), Some(ChartType::Flowchart));
    }

    #[test]
    fn structural_headers_map_to_their_types() {
        assert_eq!(
            detect_chart_type("sequenceDiagram\n  A->>B: hi"),
            Some(ChartType::Sequence)
        );
        assert_eq!(
            detect_chart_type("  classDiagram\n  Animal <|-- Duck"),
            Some(ChartType::Class)
        );
        assert_eq!(
            detect_chart_type("stateDiagram-v2\n  [*] --> Idle"),
            Some(ChartType::State)
        );
        assert_eq!(
            detect_chart_type("erDiagram\n  CUSTOMER ||--o{ ORDER : places"),
            Some(ChartType::Er)
        );
        assert_eq!(detect_chart_type("gantt\n  title Plan"), Some(ChartType::Gantt));
        assert_eq!(
            detect_chart_type("pie\n  \"a\": 40\n  \"b\": 60"),
            Some(ChartType::Pie)
        );
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(
            detect_chart_type("a Flowchart showing login steps"),
            Some(ChartType::Flowchart)
        );
        assert_eq!(detect_chart_type("画一个流程图"), Some(ChartType::Flowchart));
    }

    #[test]
    fn no_signal_returns_none() {
        assert_eq!(detect_chart_type("hello world"), None);
        assert_eq!(detect_chart_type(""), None);
    }

    #[test]
    fn equal_scores_break_by_declaration_order() {
        // One sequence keyword, one pie keyword: sequence is declared first.
        let text = "a sequence and a pie chart";
        assert_eq!(detect_chart_type(text), Some(ChartType::Sequence));
    }

    #[test]
    fn template_name_from_use_declaration() {
        assert_eq!(
            extract_template_name("please use \"dark\" template"),
            Some("dark".to_string())
        );
        assert_eq!(extract_template_name("I like trains"), None);
    }

    #[test]
    fn template_alias_resolves_to_canonical_name() {
        assert_eq!(
            extract_template_name("use night theme"),
            Some("dark".to_string())
        );
        assert_eq!(
            extract_template_name("使用暗色模板"),
            Some("dark".to_string())
        );
        assert_eq!(
            extract_template_name("template: corporate"),
            Some("business".to_string())
        );
    }

    #[test]
    fn unknown_explicit_template_passes_through() {
        assert_eq!(
            extract_template_name("template: neon"),
            Some("neon".to_string())
        );
    }

    #[test]
    fn inline_style_from_fenced_block() {
        let text = "make it pretty\n```css\n.node { fill: red; }\n```\nthanks";
        assert_eq!(
            extract_inline_style(text),
            Some(".node { fill: red; }".to_string())
        );
    }

    #[test]
    fn inline_style_from_style_tag_round_trips() {
        let css = ".edge {\n  stroke: #333;\n}";
        let text = format!("<style>\n{}\n</style>", css);
        assert_eq!(extract_inline_style(&text), Some(css.to_string()));
    }

    #[test]
    fn inline_style_absent_returns_none() {
        assert_eq!(extract_inline_style("no styles here"), None);
    }

    #[test]
    fn classify_populates_all_fields_independently() {
        let text = "flowchart of checkout, use \"minimal\" template\n```css\nbody { margin: 0; }\n```";
        let result = classify(text);
        assert_eq!(result.chart_type, Some(ChartType::Flowchart));
        assert_eq!(result.template, Some("minimal".to_string()));
        assert_eq!(result.inline_style, Some("body { margin: 0; }".to_string()));
    }

    #[test]
    fn classify_empty_input_is_all_none() {
        assert_eq!(classify(""), Classification::default());
    }
}
