/// One editable section of a strategy document; `key` doubles as its column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategySection {
    pub key: &'static str,
    pub name: &'static str,
    /// Heading used in tool descriptions, e.g. "Section 6: Google Ads Management".
    pub heading: &'static str,
    pub tool: &'static str,
}

const fn section(
    key: &'static str,
    name: &'static str,
    heading: &'static str,
    tool: &'static str,
) -> StrategySection {
    StrategySection {
        key,
        name,
        heading,
        tool,
    }
}

/// Sections in document order.
pub static STRATEGY_SECTIONS: [StrategySection; 17] = [
    section(
        "executive_summary",
        "Executive Summary",
        "the Executive Summary section",
        "editStrategyExecutiveSummary",
    ),
    section(
        "section_1",
        "Strategic Foundation",
        "Section 1: Strategic Foundation",
        "editStrategySection1",
    ),
    section(
        "section_2",
        "Market & Competitive Analysis",
        "Section 2: Market & Competitive Analysis",
        "editStrategySection2",
    ),
    section(
        "section_3",
        "Audience Intelligence",
        "Section 3: Audience Intelligence",
        "editStrategySection3",
    ),
    section(
        "section_4",
        "Value Proposition & Messaging",
        "Section 4: Value Proposition & Messaging",
        "editStrategySection4",
    ),
    section(
        "section_5",
        "Setsail Services Overview",
        "Section 5: Setsail Services Overview",
        "editStrategySection5",
    ),
    section(
        "section_6",
        "Google Ads Management",
        "Section 6: Google Ads Management",
        "editStrategySection6",
    ),
    section(
        "section_7",
        "Social Media Management",
        "Section 7: Social Media Management",
        "editStrategySection7",
    ),
    section(
        "section_8",
        "SEO Services",
        "Section 8: SEO Services",
        "editStrategySection8",
    ),
    section(
        "section_9",
        "Overall Performance Targets",
        "Section 9: Overall Performance Targets",
        "editStrategySection9",
    ),
    section(
        "section_10",
        "Execution Timeline",
        "Section 10: Execution Timeline",
        "editStrategySection10",
    ),
    section(
        "section_11",
        "Budget & Investment",
        "Section 11: Budget & Investment",
        "editStrategySection11",
    ),
    section(
        "section_12",
        "Communication & Support",
        "Section 12: Communication & Support",
        "editStrategySection12",
    ),
    section(
        "section_13",
        "Success Indicators",
        "Section 13: Success Indicators",
        "editStrategySection13",
    ),
    section(
        "section_14",
        "Next Steps & Kickoff",
        "Section 14: Next Steps & Kickoff",
        "editStrategySection14",
    ),
    section(
        "appendix_a",
        "Glossary of Terms",
        "Appendix A: Glossary of Terms",
        "editStrategyAppendixA",
    ),
    section(
        "appendix_b",
        "Key Contacts",
        "Appendix B: Key Contacts",
        "editStrategyAppendixB",
    ),
];

pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Join the non-empty sections, in document order, into one markdown document.
pub fn assemble_document<'a, F>(content_of: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    STRATEGY_SECTIONS
        .iter()
        .filter_map(|s| content_of(s.key))
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
        .trim()
        .to_string()
}
