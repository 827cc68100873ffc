use crate::record::Classification;

/// One classification rule: any marker present selects the classification
struct ClassificationRule {
    classification: Classification,
    markers: &'static [&'static str],
}

/// Rules in precedence order; the first rule with a matching marker wins.
///
/// A page carrying both marker sets is classified as completed.
const CLASSIFICATION_RULES: [ClassificationRule; 2] = [
    ClassificationRule {
        classification: Classification::Completed,
        markers: &[
            "Протокол подведения итогов",
            "способом из одного источника",
            "Предмет приобретения ТРУ способом",
        ],
    },
    ClassificationRule {
        classification: Classification::Published,
        markers: &[
            "Время начала и окончания представления",
            "Дата и время вскрытия",
            "Предмет закупа способом через систему",
        ],
    },
];

/// Classifies a detail page from its whitespace-normalized visible text
pub fn classify(text: &str) -> Classification {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.markers.iter().any(|marker| text.contains(marker)))
        .map(|rule| rule.classification)
        .unwrap_or(Classification::Unknown)
}
