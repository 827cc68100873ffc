//! Field rules for open announcements (published procurements)

use super::schema::{clamped, col, FieldRule, TableRule};

pub static PUBLISHED_RULES: [FieldRule; 13] = [
    FieldRule::Labelled {
        field: "customer_name",
        label: "Наименование заказчика",
        pattern: r"1\.\s*Наименование заказчика[^\n]*\n\s*([^\t\n]+)",
        max_chars: 500,
    },
    FieldRule::Text {
        field: "web_resource",
        pattern: r"Адрес интернет ресурса\s*(https?://[\w./\-]+)",
        max_chars: 300,
    },
    FieldRule::Labelled {
        field: "customer_location",
        label: "Местонахождение заказчика",
        pattern: r"(?s)Местонахождение заказчика[^\n]*\n(.*?)(?:\n\s*2\.|\n\s*\n|$)",
        max_chars: 300,
    },
    FieldRule::TableRows(TableRule {
        field: "purchase_items",
        markers: &["код скп", "краткое описание"],
        min_cells: 5,
        columns: &[
            col(1),
            clamped(2, 100),
            col(3),
            col(4),
            col(5),
            col(6),
            clamped(7, 150),
        ],
        limit: 50,
        count_field: Some("total_items"),
        first_row: &[],
    }),
    FieldRule::Text {
        field: "submission_start",
        pattern: r"Дата и время начала[^\n]*\n\s*([\d.: ]+)",
        max_chars: 40,
    },
    FieldRule::Text {
        field: "submission_end",
        pattern: r"Дата и время окончания[^\n]*\n\s*([\d.: ]+)",
        max_chars: 40,
    },
    FieldRule::Text {
        field: "opening_date",
        pattern: r"Дата и время вскрытия[^\n]*\n\s*([\d.: ]+)",
        max_chars: 40,
    },
    FieldRule::Text {
        field: "contact_email",
        pattern: r"Адрес электронной почты[^\n]*\n\s*([\w.\-@]+)",
        max_chars: 200,
    },
    FieldRule::Text {
        field: "contact_phone",
        pattern: r"Номер контактного телефона[^\n]*\n\s*([\d +()\-]+)",
        max_chars: 100,
    },
    FieldRule::Text {
        field: "local_content_requirement",
        pattern: r"Требования по местному содержанию[^\n]*\n\s*([\d %]+)",
        max_chars: 40,
    },
    FieldRule::Text {
        field: "contract_deadline",
        pattern: r"Требуемый срок заключения договора[^\n]*\n\s*([^\t\n]+)",
        max_chars: 300,
    },
    FieldRule::Text {
        field: "signed_by",
        pattern: r"Имя подписавшего:\s*([^\t\n]+)",
        max_chars: 200,
    },
    FieldRule::Text {
        field: "signed_date",
        pattern: r"Дата подписи:\s*(\d{2}\.\d{2}\.\d{4}\s+\d{2}:\d{2}:\d{2})",
        max_chars: 40,
    },
];
