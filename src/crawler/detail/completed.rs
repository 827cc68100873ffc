//! Field rules for results protocols (completed procurements)

use super::schema::{clamped, col, FieldRule, TableRule};

pub static COMPLETED_RULES: [FieldRule; 11] = [
    FieldRule::Labelled {
        field: "customer_name",
        label: "Наименование заказчика",
        pattern: r"(?s)1\.\s*Наименование заказчика[:\s]*(.*?)(?:\n\s*2\.|\n\s*\n|$)",
        max_chars: 500,
    },
    FieldRule::Labelled {
        field: "customer_location",
        label: "Местонахождение заказчика",
        pattern: r"(?s)2\.\s*Местонахождение заказчика[:\s]*(.*?)(?:\n\s*3\.|\n\s*\n|$)",
        max_chars: 500,
    },
    FieldRule::Labelled {
        field: "purchase_basis",
        label: "Основание для закупа",
        pattern: r"(?s)3\.\s*Основание для закупа[^:]*:(.*?)(?:\n\s*4\.|\n\s*\n|$)",
        max_chars: 1000,
    },
    FieldRule::TextList {
        field: "lots",
        pattern: r"(?s)Номер и наименование лота:\s*(\d+),\s*(.*?)\s*Сумма.*?(\d[\d\s,.]*\d)\s*тенге",
        template: "Лот ${1}: ${2} - ${3} тг",
        limit: 20,
        count_field: Some("total_lots"),
    },
    FieldRule::TableRows(TableRule {
        field: "skp_items",
        markers: &["код скп"],
        min_cells: 4,
        columns: &[col(0), clamped(1, 100), col(2), col(3)],
        limit: 10,
        count_field: None,
        first_row: &[],
    }),
    FieldRule::TextList {
        field: "licenses",
        pattern: r"Лицензия\(контракт\)\s*№\s*(\d+)\s*от\s*([\d.]+)",
        template: "№${1} от ${2}",
        limit: 20,
        count_field: None,
    },
    // Suppliers in ranking order; the first is the winner
    FieldRule::TableRows(TableRule {
        field: "suppliers",
        markers: &["наименование", "поставщика"],
        min_cells: 2,
        columns: &[clamped(1, 200), clamped(2, 200), col(3), clamped(4, 100)],
        limit: 5,
        count_field: None,
        first_row: &[(0, "winner_supplier"), (1, "winner_address")],
    }),
    FieldRule::TableRows(TableRule {
        field: "all_prices",
        markers: &["предложенная цена"],
        min_cells: 3,
        columns: &[clamped(1, 100), col(2), col(3)],
        limit: 5,
        count_field: None,
        first_row: &[(1, "winner_price"), (2, "local_content")],
    }),
    FieldRule::Text {
        field: "purchase_code",
        pattern: r"8\.\s*Код закупки[:\s]*([A-Z]+[\w.\-]+)",
        max_chars: 100,
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
