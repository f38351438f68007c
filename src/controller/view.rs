use serde::Serialize;

use crate::entities::drug::{DrugRecord, SearchForm};

/// Result panels of the search page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Main,
    Identical,
}

impl Panel {
    pub const ALL: [Panel; 2] = [Panel::Main, Panel::Identical];

    pub fn heading(self) -> &'static str {
        match self {
            Panel::Main => "검색 결과",
            Panel::Identical => "동일성분 의약품",
        }
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            Panel::Main => "검색 결과가 없습니다.",
            Panel::Identical => "동일성분 의약품이 없습니다.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardField {
    pub label: &'static str,
    pub value: String,
}

/// One rendered result card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugCard {
    pub index: usize,
    pub title: String,
    pub fields: Vec<CardField>,
}

impl DrugCard {
    pub fn from_record(index: usize, record: &DrugRecord) -> Self {
        Self {
            index,
            title: record.title.clone(),
            fields: vec![
                CardField {
                    label: "성분코드",
                    value: record.generic_code.clone(),
                },
                CardField {
                    label: "제품코드",
                    value: record.product_code.clone(),
                },
                CardField {
                    label: "제조업체",
                    value: record.manufacturer.clone(),
                },
            ],
        }
    }

    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}

pub fn count_label(count: usize) -> String {
    format!("{count}건")
}

/// Render targets the controller drives: form inputs, loading indicator,
/// submit control, error banner, and the two result panels.
pub trait SearchView: Send {
    fn set_form(&mut self, form: &SearchForm);
    fn clear_form(&mut self);

    fn set_loading(&mut self, visible: bool);
    fn set_submit_enabled(&mut self, enabled: bool);

    fn show_error(&mut self, message: &str);
    fn hide_error(&mut self);

    /// Replaces the panel's cards, sets its count label, and reveals it.
    fn show_panel(&mut self, panel: Panel, cards: Vec<DrugCard>, count_label: String);
    /// Hides the panel and drops its cards.
    fn hide_panel(&mut self, panel: Panel);
}
