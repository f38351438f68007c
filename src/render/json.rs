use serde::Serialize;

use crate::error::DrugLookupError;

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, DrugLookupError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::to_pretty;
    use crate::controller::view::{DrugCard, Panel, SearchView};
    use crate::entities::drug::DrugRecord;
    use crate::render::page::Page;

    #[test]
    fn page_json_includes_panels_and_omits_absent_error() {
        let mut page = Page::default();
        let record = DrugRecord {
            title: "졸피드정".to_string(),
            generic_code: "430101ATB".to_string(),
            product_code: "641901230".to_string(),
            manufacturer: "삼진제약".to_string(),
        };
        page.show_panel(
            Panel::Main,
            vec![DrugCard::from_record(0, &record)],
            "1건".to_string(),
        );

        let json = to_pretty(&page).expect("page json");
        assert!(json.contains('\n'));
        assert!(json.contains("\"count_label\": \"1건\""));
        assert!(json.contains("\"title\": \"졸피드정\""));
        assert!(json.contains("\"submit_enabled\": true"));
        assert!(!json.contains("\"error\""));
    }
}
