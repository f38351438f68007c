use serde::{Deserialize, Serialize};

use crate::error::DrugLookupError;

/// Row count requested from the search endpoint for every form submission.
pub const DEFAULT_NUM_ROWS: usize = 20;

pub const VALIDATION_MESSAGE: &str = "최소 하나의 검색 조건을 입력해주세요.";

pub const TITLE_FALLBACK: &str = "정보 없음";
pub const CODE_FALLBACK: &str = "N/A";

/// Raw form field values, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub generic_code: String,
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub manufacturer: String,
}

impl SearchForm {
    pub fn is_blank(&self) -> bool {
        [
            &self.item_name,
            &self.generic_code,
            &self.product_code,
            &self.manufacturer,
        ]
        .iter()
        .all(|v| v.trim().is_empty())
    }

    /// Trims every field and checks that at least one identifying field is set.
    pub fn to_query(&self) -> Result<SearchQuery, DrugLookupError> {
        if self.is_blank() {
            return Err(DrugLookupError::Validation(VALIDATION_MESSAGE.into()));
        }
        Ok(SearchQuery {
            item_name: self.item_name.trim().to_string(),
            generic_code: self.generic_code.trim().to_string(),
            product_code: self.product_code.trim().to_string(),
            manufacturer: self.manufacturer.trim().to_string(),
            num_rows: DEFAULT_NUM_ROWS,
        })
    }
}

/// Request body of `POST /api/search`. Unset fields travel as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    #[serde(rename = "itmNm")]
    pub item_name: String,
    #[serde(rename = "gnlNmCd")]
    pub generic_code: String,
    #[serde(rename = "mdsCd")]
    pub product_code: String,
    #[serde(rename = "mnfEntpNm")]
    pub manufacturer: String,
    pub num_rows: usize,
}

/// Request body of `POST /api/identical`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdenticalQuery {
    #[serde(rename = "gnlNmCd")]
    pub generic_code: String,
}

impl IdenticalQuery {
    pub fn new(generic_code: &str) -> Result<Self, DrugLookupError> {
        let generic_code = generic_code.trim();
        if generic_code.is_empty() {
            return Err(DrugLookupError::InvalidArgument(
                "Generic code is required. Example: drug-lookup identical 281700ATB".into(),
            ));
        }
        Ok(Self {
            generic_code: generic_code.to_string(),
        })
    }
}

/// Canonical drug row, independent of which key scheme the backend used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugRecord {
    pub title: String,
    pub generic_code: String,
    pub product_code: String,
    pub manufacturer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<DrugRecord>,
    pub is_identical_search: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdenticalResponse {
    pub success: bool,
    pub results: Vec<DrugRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(item: &str, generic: &str, product: &str, maker: &str) -> SearchForm {
        SearchForm {
            item_name: item.into(),
            generic_code: generic.into(),
            product_code: product.into(),
            manufacturer: maker.into(),
        }
    }

    #[test]
    fn blank_form_is_a_validation_error() {
        let err = form("", "  ", "\t", " ").to_query().unwrap_err();
        assert!(matches!(err, DrugLookupError::Validation(_)));
        assert_eq!(err.to_string(), VALIDATION_MESSAGE);
    }

    #[test]
    fn query_body_keeps_empty_fields_and_fixed_row_count() {
        let query = form("Aspirin", "", "", "").to_query().unwrap();
        let body = serde_json::to_value(&query).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "itmNm": "Aspirin",
                "gnlNmCd": "",
                "mdsCd": "",
                "mnfEntpNm": "",
                "num_rows": 20
            })
        );
    }

    #[test]
    fn query_fields_are_trimmed() {
        let query = form("  졸피드정 ", "", " A03850091", "건일제약  ")
            .to_query()
            .unwrap();
        assert_eq!(query.item_name, "졸피드정");
        assert_eq!(query.product_code, "A03850091");
        assert_eq!(query.manufacturer, "건일제약");
    }

    #[test]
    fn identical_query_requires_code() {
        let err = IdenticalQuery::new("   ").unwrap_err();
        assert!(matches!(err, DrugLookupError::InvalidArgument(_)));
        assert_eq!(
            IdenticalQuery::new(" 281700ATB ").unwrap().generic_code,
            "281700ATB"
        );
    }
}
