use serde_json::{Map, Value};

use crate::entities::drug::{
    CODE_FALLBACK, DrugRecord, IdenticalResponse, SearchResponse, TITLE_FALLBACK,
};
use crate::sources::search_api::{RawIdenticalResponse, RawSearchResponse};

// Latin-coded key first, then the localized column names of the bulk dataset.
const TITLE_KEYS: &[&str] = &["itmNm", "품목명", "제품명"];
const GENERIC_CODE_KEYS: &[&str] = &["gnlNmCd", "주성분코드"];
const PRODUCT_CODE_KEYS: &[&str] = &["mdsCd", "제품코드"];
const MANUFACTURER_KEYS: &[&str] = &["mnfEntpNm", "제조업체명"];

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_present(row: &Map<String, Value>, keys: &[&str], fallback: &str) -> String {
    keys.iter()
        .find_map(|key| row.get(*key).and_then(scalar_text))
        .unwrap_or_else(|| fallback.to_string())
}

pub fn from_row(row: &Value) -> DrugRecord {
    let empty = Map::new();
    let row = row.as_object().unwrap_or(&empty);
    DrugRecord {
        title: first_present(row, TITLE_KEYS, TITLE_FALLBACK),
        generic_code: first_present(row, GENERIC_CODE_KEYS, CODE_FALLBACK),
        product_code: first_present(row, PRODUCT_CODE_KEYS, CODE_FALLBACK),
        manufacturer: first_present(row, MANUFACTURER_KEYS, CODE_FALLBACK),
    }
}

pub fn from_rows(rows: &[Value]) -> Vec<DrugRecord> {
    rows.iter().map(from_row).collect()
}

pub fn from_search_response(raw: RawSearchResponse) -> SearchResponse {
    SearchResponse {
        success: raw.success,
        results: from_rows(&raw.results),
        is_identical_search: raw.is_identical_search,
        error: raw.error.filter(|e| !e.trim().is_empty()),
    }
}

pub fn from_identical_response(raw: RawIdenticalResponse) -> IdenticalResponse {
    IdenticalResponse {
        success: raw.success,
        results: from_rows(&raw.results),
        count: raw.count,
        error: raw.error.filter(|e| !e.trim().is_empty()),
    }
}
