//! 환자 프로필 문서.
//!
//! 프로필은 반정형 JSON 문서입니다. 최소 스키마(`mrn`, `dob`, `status`,
//! `vitals`, 임상 목록들)는 생성 시 기본값으로 채워지고, 그 외 최상위 키는
//! 자유롭게 추가할 수 있습니다.
//!
//! 수정은 **최상위 얕은 병합**입니다. 중첩 객체(`vitals` 등)는 통째로
//! 교체되며 깊은 병합은 하지 않습니다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ImportError;

/// 프로필 문서 (최상위 JSON 객체).
pub type ProfileDocument = Map<String, Value>;

/// 이름이 없을 때의 기본 환자 이름.
pub const DEFAULT_PROFILE_NAME: &str = "New Patient";
/// 기본 입원 상태.
pub const DEFAULT_STATUS: &str = "Admitted";
/// 가져오기 항목에 이름이 없을 때의 이름.
pub const IMPORTED_PROFILE_NAME: &str = "Imported";

/// 빈 문자열로 기본 설정되는 필드.
pub const TEXT_FIELDS: [&str; 2] = ["mrn", "dob"];
/// 활력징후 필드 (모두 자유 텍스트).
pub const VITAL_FIELDS: [&str; 5] = ["hr", "bp", "rr", "temp", "spo2"];
/// 빈 목록으로 기본 설정되는 순서 있는 임상 목록.
pub const LIST_FIELDS: [&str; 6] = ["meds", "orders", "labs", "imaging", "mar", "notes"];

/// 저장된 프로필.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub document: ProfileDocument,
}

impl Profile {
    /// `id`가 포함된 전체 프로필 JSON.
    pub fn into_json(self) -> Value {
        let mut document = self.document;
        document.insert("id".to_string(), Value::from(self.id));
        Value::Object(document)
    }
}

/// 목록/검색 결과 `{id, name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct ProfileSummary {
    pub id: i64,
    pub name: String,
}

/// 내보내기 항목 `{id, name, profile}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct ExportedProfile {
    pub id: i64,
    pub name: String,
    #[cfg_attr(feature = "utoipa-support", schema(value_type = Object))]
    pub profile: ProfileDocument,
}

/// 가져오기 한 건 (파싱 완료).
#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    pub name: String,
    pub document: ProfileDocument,
}

/// 값이 "제공된" 것으로 볼 수 있는지.
///
/// 누락, `null`, `false`, 빈 문자열, 0은 제공되지 않은 것으로 봅니다.
fn is_supplied(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// 이름으로 쓸 문자열 (문자열이 아니면 JSON 표기).
fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 모든 필드가 빈 활력징후 레코드.
pub fn empty_vitals() -> Value {
    let vitals: Map<String, Value> = VITAL_FIELDS
        .iter()
        .map(|field| (field.to_string(), Value::String(String::new())))
        .collect();
    Value::Object(vitals)
}

/// 생성 입력에 기본값을 채운 새 프로필 문서.
///
/// 입력의 `id`는 무시되며 (저장소가 부여), 최소 스키마 외의 키는 보존됩니다.
pub fn new_profile_document(input: &ProfileDocument) -> ProfileDocument {
    let mut document = input.clone();
    document.remove("id");

    let mut fill = |key: &str, default: Value| {
        if !is_supplied(document.get(key)) {
            document.insert(key.to_string(), default);
        }
    };

    fill("name", Value::String(DEFAULT_PROFILE_NAME.to_string()));
    for field in TEXT_FIELDS {
        fill(field, Value::String(String::new()));
    }
    fill("status", Value::String(DEFAULT_STATUS.to_string()));
    fill("vitals", empty_vitals());
    for field in LIST_FIELDS {
        fill(field, Value::Array(Vec::new()));
    }

    document
}

/// 문서의 환자 이름 (없으면 `None`).
pub fn document_name(document: &ProfileDocument) -> Option<String> {
    let value = document.get("name");
    if is_supplied(value) {
        value.map(display_text)
    } else {
        None
    }
}

/// 최상위 얕은 병합.
///
/// `partial`의 키가 `current`를 덮어쓰고 나머지는 유지됩니다.
/// 양쪽의 `id` 키는 제거됩니다.
pub fn merge_document(current: &ProfileDocument, partial: &ProfileDocument) -> ProfileDocument {
    let mut merged = current.clone();
    for (key, value) in partial {
        merged.insert(key.clone(), value.clone());
    }
    merged.remove("id");
    merged
}

/// 검색어 정규화. 빈 검색어는 `None` (결과 없음).
pub fn normalize_query(query: &str) -> Option<String> {
    if query.is_empty() {
        None
    } else {
        Some(query.to_lowercase())
    }
}

/// `name + " " + 직렬화된 문서`에 대한 대소문자 무시 부분 문자열 일치.
///
/// `needle`은 [`normalize_query`]로 소문자화된 값이어야 합니다.
pub fn matches_query(name: &str, serialized_document: &str, needle: &str) -> bool {
    let haystack = format!("{} {}", name, serialized_document).to_lowercase();
    haystack.contains(needle)
}

/// 가져오기 페이로드 파싱.
///
/// 전체가 JSON 배열이어야 하고 각 항목은 `{name?, profile}` 또는 문서
/// 그 자체입니다. 하나라도 잘못되면 전체가 실패하며, 문서에는 기본값을
/// 채우지 않습니다.
pub fn parse_import(payload: &[u8]) -> Result<Vec<ImportItem>, ImportError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| ImportError::Parse(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(ImportError::NotAnArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_import_item(index, item))
        .collect()
}

fn parse_import_item(index: usize, item: Value) -> Result<ImportItem, ImportError> {
    let Value::Object(mut object) = item else {
        return Err(ImportError::InvalidItem {
            index,
            reason: "expected a JSON object".to_string(),
        });
    };

    let explicit_name = document_name(&object);

    let document = if is_supplied(object.get("profile")) {
        match object.remove("profile") {
            Some(Value::Object(profile)) => profile,
            _ => {
                return Err(ImportError::InvalidItem {
                    index,
                    reason: "\"profile\" must be a JSON object".to_string(),
                })
            }
        }
    } else {
        object
    };

    let name = explicit_name
        .or_else(|| document_name(&document))
        .unwrap_or_else(|| IMPORTED_PROFILE_NAME.to_string());

    Ok(ImportItem { name, document })
}
