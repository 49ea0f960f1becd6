//! Pillbox 도메인 에러 타입.

use thiserror::Error;

/// 저장소 계층 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 유니크 제약 위반 (중복 사용자명, 중복 유닛 ID)
    #[error("이미 존재함: {0}")]
    Conflict(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 저장된 문서 직렬화/역직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 저장된 값이 도메인 규칙과 맞지 않음 (예: 알 수 없는 역할)
    #[error("손상된 레코드: {0}")]
    Corrupt(String),
}

/// 저장소 작업 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// 프로필 가져오기 페이로드 에러.
///
/// 메시지는 그대로 클라이언트에 전달됩니다.
#[derive(Debug, Error)]
pub enum ImportError {
    /// JSON 파싱 실패
    #[error("{0}")]
    Parse(String),

    /// 최상위가 배열이 아님
    #[error("import payload must be a JSON array")]
    NotAnArray,

    /// 개별 항목 형식 오류
    #[error("item {index}: {reason}")]
    InvalidItem { index: usize, reason: String },

    /// 업로드에 `file` 필드가 없음
    #[error("missing multipart field \"file\"")]
    MissingFile,
}

/// 프로필 작업 에러.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// 프로필 없음 (경로 ID가 숫자가 아닌 경우 포함)
    #[error("profile not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_messages() {
        assert_eq!(
            ImportError::NotAnArray.to_string(),
            "import payload must be a JSON array"
        );
        let err = ImportError::InvalidItem {
            index: 2,
            reason: "expected a JSON object".to_string(),
        };
        assert_eq!(err.to_string(), "item 2: expected a JSON object");
    }

    #[test]
    fn test_store_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Serialization(_)));
    }
}
