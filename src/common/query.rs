// src/common/query.rs

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PER_PAGE: i64 = 15;
pub const MAX_PER_PAGE: i64 = 100;
// Acima disso o OFFSET estoura i64
pub const MAX_PAGE: i64 = i64::MAX / MAX_PER_PAGE;

// ?page=2&per_page=30
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageParams {
    pub fn resolve(&self) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).clamp(1, MAX_PAGE),
            per_page: self
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

// Página de resultados no formato que o front já consome
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        let last_page = ((total + request.per_page - 1) / request.per_page).max(1);
        Self {
            data,
            current_page: request.page,
            per_page: request.per_page,
            total,
            last_page,
        }
    }
}

// Query strings chegam como texto: aceitamos "1", "true", "on", "yes" (e os opostos)
pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => match s.as_str() {
            "1" | "true" | "on" | "yes" => Ok(Some(true)),
            "0" | "false" | "off" | "no" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "valor booleano inválido: {}",
                other
            ))),
        },
    }
}

pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("número inválido: {}", s))),
    }
}

// Para o PUT parcial: distingue campo ausente (None) de `null` explícito (Some(None))
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Filters {
        #[serde(default, deserialize_with = "flag")]
        active: Option<bool>,
    }

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        exit_date: Option<Option<String>>,
    }

    #[test]
    fn per_page_is_clamped() {
        let params = PageParams {
            page: Some(0),
            per_page: Some(1_000),
        };
        let request = params.resolve();
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, MAX_PER_PAGE);

        let defaults = PageParams::default().resolve();
        assert_eq!(defaults.per_page, DEFAULT_PER_PAGE);
        assert_eq!(defaults.offset(), 0);
    }

    #[test]
    fn huge_page_does_not_overflow_offset() {
        let request = PageParams {
            page: Some(i64::MAX),
            per_page: None,
        }
        .resolve();
        assert_eq!(request.page, MAX_PAGE);
        assert!(request.offset() > 0);

        let widest = PageParams {
            page: Some(i64::MAX),
            per_page: Some(MAX_PER_PAGE),
        }
        .resolve();
        assert!(widest.offset() > 0);

        let negative = PageParams {
            page: Some(i64::MIN),
            per_page: Some(-5),
        }
        .resolve();
        assert_eq!(negative.page, 1);
        assert_eq!(negative.per_page, 1);
        assert_eq!(negative.offset(), 0);
    }

    #[test]
    fn last_page_rounds_up() {
        let request = PageRequest { page: 3, per_page: 15 };
        let page = Paginated::new(vec![1, 2, 3], request, 31);
        assert_eq!(page.last_page, 3);
        assert_eq!(request.offset(), 30);

        let empty: Paginated<i32> = Paginated::new(vec![], request, 0);
        assert_eq!(empty.last_page, 1);
    }

    #[test]
    fn flags_accept_form_style_values() {
        let on: Filters = serde_json::from_str(r#"{"active": "1"}"#).unwrap();
        assert_eq!(on.active, Some(true));
        let off: Filters = serde_json::from_str(r#"{"active": "false"}"#).unwrap();
        assert_eq!(off.active, Some(false));
        let absent: Filters = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.active, None);
        assert!(serde_json::from_str::<Filters>(r#"{"active": "maybe"}"#).is_err());
    }

    #[test]
    fn double_option_separates_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.exit_date, None);
        let cleared: Patch = serde_json::from_str(r#"{"exit_date": null}"#).unwrap();
        assert_eq!(cleared.exit_date, Some(None));
        let set: Patch = serde_json::from_str(r#"{"exit_date": "2024-01-31"}"#).unwrap();
        assert_eq!(set.exit_date, Some(Some("2024-01-31".to_string())));
    }
}
