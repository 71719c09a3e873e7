use serde::{Deserialize, Serialize};

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Paging and search parameters shared by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub search: String,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: String::new(),
        }
    }
}

impl ListParams {
    pub fn page(page: u32) -> Self {
        Self {
            page: page.max(1),
            ..Default::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into().trim().to_string();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn total_pages(&self, limit: u32) -> u64 {
        if limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_normalization() {
        let params = ListParams::page(0).with_search("  ada  ").with_limit(0);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 1);
        assert_eq!(params.search, "ada");
    }

    #[test]
    fn test_params_query_omits_empty_search() {
        let value = serde_json::to_value(ListParams::default()).unwrap();
        assert_eq!(value, serde_json::json!({"page": 1, "limit": 20}));
    }

    #[test]
    fn test_page_defaults_and_total_pages() {
        let page: Page<u32> = serde_json::from_str(r#"{"items": [1, 2], "total": 41}"#).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages(20), 3);
        assert_eq!(page.total_pages(0), 0);
    }
}
