use serde::Deserialize;

/// Subset of the DataForSEO SERP response we consume.
#[derive(Debug, Deserialize)]
pub struct SerpResponse {
    #[serde(default)]
    pub tasks: Vec<SerpTask>,
}

#[derive(Debug, Deserialize)]
pub struct SerpTask {
    #[serde(default)]
    pub result: Option<Vec<SerpResult>>,
}

#[derive(Debug, Deserialize)]
pub struct SerpResult {
    #[serde(default)]
    pub items: Option<Vec<SerpItem>>,
}

#[derive(Debug, Deserialize)]
pub struct SerpItem {
    #[serde(default)]
    pub url: Option<String>,
}

impl SerpResponse {
    /// Ranked result URLs from the first task's first result page.
    pub fn urls(self) -> Vec<String> {
        self.tasks
            .into_iter()
            .next()
            .and_then(|t| t.result)
            .and_then(|r| r.into_iter().next())
            .and_then(|r| r.items)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| item.url)
            .collect()
    }
}
