pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw listing parameters as they arrive in the query string.
/// Kept as text so bad numbers coerce to defaults instead of failing the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub category: Option<String>,
}

impl ListParams {
    /// Lenient query-string parse: the first occurrence of a key wins and
    /// unknown keys are ignored. Never fails.
    pub fn from_query(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "page" => &mut params.page,
                "page_size" => &mut params.page_size,
                "category" => &mut params.category,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// A validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Non-positive pages become 1; sizes outside 1..=100 become 10
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = u32::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let page_size = u32::try_from(page_size)
            .ok()
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, page_size }
    }

    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(i64::from(DEFAULT_PAGE));
        let page_size = page_size
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(i64::from(DEFAULT_PAGE_SIZE));
        Self::new(page, page_size)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Cut `[offset, offset + page_size)` out of an already filtered set
    pub fn window<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(offset)
            .take(self.page_size as usize)
            .collect()
    }
}

/// Product listing: optional category equality filter plus a page window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub page: PageRequest,
}

impl ProductQuery {
    pub fn matches_category(&self, category: &str) -> bool {
        self.category.as_deref().map_or(true, |wanted| wanted == category)
    }
}

impl From<ListParams> for ProductQuery {
    fn from(params: ListParams) -> Self {
        Self {
            category: params.category.filter(|c| !c.is_empty()),
            page: PageRequest::parse(params.page.as_deref(), params.page_size.as_deref()),
        }
    }
}
