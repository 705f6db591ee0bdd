//! Query directives - the OData-style options of a retrieve request.

use crate::error::ProductDataError;

/// Literal `$inlinecount` value asking for data and count together.
pub const INLINE_COUNT_ALL_PAGES: &str = "allpages";

/// The directives of one retrieve request.
///
/// Values are kept as received; the retrieval engine parses and validates
/// them. Build from query-string pairs with [`QueryDirectives::from_pairs`]
/// or with the `with_*` builders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDirectives {
    /// `$count`: presence only.
    pub count: bool,
    /// `$filter`: predicate expression evaluated by the store.
    pub filter: Option<String>,
    /// `$top`: requested page size.
    pub top: Option<String>,
    /// `$skip`: entries to skip before the page.
    pub skip: Option<String>,
    /// `$orderby`: `sku`, `sku asc` or `sku desc`.
    pub order_by: Option<String>,
    /// `$inlinecount`: only `allpages` has an effect.
    pub inline_count: Option<String>,
    /// `$select`: accepted, but entries are always returned whole.
    pub select: Option<String>,
    /// Query parameters that are not directives were present.
    pub has_other_params: bool,
}

impl QueryDirectives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build directives from decoded query-string pairs.
    ///
    /// Keys are the `$`-prefixed OData names. When a key repeats, the first
    /// value is used. Keys without `$` are not directives; their presence is
    /// recorded but their values are ignored. An unrecognized `$` key is a
    /// validation error.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ProductDataError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut directives = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "$count" => {
                    directives.count = true;
                    continue;
                }
                "$filter" => &mut directives.filter,
                "$top" => &mut directives.top,
                "$skip" => &mut directives.skip,
                "$orderby" => &mut directives.order_by,
                "$inlinecount" => &mut directives.inline_count,
                "$select" => &mut directives.select,
                other if other.starts_with('$') => {
                    return Err(ProductDataError::Validation(format!(
                        "unsupported query directive {}",
                        other
                    )))
                }
                _ => {
                    directives.has_other_params = true;
                    continue;
                }
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        Ok(directives)
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_top(mut self, top: impl Into<String>) -> Self {
        self.top = Some(top.into());
        self
    }

    pub fn with_skip(mut self, skip: impl Into<String>) -> Self {
        self.skip = Some(skip.into());
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_inline_count(mut self, inline_count: impl Into<String>) -> Self {
        self.inline_count = Some(inline_count.into());
        self
    }

    pub fn with_select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    /// True when `$inlinecount=allpages` is set.
    pub fn inline_count_all_pages(&self) -> bool {
        self.inline_count.as_deref() == Some(INLINE_COUNT_ALL_PAGES)
    }

    /// True when `$count` is the only query parameter present.
    pub fn is_pure_count(&self) -> bool {
        self.count
            && self.filter.is_none()
            && self.top.is_none()
            && self.skip.is_none()
            && self.order_by.is_none()
            && self.inline_count.is_none()
            && self.select.is_none()
            && !self.has_other_params
    }
}
