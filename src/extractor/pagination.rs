use serde::Serialize;

use crate::config::Schema;
use crate::document::Node;
use crate::selector::CssSelector;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: u32,
    pub has_prev_page: bool,
    pub prev_page: Option<u32>,
    pub has_next_page: bool,
    pub next_page: Option<u32>,
    pub total_pages: u32,
}

impl PaginationInfo {
    pub fn new(current_page: u32, has_prev: bool, has_next: bool, total_pages: u32) -> Self {
        let has_prev = has_prev && current_page > 1;

        Self {
            current_page,
            has_prev_page: has_prev,
            prev_page: has_prev.then(|| current_page - 1),
            has_next_page: has_next,
            next_page: has_next.then(|| current_page + 1),
            total_pages: total_pages.max(current_page),
        }
    }
}

pub struct PaginationReader {
    region: CssSelector,
    page_number: CssSelector,
    next: CssSelector,
    prev: CssSelector,
}

impl PaginationReader {
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            region: schema.pagination.clone(),
            page_number: schema.page_number.clone(),
            next: schema.next_page.clone(),
            prev: schema.prev_page.clone(),
        }
    }

    /// Reads the first pagination region under `root`. `None` means a single-page result.
    ///
    /// A numbered link to the adjacent page counts as a prev/next control too.
    pub fn read(&self, root: Node<'_>, current_page: u32) -> Option<PaginationInfo> {
        let region = root.find(&self.region)?;
        let current_page = current_page.max(1);

        let numbers = region
            .select(&self.page_number)
            .filter_map(|node| node.clean_text().replace(',', "").parse::<u32>().ok())
            .collect::<Vec<_>>();

        let total_pages = numbers.iter().copied().max().unwrap_or(1);
        let has_prev = region.find(&self.prev).is_some() || numbers.contains(&(current_page - 1));
        let has_next = region.find(&self.next).is_some()
            || current_page
                .checked_add(1)
                .is_some_and(|next| numbers.contains(&next));

        Some(PaginationInfo::new(
            current_page,
            has_prev,
            has_next,
            total_pages,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn read(html: &str, current_page: u32) -> Option<PaginationInfo> {
        let doc = Document::parse_str(html).unwrap();

        PaginationReader::from_schema(&Schema::default()).read(doc.root(), current_page)
    }

    #[test]
    fn no_region() {
        assert_eq!(read("<div class=posts><a href=/anime/x/>x</a></div>", 1), None);
    }

    #[test]
    fn only_next() {
        let info = read(
            r#"<div class="pagination"><a class="next page-numbers" href="/page/2/">Next »</a></div>"#,
            1,
        )
        .unwrap();

        assert_eq!(info, PaginationInfo::new(1, false, true, 1));
        assert_eq!(info.total_pages, 1);
        assert_eq!(info.next_page, Some(2));
        assert_eq!(info.prev_page, None);
    }

    #[test]
    fn numbered_links() {
        let info = read(
            r#"
            <div class="pagination">
              <a class="page-numbers" href="/page/1/">1</a>
              <span class="page-numbers current">2</span>
              <a class="page-numbers" href="/page/3/">3</a>
              <a class="next page-numbers" href="/page/3/">Next</a>
            </div>
            "#,
            2,
        )
        .unwrap();

        assert_eq!(
            info,
            PaginationInfo {
                current_page: 2,
                has_prev_page: true,
                prev_page: Some(1),
                has_next_page: true,
                next_page: Some(3),
                total_pages: 3,
            }
        );
    }

    #[test]
    fn thousands_and_last_page() {
        let info = read(
            r#"
            <div class="pagination">
              <a class="prev page-numbers" href="/page/1,199/">Prev</a>
              <a class="page-numbers" href="/page/1/">1</a>
              <span class="page-numbers dots">…</span>
              <span class="page-numbers current">1,200</span>
            </div>
            "#,
            1200,
        )
        .unwrap();

        assert!(info.has_prev_page);
        assert_eq!(info.prev_page, Some(1199));
        assert!(!info.has_next_page);
        assert_eq!(info.next_page, None);
        assert_eq!(info.total_pages, 1200);
    }

    #[test]
    fn total_never_below_current() {
        let info = read(r#"<div class="pagination"><a class="prev">Prev</a></div>"#, 7).unwrap();

        assert_eq!(info.total_pages, 7);
        assert_eq!(info.prev_page, Some(6));
    }

    #[test]
    fn serializes_absent_pages_as_null() {
        let json = serde_json::to_value(PaginationInfo::new(1, false, false, 1)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "currentPage": 1,
                "hasPrevPage": false,
                "prevPage": null,
                "hasNextPage": false,
                "nextPage": null,
                "totalPages": 1,
            })
        );
    }
}
