// src/common/pagination.rs

/// Tamanhos de página aceitos nas listagens.
pub const PAGE_SIZES: [u32; 5] = [10, 25, 50, 100, 200];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub offset: u64,
}

/// Lê um número da query string; qualquer coisa que não seja inteiro vira `None`.
pub fn lenient_number(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse().ok())
}

/// Resolve a página pedida contra o total de registros.
/// Tamanho fora da lista cai no padrão; página além da última cai na última.
pub fn page_window(total: u64, page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> PageWindow {
    let per_page = per_page
        .filter(|size| PAGE_SIZES.contains(size))
        .unwrap_or(default_per_page);

    let total_pages = total.div_ceil(u64::from(per_page)).max(1);
    let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);
    let page = page.unwrap_or(1).clamp(1, total_pages);

    PageWindow {
        page,
        per_page,
        total_pages,
        offset: u64::from(page - 1) * u64::from(per_page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_page_size_falls_back_to_default() {
        let window = page_window(100, Some(2), Some(7), 25);
        assert_eq!(window.per_page, 25);
        assert_eq!(window.offset, 25);
    }

    #[test]
    fn page_beyond_the_end_shows_the_last_page() {
        let window = page_window(51, Some(9), Some(25), 25);
        assert_eq!((window.page, window.total_pages, window.offset), (3, 3, 50));
    }

    #[test]
    fn empty_result_still_has_one_page() {
        assert_eq!(
            page_window(0, Some(0), None, 10),
            PageWindow { page: 1, per_page: 10, total_pages: 1, offset: 0 }
        );
    }

    #[test]
    fn non_numeric_page_is_ignored() {
        assert_eq!(lenient_number(Some("abc")), None);
        assert_eq!(lenient_number(Some(" 3 ")), Some(3));
        assert_eq!(lenient_number(None), None);
    }
}
