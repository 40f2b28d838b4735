// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const MAX_PAGE_SIZE: i64 = 100;

// Parâmetros de paginação vindos da query string (?page=2&limit=20)
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Página (começa em 1)
    pub page: Option<i64>,
    /// Itens por página (máximo 100)
    pub limit: Option<i64>,
}

impl PageParams {
    /// Normaliza os valores: página mínima 1, tamanho entre 1 e MAX_PAGE_SIZE.
    /// A página é limitada para que o OFFSET caiba em i64.
    pub fn resolve(self, default_size: i64) -> PageRequest {
        let page_size = self
            .limit
            .filter(|l| *l >= 1)
            .unwrap_or(default_size)
            .clamp(1, MAX_PAGE_SIZE);
        let page = self
            .page
            .filter(|p| *p >= 1)
            .unwrap_or(1)
            .min(i64::MAX / page_size);
        PageRequest { page, page_size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

// Resposta paginada padrão: { items, total, page, pageSize, pages }
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            pages: page_count(total, request.page_size),
        }
    }
}

/// ceil(total / page_size); zero registros => zero páginas.
pub fn page_count(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_is_ceiling_of_total_over_size() {
        assert_eq!(page_count(0, 20), 0);
        assert_eq!(page_count(1, 20), 1);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
        assert_eq!(page_count(100, 7), 15);
    }

    #[test]
    fn params_are_clamped() {
        let req = PageParams { page: Some(0), limit: Some(500) }.resolve(20);
        assert_eq!(req, PageRequest { page: 1, page_size: MAX_PAGE_SIZE });

        let req = PageParams { page: None, limit: Some(-3) }.resolve(50);
        assert_eq!(req, PageRequest { page: 1, page_size: 50 });

        let req = PageParams { page: Some(3), limit: Some(10) }.resolve(20);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn huge_page_number_keeps_the_offset_in_range() {
        let req = PageParams { page: Some(i64::MAX), limit: Some(20) }.resolve(20);
        assert_eq!(req.page, i64::MAX / 20);
        let offset = req.offset();
        assert!(offset >= 0);
        assert!(offset <= i64::MAX - 20);

        let req = PageParams { page: Some(i64::MAX), limit: Some(i64::MAX) }.resolve(50);
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
        assert!(req.offset() >= 0);

        // Página enorme só devolve lista vazia
        let page: Paginated<u32> = Paginated::new(vec![], 3, req);
        assert_eq!(page.pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let page: Paginated<u32> = Paginated::new(vec![], 0, PageParams::default().resolve(20));
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn walking_all_pages_visits_each_row_once() {
        let rows: Vec<i64> = (0..47).collect();
        let total = rows.len() as i64;
        let size = 10;
        let pages = page_count(total, size);

        let mut seen = Vec::new();
        for page in 1..=pages {
            let req = PageParams { page: Some(page), limit: Some(size) }.resolve(20);
            let slice: Vec<i64> = rows
                .iter()
                .skip(req.offset() as usize)
                .take(req.page_size as usize)
                .copied()
                .collect();
            seen.extend(slice);
        }

        assert_eq!(pages, 5);
        assert_eq!(seen, rows);
    }
}
