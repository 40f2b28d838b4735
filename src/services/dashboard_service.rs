// src/services/dashboard_service.rs

use crate::{common::error::AppError, db::DashboardRepository, models::dashboard::DashboardStats};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_stats(&self) -> Result<DashboardStats, AppError> {
        self.repo.get_stats().await
    }
}
