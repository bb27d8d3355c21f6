use std::sync::Arc;

use log::info;
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::UserRepository;
use crate::models::User;
use crate::services::{ServiceError, ServiceResult};

/// Portfolio gallery. Badge holders get the larger limit while the badge is active.
#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    async fn user(&self, id: &ObjectId) -> ServiceResult<User> {
        self.users.find_by_id(id).await?.ok_or(ServiceError::NotFound("User"))
    }

    pub async fn add_portfolio_image(&self, user_id: &ObjectId, url: &str) -> ServiceResult<Vec<String>> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ServiceError::Validation("url is required".to_string()));
        }

        let user = self.user(user_id).await?;
        if user.portfolio_images.iter().any(|image| image == url) {
            return Err(ServiceError::Validation("Image is already in your portfolio".to_string()));
        }

        let limit = user.portfolio_limit(DateTime::now());
        if !self.users.push_portfolio_image(user_id, url, limit).await? {
            return Err(ServiceError::Validation(format!(
                "Portfolio limit of {} images reached",
                limit
            )));
        }

        info!("Portfolio image added for {}", user_id);
        Ok(self.user(user_id).await?.portfolio_images)
    }

    pub async fn remove_portfolio_image(&self, user_id: &ObjectId, url: &str) -> ServiceResult<Vec<String>> {
        if !self.users.pull_portfolio_image(user_id, url.trim()).await? {
            return Err(ServiceError::NotFound("Portfolio image"));
        }
        Ok(self.user(user_id).await?.portfolio_images)
    }
}
