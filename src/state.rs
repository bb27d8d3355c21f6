use std::sync::Arc;

use mongodb::Database;

use crate::config::Config;
use crate::db::{
    MongoBadgePayments, MongoHireRequests, MongoReviews, MongoUsers, MongoVerifications, UserRepository,
};
use crate::services::{
    BadgeService, EmailService, FlutterwaveGateway, HireRequestService, ProfileService, ReviewService,
    VerificationService,
};

/// Services shared by every request handler, managed by Rocket.
pub struct AppState {
    pub hire_requests: HireRequestService,
    pub reviews: ReviewService,
    pub badges: BadgeService,
    pub verifications: VerificationService,
    pub profiles: ProfileService,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn from_database(db: &Database) -> Self {
        let requests = Arc::new(MongoHireRequests::new(db));
        let users: Arc<dyn UserRepository> = Arc::new(MongoUsers::new(db));

        AppState {
            hire_requests: HireRequestService::new(requests.clone(), users.clone(), Arc::new(EmailService)),
            reviews: ReviewService::new(Arc::new(MongoReviews::new(db)), requests, users.clone()),
            badges: BadgeService::new(
                Arc::new(MongoBadgePayments::new(db)),
                users.clone(),
                Arc::new(FlutterwaveGateway::new()),
                Config::badge_currency(),
            ),
            verifications: VerificationService::new(Arc::new(MongoVerifications::new(db)), users.clone()),
            profiles: ProfileService::new(users.clone()),
            users,
        }
    }
}
