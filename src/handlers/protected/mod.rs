// Protected handlers, mounted under /api behind jwt_auth_middleware.

pub mod analytics;
pub mod funding;
pub mod reports;
