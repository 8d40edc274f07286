pub mod accounts;
pub mod admin;
pub mod applications;
pub mod documents;
pub mod notifications;
pub mod pagination;
pub mod postings;
pub mod repository;
pub mod wishlist;
