//! Postgres query layer. Every function takes the caller's connection so that a workflow can
//! run several of them inside one transaction.

pub mod activity;
pub mod admins;
pub mod appointments;
pub mod citizens;
pub mod marketplace;
pub mod onboarding;
pub mod providers;
pub mod registrations;
pub mod services;
pub mod users;
