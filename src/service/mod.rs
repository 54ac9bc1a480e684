pub mod optimizer_service;
