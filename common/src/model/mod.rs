pub mod datasource;
pub mod dispatch;
pub mod mapping;
pub mod record;
pub mod template;
