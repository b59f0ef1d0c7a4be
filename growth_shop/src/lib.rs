pub mod catalog_data;
pub mod entities;
pub mod sea_orm_storage;
