pub mod export;
pub mod format_repository;
pub mod group_key;
pub mod subdivision_repository;
pub mod validator;

pub use crate::domain::ports::{ConfigProvider, Storage, SubdivisionLoader};
pub use crate::utils::error::Result;
pub use format_repository::AddressFormatRepository;
pub use subdivision_repository::{SubdivisionGroup, SubdivisionRepository};
pub use validator::AddressValidator;
