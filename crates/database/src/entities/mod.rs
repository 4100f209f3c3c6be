//! Domain entities for the database layer

pub mod profile;
pub mod user;

pub use profile::{
    Investor, Owner, PaymentMethod, ProfileKind, Tenant, UserProfile, UserProfileData,
};
pub use user::{
    enforce_company_fields, CompanyDetails, CompanyType, Language, NewUser, User, UserFilter,
    UserType,
};
