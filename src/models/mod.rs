pub mod product;
pub mod user;

pub use product::{
    CreateProductRequest, Product, ProductChanges, ProductWithUser, UpdateProductRequest,
};
pub use user::{
    CreateUserRequest, LoginRequest, LoginResponse, Role, UpdateUserRequest, User, UserChanges,
};

/// Reject a required text field that is empty or whitespace
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

/// Reject an optional text field that was provided but is blank
pub(crate) fn reject_blank(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) if v.trim().is_empty() => Err(format!("{} must not be blank", field)),
        _ => Ok(()),
    }
}
