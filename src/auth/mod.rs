/// Authentication module
///
/// Password hashing, JWT issuance/validation, and the request gate that
/// turns a bearer token into a user.

mod claims;
mod guard;
mod jwt;
mod password;

pub use claims::Claims;
pub use guard::authenticate;
pub use guard::bearer_token;
pub use guard::AuthenticatedUser;
pub use guard::RequestUser;
pub use jwt::TokenError;
pub use jwt::TokenService;
pub use password::PasswordHasher;
