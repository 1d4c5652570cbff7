pub mod department;
pub mod mini_application;
pub mod permission;
pub mod role;
pub mod role_permission;
pub mod user;
pub mod user_mini_application;
pub mod user_role;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::department::{self, Entity as Department};
    pub use super::mini_application::{self, Entity as MiniApplication};
    pub use super::permission::{self, Entity as Permission};
    pub use super::role::{self, Entity as Role};
    pub use super::role_permission::{self, Entity as RolePermission};
    pub use super::user::{self, Entity as User};
    pub use super::user_mini_application::{self, Entity as UserMiniApplication};
    pub use super::user_role::{self, Entity as UserRole};
}
