/// Data for a new user. `password_hash` is already hashed by the caller.
#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub name: String,
    pub email: String,
    pub telephone: String,
    pub password_hash: String,
}
