use serde::{Deserialize, Serialize};

/// Claims carried by the `admin_token` session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Serialize)]
pub struct AdminProfile {
    pub id: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub admin: AdminProfile,
    pub expires_in_secs: i64,
}
